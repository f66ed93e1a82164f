//! Scripted collaborators shared by the integration tests.
//!
//! Every mock appends to one operation log so tests can assert the order of
//! bus, GPIO, interrupt, regulator and delay operations across collaborators.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::time::Duration;

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embedded_hal::digital::{self, PinState};
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::{self, I2c, Operation, SevenBitAddress};

use goodix_touch_async::hal::{
    AcquireError, FlexPin, InterruptLine, LineRole, PinProvider, Regulator, Regulators, TouchSink,
};
use goodix_touch_async::reg::{REG_GT9X_CONFIG_DATA, REG_ID, REG_READ_COOR, REG_SENSOR_ID};
use goodix_touch_async::{
    BringUpState, ChecksumKind, Config, ConfigBlob, Goodix, InputDescriptor, Parts, TouchFrame,
    Trigger,
};

pub type Driver =
    Goodix<NoopRawMutex, MockI2c, MockPin, MockIrq, MockRegulator, MockSink, MockDelay>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Input,
    Low,
    High,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Read(u16, usize),
    Write(u16, Vec<u8>),
    Line(LineRole, Level),
    Released(LineRole),
    DelayUs(u32),
    IrqRequest(Trigger),
    IrqFree,
    IrqEnable,
    IrqDisable,
    Rail(&'static str, bool),
    Register,
    Button(bool),
    Frame(TouchFrame),
}

/// How the board wires one GPIO line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wiring {
    Present,
    Absent,
    NotReady,
    Broken,
}

#[derive(Default)]
pub struct State {
    pub log: Vec<Op>,
    pub memory: HashMap<u16, u8>,
    /// Report blocks served, one per poll of the report register. Once empty
    /// the register reads as not ready.
    pub reports: VecDeque<Vec<u8>>,
    pub failing_reads: HashMap<u16, usize>,
    pub failing_writes: HashMap<u16, usize>,
    pub addresses: Vec<SevenBitAddress>,
    pub failing_line: Option<LineRole>,
    pub irq_refuses: bool,
    pub sink_refuses: bool,
    pub descriptor: Option<InputDescriptor>,
    pub rails: HashMap<&'static str, bool>,
    /// Delays block the thread for their full length instead of returning
    /// at once.
    pub real_time: bool,
    /// How long every read transfer blocks.
    pub read_latency: Option<Duration>,
}

#[derive(Clone, Default)]
pub struct Shared(pub Rc<RefCell<State>>);

impl Shared {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> Vec<Op> {
        self.0.borrow().log.clone()
    }

    pub fn clear_log(&self) {
        self.0.borrow_mut().log.clear();
    }

    fn push(&self, op: Op) {
        self.0.borrow_mut().log.push(op);
    }

    pub fn load(&self, reg: u16, bytes: &[u8]) {
        let mut state = self.0.borrow_mut();
        for (offset, byte) in bytes.iter().enumerate() {
            state.memory.insert(reg + offset as u16, *byte);
        }
    }

    pub fn peek(&self, reg: u16, len: usize) -> Vec<u8> {
        let state = self.0.borrow();
        (0..len)
            .map(|offset| state.memory.get(&(reg + offset as u16)).copied().unwrap_or(0))
            .collect()
    }

    /// Loads the identification block and sensor id.
    pub fn identify(&self, product: &[u8; 4], version: u16, sensor_id: u8) {
        let mut id = [0u8; 6];
        id[..4].copy_from_slice(product);
        id[4..].copy_from_slice(&version.to_le_bytes());
        self.load(REG_ID, &id);
        self.load(REG_SENSOR_ID, &[sensor_id]);
    }

    pub fn queue_report(&self, report: Vec<u8>) {
        self.0.borrow_mut().reports.push_back(report);
    }

    pub fn fail_reads(&self, reg: u16, times: usize) {
        self.0.borrow_mut().failing_reads.insert(reg, times);
    }

    pub fn fail_writes(&self, reg: u16, times: usize) {
        self.0.borrow_mut().failing_writes.insert(reg, times);
    }

    pub fn real_time(&self) {
        self.0.borrow_mut().real_time = true;
    }

    pub fn slow_reads(&self, latency: Duration) {
        let mut state = self.0.borrow_mut();
        state.real_time = true;
        state.read_latency = Some(latency);
    }

    pub fn rail(&self, name: &'static str) -> bool {
        self.0.borrow().rails.get(name).copied().unwrap_or(false)
    }

    pub fn set_rail(&self, name: &'static str, on: bool) {
        self.0.borrow_mut().rails.insert(name, on);
    }

    pub fn bus_ops(&self) -> Vec<Op> {
        self.log()
            .into_iter()
            .filter(|op| matches!(op, Op::Read(..) | Op::Write(..)))
            .collect()
    }

    pub fn frames(&self) -> Vec<TouchFrame> {
        self.log()
            .into_iter()
            .filter_map(|op| match op {
                Op::Frame(frame) => Some(frame),
                _ => None,
            })
            .collect()
    }

    pub fn parts(&self, with_rails: bool) -> Parts<MockI2c, MockIrq, MockRegulator, MockSink, MockDelay> {
        let regulators = with_rails.then(|| Regulators {
            vdd_ana: MockRegulator::new(self, "vdd_ana"),
            vcc_i2c: MockRegulator::new(self, "vcc_i2c"),
        });
        Parts {
            i2c: MockI2c(self.clone()),
            irq: MockIrq(self.clone()),
            regulators,
            sink: MockSink(self.clone()),
            delay: MockDelay(self.clone()),
        }
    }

    pub fn pins(&self, int: Wiring, rst: Wiring) -> MockPins {
        MockPins {
            shared: self.clone(),
            int,
            rst,
            released: Vec::new(),
        }
    }

    pub fn driver(&self, config: Config, with_rails: bool) -> Driver {
        Goodix::new(self.parts(with_rails), config)
    }
}

/// A GT911 block: 800x480, five contacts, falling-edge trigger.
pub fn gt911_config() -> ConfigBlob {
    let mut payload = [0u8; 184];
    payload[0] = 0x41;
    payload[1..3].copy_from_slice(&800u16.to_le_bytes());
    payload[3..5].copy_from_slice(&480u16.to_le_bytes());
    payload[5] = 5;
    payload[6] = 0x01;
    for (i, byte) in payload.iter_mut().enumerate().skip(7) {
        *byte = (i * 3) as u8;
    }
    ConfigBlob::seal(&payload, ChecksumKind::EightBit).unwrap()
}

/// A GT911 device as found after power-on, its current config in place.
pub fn gt911(shared: &Shared) {
    shared.identify(b"911\0", 0x1060, 0);
    shared.load(REG_GT9X_CONFIG_DATA, gt911_config().as_bytes());
}

/// Status byte followed by the given `(slot, x, y, width)` records.
pub fn report(status: u8, contacts: &[(u8, u16, u16, u16)]) -> Vec<u8> {
    let mut bytes = vec![status];
    for &(slot, x, y, width) in contacts {
        bytes.push(slot);
        bytes.extend_from_slice(&x.to_le_bytes());
        bytes.extend_from_slice(&y.to_le_bytes());
        bytes.extend_from_slice(&width.to_le_bytes());
        bytes.push(0);
    }
    bytes
}

/// Brings `driver` up and clears the log.
pub fn running(shared: &Shared, driver: &Driver, pins: &mut MockPins) {
    let state = embassy_futures::block_on(driver.bring_up(pins)).unwrap();
    assert_eq!(state, BringUpState::Running);
    shared.clear_log();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockBusError;

impl i2c::Error for MockBusError {
    fn kind(&self) -> i2c::ErrorKind {
        i2c::ErrorKind::NoAcknowledge(i2c::NoAcknowledgeSource::Address)
    }
}

pub struct MockI2c(pub Shared);

impl MockI2c {
    fn take_failure(failures: &mut HashMap<u16, usize>, reg: u16) -> bool {
        match failures.get_mut(&reg) {
            Some(left) if *left > 0 => {
                *left -= 1;
                true
            }
            _ => false,
        }
    }
}

impl i2c::ErrorType for MockI2c {
    type Error = MockBusError;
}

impl I2c<SevenBitAddress> for MockI2c {
    async fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut state = self.0 .0.borrow_mut();
        state.addresses.push(address);
        let mut pointer = 0u16;

        for operation in operations.iter_mut() {
            match operation {
                Operation::Write(bytes) => {
                    pointer = u16::from_be_bytes([bytes[0], bytes[1]]);
                    let data = &bytes[2..];
                    if data.is_empty() {
                        continue;
                    }
                    state.log.push(Op::Write(pointer, data.to_vec()));
                    if Self::take_failure(&mut state.failing_writes, pointer) {
                        return Err(MockBusError);
                    }
                    for (offset, byte) in data.iter().enumerate() {
                        state.memory.insert(pointer + offset as u16, *byte);
                    }
                }
                Operation::Read(buf) => {
                    state.log.push(Op::Read(pointer, buf.len()));
                    if let Some(latency) = state.read_latency {
                        std::thread::sleep(latency);
                    }
                    if Self::take_failure(&mut state.failing_reads, pointer) {
                        return Err(MockBusError);
                    }
                    if pointer == REG_READ_COOR {
                        let next = state.reports.pop_front().unwrap_or_else(|| vec![0]);
                        for (offset, byte) in next.iter().enumerate() {
                            state.memory.insert(pointer + offset as u16, *byte);
                        }
                    }
                    for (offset, byte) in buf.iter_mut().enumerate() {
                        *byte = state
                            .memory
                            .get(&(pointer + offset as u16))
                            .copied()
                            .unwrap_or(0);
                    }
                }
            }
        }
        Ok(())
    }
}

pub struct MockDelay(pub Shared);

impl MockDelay {
    async fn sleep_us(&mut self, us: u32) {
        self.0.push(Op::DelayUs(us));
        if self.0 .0.borrow().real_time {
            std::thread::sleep(Duration::from_micros(u64::from(us)));
        }
        // Lets joined futures run while this one sleeps.
        embassy_futures::yield_now().await;
    }
}

impl DelayNs for MockDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.sleep_us(ns / 1_000).await;
    }

    async fn delay_us(&mut self, us: u32) {
        self.sleep_us(us).await;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockPinError;

impl digital::Error for MockPinError {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

#[derive(Debug)]
pub struct MockPin {
    shared: Shared,
    role: LineRole,
}

impl MockPin {
    fn switch(&mut self, level: Level) -> Result<(), MockPinError> {
        self.shared.push(Op::Line(self.role, level));
        if self.shared.0.borrow().failing_line == Some(self.role) {
            return Err(MockPinError);
        }
        Ok(())
    }
}

impl digital::ErrorType for MockPin {
    type Error = MockPinError;
}

impl FlexPin for MockPin {
    fn set_as_input(&mut self) -> Result<(), Self::Error> {
        self.switch(Level::Input)
    }

    fn set_as_output(&mut self, level: PinState) -> Result<(), Self::Error> {
        self.switch(match level {
            PinState::Low => Level::Low,
            PinState::High => Level::High,
        })
    }
}

impl core::fmt::Debug for Shared {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Shared")
    }
}

pub struct MockPins {
    shared: Shared,
    pub int: Wiring,
    pub rst: Wiring,
    pub released: Vec<LineRole>,
}

impl PinProvider for MockPins {
    type Pin = MockPin;

    fn acquire(&mut self, role: LineRole) -> Result<Option<MockPin>, AcquireError<MockPinError>> {
        let wiring = match role {
            LineRole::Interrupt => self.int,
            LineRole::Reset => self.rst,
        };
        match wiring {
            Wiring::Present => Ok(Some(MockPin {
                shared: self.shared.clone(),
                role,
            })),
            Wiring::Absent => Ok(None),
            Wiring::NotReady => Err(AcquireError::NotReady),
            Wiring::Broken => Err(AcquireError::Failed(MockPinError)),
        }
    }

    fn release(&mut self, role: LineRole, pin: MockPin) {
        assert_eq!(pin.role, role);
        self.shared.push(Op::Released(role));
        self.released.push(role);
    }
}

pub struct MockIrq(pub Shared);

impl InterruptLine for MockIrq {
    type Error = ();

    fn request(&mut self, trigger: Trigger) -> Result<(), Self::Error> {
        self.0.push(Op::IrqRequest(trigger));
        if self.0 .0.borrow().irq_refuses {
            return Err(());
        }
        Ok(())
    }

    fn free(&mut self) {
        self.0.push(Op::IrqFree);
    }

    fn enable(&mut self) {
        self.0.push(Op::IrqEnable);
    }

    fn disable(&mut self) {
        self.0.push(Op::IrqDisable);
    }
}

pub struct MockRegulator {
    shared: Shared,
    name: &'static str,
}

impl MockRegulator {
    fn new(shared: &Shared, name: &'static str) -> Self {
        Self {
            shared: shared.clone(),
            name,
        }
    }
}

impl Regulator for MockRegulator {
    type Error = ();

    fn enable(&mut self) -> Result<(), Self::Error> {
        self.shared.push(Op::Rail(self.name, true));
        self.shared.set_rail(self.name, true);
        Ok(())
    }

    fn disable(&mut self) -> Result<(), Self::Error> {
        self.shared.push(Op::Rail(self.name, false));
        self.shared.set_rail(self.name, false);
        Ok(())
    }

    fn is_enabled(&mut self) -> bool {
        self.shared.rail(self.name)
    }
}

pub struct MockSink(pub Shared);

impl TouchSink for MockSink {
    type Error = ();

    fn register(&mut self, descriptor: &InputDescriptor) -> Result<(), Self::Error> {
        self.0.push(Op::Register);
        let mut state = self.0 .0.borrow_mut();
        if state.sink_refuses {
            return Err(());
        }
        state.descriptor = Some(*descriptor);
        Ok(())
    }

    fn emit_button(&mut self, pressed: bool) {
        self.0.push(Op::Button(pressed));
    }

    fn emit_frame(&mut self, frame: &TouchFrame) {
        self.0.push(Op::Frame(frame.clone()));
    }
}
