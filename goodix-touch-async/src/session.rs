//! The per-device session shared by bring-up, event processing and power
//! control.

use embassy_time::Duration;
use embedded_hal::digital::PinState;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::{I2c, SevenBitAddress};

use crate::blob::ConfigBlob;
use crate::bringup::BringUpState;
use crate::bus::RegisterBus;
use crate::conf::Config;
use crate::error::Error;
use crate::hal::{FlexPin, InterruptLine, LineRole, PinProvider, Regulator, Regulators, TouchSink};
use crate::power::PowerState;
use crate::reg::{timing, DEFAULT_MAX_X, DEFAULT_MAX_Y, MAX_CONTACTS};
use crate::report::TouchscreenProperties;
use crate::variant::{Trigger, VariantDescriptor, GT9X};

/// Vendor id reported to the input sink.
pub const VENDOR_ID: u16 = 0x0416;
/// Key code of the dedicated button (`KEY_LEFTMETA`).
pub const KEY_LEFTMETA: u16 = 125;
/// Input device name.
pub const DEVICE_NAME: &str = "Goodix Capacitive TouchScreen";
/// Input device physical path.
pub const DEVICE_PHYS: &str = "input/ts";
/// Upper bound of the contact width axis.
pub const MAX_WIDTH: u8 = 255;

/// Identification of the attached controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub vendor: u16,
    /// Product id, e.g. 911 for a GT911.
    pub chip_id: u16,
    pub version: u16,
    pub sensor_id: u8,
    /// Family name of the resolved variant.
    pub variant: &'static str,
}

/// Capabilities declared to the input sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputDescriptor {
    pub name: &'static str,
    pub phys: &'static str,
    pub identity: Identity,
    pub button_key: u16,
    /// Maximum of the x axis (inclusive).
    pub max_x: u16,
    /// Maximum of the y axis (inclusive).
    pub max_y: u16,
    /// Maximum of the contact width (inclusive).
    pub max_width: u8,
    /// Number of tracked slots.
    pub slots: u8,
}

/// Delivery state of the host interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IrqState {
    /// No handler installed.
    Free,
    /// Handler installed and delivering.
    Enabled,
    /// Handler installed, delivery masked.
    Disabled,
}

/// Everything the driver owns for one controller. Guarded by the session
/// lock in [`Goodix`](crate::Goodix).
pub(crate) struct Session<I2C, P, IRQ, REG, S, D> {
    pub(crate) bus: RegisterBus<I2C>,
    pub(crate) int: Option<P>,
    pub(crate) rst: Option<P>,
    pub(crate) irq: IRQ,
    pub(crate) irq_state: IrqState,
    pub(crate) regulators: Option<Regulators<REG>>,
    pub(crate) sink: S,
    pub(crate) delay: D,
    pub(crate) config: Config,
    pub(crate) stage: BringUpState,
    pub(crate) chip_id: u16,
    pub(crate) version: u16,
    pub(crate) sensor_id: u8,
    pub(crate) variant: &'static VariantDescriptor,
    pub(crate) trigger: Trigger,
    pub(crate) max_contacts: u8,
    pub(crate) props: TouchscreenProperties,
    pub(crate) power: PowerState,
    pub(crate) applied: Option<ConfigBlob>,
}

impl<I2C, P, IRQ, REG, S, D, BE, PE> Session<I2C, P, IRQ, REG, S, D>
where
    I2C: I2c<SevenBitAddress, Error = BE>,
    BE: embedded_hal_async::i2c::Error,
    P: FlexPin<Error = PE>,
    PE: embedded_hal::digital::Error,
    IRQ: InterruptLine,
    REG: Regulator,
    S: TouchSink,
    D: DelayNs,
{
    pub(crate) fn new(
        i2c: I2C,
        irq: IRQ,
        regulators: Option<Regulators<REG>>,
        sink: S,
        delay: D,
        config: Config,
    ) -> Self {
        Self {
            bus: RegisterBus::new(i2c, config.address.addr()),
            int: None,
            rst: None,
            irq,
            irq_state: IrqState::Free,
            regulators,
            sink,
            delay,
            config,
            stage: BringUpState::Unconfigured,
            chip_id: 0,
            version: 0,
            sensor_id: 0,
            variant: &GT9X,
            trigger: Trigger::default(),
            max_contacts: MAX_CONTACTS,
            props: TouchscreenProperties {
                max_x: DEFAULT_MAX_X,
                max_y: DEFAULT_MAX_Y,
                invert_x: false,
                invert_y: false,
                swap_xy: false,
            },
            power: PowerState::Active,
            applied: None,
        }
    }

    /// Both reset-sequencing lines are wired. Without them the device runs
    /// unmanaged: no reset, no configuration upload, no GPIO power sequencing.
    pub(crate) fn has_reset_lines(&self) -> bool {
        self.int.is_some() && self.rst.is_some()
    }

    pub(crate) async fn sleep(&mut self, duration: Duration) {
        self.delay.delay_us(duration.as_micros() as u32).await;
    }

    /// Switches a line; `None` hands it back as an input. Absent lines are
    /// left alone.
    pub(crate) fn set_line(
        &mut self,
        role: LineRole,
        level: Option<PinState>,
    ) -> Result<(), Error<BE, PE>> {
        let line = match role {
            LineRole::Interrupt => self.int.as_mut(),
            LineRole::Reset => self.rst.as_mut(),
        };
        let Some(line) = line else {
            return Ok(());
        };
        match level {
            Some(level) => line.set_as_output(level),
            None => line.set_as_input(),
        }
        .map_err(|err| {
            log::warn!("Error switching {role:?} line: {err:?}");
            Error::Pin(err)
        })
    }

    /// Interrupt-line resynchronization: low for 50 ms, then input.
    pub(crate) async fn int_sync(&mut self) -> Result<(), Error<BE, PE>> {
        self.set_line(LineRole::Interrupt, Some(PinState::Low))?;
        self.sleep(timing::INT_SYNC).await;
        self.set_line(LineRole::Interrupt, None)
    }

    /// Installs the touch handler with the configured trigger.
    pub(crate) fn arm_irq(&mut self) -> Result<(), Error<BE, PE>> {
        self.irq.request(self.trigger).map_err(|err| {
            log::error!("Request IRQ failed: {err:?}");
            Error::Interrupt
        })?;
        self.irq_state = IrqState::Enabled;
        Ok(())
    }

    pub(crate) fn free_irq(&mut self) {
        if self.irq_state != IrqState::Free {
            self.irq.free();
            self.irq_state = IrqState::Free;
        }
    }

    /// Hands both lines back to `pins`.
    pub(crate) fn release_lines<PP: PinProvider<Pin = P>>(&mut self, pins: &mut PP) {
        if let Some(int) = self.int.take() {
            pins.release(LineRole::Interrupt, int);
        }
        if let Some(rst) = self.rst.take() {
            pins.release(LineRole::Reset, rst);
        }
    }

    pub(crate) fn identity(&self) -> Identity {
        Identity {
            vendor: VENDOR_ID,
            chip_id: self.chip_id,
            version: self.version,
            sensor_id: self.sensor_id,
            variant: self.variant.name,
        }
    }

    pub(crate) fn descriptor(&self) -> InputDescriptor {
        let (max_x, max_y) = self.props.reported_max();
        InputDescriptor {
            name: DEVICE_NAME,
            phys: DEVICE_PHYS,
            identity: self.identity(),
            button_key: KEY_LEFTMETA,
            max_x,
            max_y,
            max_width: MAX_WIDTH,
            slots: self.max_contacts,
        }
    }

    /// Releases everything owned by the session.
    pub(crate) fn into_resources(self) -> (I2C, IRQ, Option<Regulators<REG>>, S, D) {
        (
            self.bus.release(),
            self.irq,
            self.regulators,
            self.sink,
            self.delay,
        )
    }
}
