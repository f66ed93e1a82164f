//! The public driver handle.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Receiver;
use embassy_sync::mutex::Mutex;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::{I2c, SevenBitAddress};

use crate::blob::ConfigBlob;
use crate::bringup::BringUpState;
use crate::completion::Completion;
use crate::conf::Config;
use crate::error::Error;
use crate::hal::{FlexPin, InterruptLine, PinProvider, Regulator, Regulators, TouchSink};
use crate::power::{PowerEvent, PowerState};
use crate::report::TouchFrame;
use crate::session::{Identity, InputDescriptor, Session};

/// The collaborators a driver instance owns for its whole lifetime.
///
/// GPIO lines are not part of this set; they are acquired from a
/// [`PinProvider`] during bring-up and handed back at detach.
pub struct Parts<I2C, IRQ, REG, S, D> {
    pub i2c: I2C,
    pub irq: IRQ,
    /// `None` when the board has no switchable supply rails.
    pub regulators: Option<Regulators<REG>>,
    pub sink: S,
    pub delay: D,
}

/// Driver for one Goodix touch controller.
///
/// All operations take `&self`. Report processing, power transitions and
/// deferred configuration are serialized on an internal lock of raw mutex
/// type `M`, so the handle can be shared between an interrupt task and a
/// power-management task.
pub struct Goodix<M: RawMutex, I2C, P, IRQ, REG, S, D> {
    session: Mutex<M, Session<I2C, P, IRQ, REG, S, D>>,
    /// Open unless a deferred configuration load is pending.
    config_loaded: Completion<M>,
}

impl<M, I2C, P, IRQ, REG, S, D, BE, PE> Goodix<M, I2C, P, IRQ, REG, S, D>
where
    M: RawMutex,
    I2C: I2c<SevenBitAddress, Error = BE>,
    BE: embedded_hal_async::i2c::Error,
    P: FlexPin<Error = PE>,
    PE: embedded_hal::digital::Error,
    IRQ: InterruptLine,
    REG: Regulator,
    S: TouchSink,
    D: DelayNs,
{
    /// Creates a driver that has not touched the hardware yet.
    pub fn new(parts: Parts<I2C, IRQ, REG, S, D>, config: Config) -> Self {
        let Parts {
            i2c,
            irq,
            regulators,
            sink,
            delay,
        } = parts;
        Self {
            session: Mutex::new(Session::new(i2c, irq, regulators, sink, delay, config)),
            config_loaded: Completion::new(true),
        }
    }

    /// Brings the controller up.
    ///
    /// Returns [`BringUpState::Running`] once touch reports are armed, or
    /// [`BringUpState::VariantResolved`] when the configuration is deferred
    /// and must be supplied through [`Goodix::load_deferred_config`].
    /// [`Error::ProbeDeferred`] and any other failure leave the driver
    /// retryable with nothing acquired.
    pub async fn bring_up<PP: PinProvider<Pin = P>>(
        &self,
        pins: &mut PP,
    ) -> Result<BringUpState, Error<BE, PE>> {
        let mut session = self.session.lock().await;
        let state = session.bring_up(pins).await?;
        if state == BringUpState::VariantResolved {
            self.config_loaded.reset();
        }
        Ok(state)
    }

    /// Finishes a bring-up waiting for an asynchronously loaded
    /// configuration. `None` reports that the load failed.
    ///
    /// Always releases waiters of the deferred load, whatever the outcome.
    pub async fn load_deferred_config(&self, blob: Option<ConfigBlob>) -> Result<(), Error<BE, PE>> {
        let result = {
            let mut session = self.session.lock().await;
            session.finish_deferred(blob).await
        };
        self.config_loaded.complete();
        result
    }

    /// Services one assertion of the touch interrupt.
    ///
    /// The decoded frame is pushed to the sink and returned. A report that
    /// never became ready yields an empty frame. Errors drop the frame only;
    /// the driver keeps running.
    pub async fn handle_interrupt(&self) -> Result<TouchFrame, Error<BE, PE>> {
        self.session.lock().await.process_report().await
    }

    /// Puts the controller to sleep. Waits for a pending deferred
    /// configuration first.
    ///
    /// On error the controller stays [`PowerState::Active`] with interrupts
    /// armed, and suspend may be retried.
    pub async fn suspend(&self) -> Result<(), Error<BE, PE>> {
        self.config_loaded.wait().await;
        self.session.lock().await.suspend().await
    }

    /// Wakes the controller and re-arms interrupts.
    pub async fn resume(&self) -> Result<(), Error<BE, PE>> {
        self.session.lock().await.resume().await
    }

    /// Maps a panel power notification to [`Goodix::suspend`] or
    /// [`Goodix::resume`].
    pub async fn on_power_event(&self, event: PowerEvent) -> Result<(), Error<BE, PE>> {
        log::trace!("power event {event:?}");
        match event {
            PowerEvent::PoweredOn => self.resume().await,
            PowerEvent::PoweredOff => self.suspend().await,
        }
    }

    /// Consumes power notifications forever. Failed transitions are logged
    /// and the next notification is processed.
    pub async fn run_power_events<CM: RawMutex, const N: usize>(
        &self,
        events: Receiver<'_, CM, PowerEvent, N>,
    ) {
        loop {
            let event = events.receive().await;
            if let Err(err) = self.on_power_event(event).await {
                log::warn!("Power transition {event:?} failed: {err:?}");
            }
        }
    }

    pub async fn state(&self) -> BringUpState {
        self.session.lock().await.stage
    }

    pub async fn power_state(&self) -> PowerState {
        self.session.lock().await.power
    }

    pub async fn identity(&self) -> Identity {
        self.session.lock().await.identity()
    }

    /// The capabilities declared to the sink, valid once running.
    pub async fn descriptor(&self) -> InputDescriptor {
        self.session.lock().await.descriptor()
    }

    /// The last configuration written to the device.
    pub async fn applied_config(&self) -> Option<ConfigBlob> {
        self.session.lock().await.applied.clone()
    }

    /// Tears the driver down once any deferred configuration load has
    /// finished, and returns its collaborators.
    ///
    /// The interrupt handler is freed, GPIO lines go back to `pins` and the
    /// supply rails are switched off.
    pub async fn detach<PP: PinProvider<Pin = P>>(self, pins: &mut PP) -> Parts<I2C, IRQ, REG, S, D> {
        self.config_loaded.wait().await;

        let mut session = self.session.into_inner();
        session.free_irq();
        session.release_lines(pins);
        if let Some(regulators) = session.regulators.as_mut() {
            if regulators.any_enabled() {
                regulators.switch(false);
            }
        }
        log::debug!("Detached");

        let (i2c, irq, regulators, sink, delay) = session.into_resources();
        Parts {
            i2c,
            irq,
            regulators,
            sink,
            delay,
        }
    }
}
