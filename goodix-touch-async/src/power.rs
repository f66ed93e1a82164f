//! Suspend and resume sequencing.

use embedded_hal::digital::PinState;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::{I2c, SevenBitAddress};

use crate::bringup::BringUpState;
use crate::error::Error;
use crate::hal::{FlexPin, InterruptLine, LineRole, Regulator, TouchSink};
use crate::reg::{timing, CMD_SCREEN_OFF, REG_COMMAND};
use crate::session::{IrqState, Session};

/// Power state of a running controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PowerState {
    #[default]
    Active,
    Suspended,
}

/// Panel power notifications that drive suspend and resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerEvent {
    PoweredOn,
    PoweredOff,
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
    pub(crate) async fn suspend(&mut self) -> Result<(), Error<BE, PE>> {
        if self.stage != BringUpState::Running {
            return Err(Error::InvalidState);
        }
        if self.power == PowerState::Suspended {
            return Ok(());
        }

        if !self.has_reset_lines() {
            self.irq.disable();
            self.irq_state = IrqState::Disabled;
            self.power = PowerState::Suspended;
            log::debug!("Suspended, interrupt masked");
            return Ok(());
        }

        // No report may be serviced while the device goes down.
        self.free_irq();

        if let Err(err) = self.set_line(LineRole::Interrupt, Some(PinState::Low)) {
            self.rearm_after_failed_suspend();
            return Err(err);
        }
        self.sleep(timing::SUSPEND_INT_LOW).await;

        if let Err(err) = self.bus.write_u8(REG_COMMAND, CMD_SCREEN_OFF).await {
            log::error!("Screen off command failed: {err:?}");
            if let Err(pin_err) = self.set_line(LineRole::Interrupt, None) {
                log::warn!("Failed to release interrupt line: {pin_err:?}");
            }
            self.rearm_after_failed_suspend();
            return Err(err.into());
        }

        if let Some(regulators) = self.regulators.as_mut() {
            regulators.switch(false);
            self.sleep(timing::REGULATOR_SETTLE).await;
        }

        // The device needs this long before it can be woken again.
        self.sleep(timing::QUIESCENCE).await;
        self.power = PowerState::Suspended;
        log::debug!("Suspended");
        Ok(())
    }

    fn rearm_after_failed_suspend(&mut self) {
        if let Err(err) = self.arm_irq() {
            log::error!("Failed to re-arm interrupt after aborted suspend: {err:?}");
        }
    }

    pub(crate) async fn resume(&mut self) -> Result<(), Error<BE, PE>> {
        if self.stage != BringUpState::Running {
            return Err(Error::InvalidState);
        }
        if self.power == PowerState::Active {
            return Ok(());
        }

        if let Some(regulators) = self.regulators.as_mut() {
            if !regulators.all_enabled() {
                regulators.switch(true);
                self.sleep(timing::REGULATOR_SETTLE).await;
            }
        }

        if !self.has_reset_lines() {
            self.irq.enable();
            self.irq_state = IrqState::Enabled;
            self.power = PowerState::Active;
            log::debug!("Resumed, interrupt unmasked");
            return Ok(());
        }

        self.set_line(LineRole::Interrupt, Some(PinState::High))?;
        self.sleep(timing::WAKE_PULSE).await;
        self.int_sync().await?;
        self.arm_irq()?;
        self.power = PowerState::Active;
        log::debug!("Resumed");
        Ok(())
    }
}
