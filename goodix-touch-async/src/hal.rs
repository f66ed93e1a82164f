//! Interfaces of the platform collaborators the driver relies on.
//!
//! The register bus and delays use the `embedded-hal-async` traits directly.
//! The traits below cover what `embedded-hal` does not model: GPIO lines that
//! switch direction at run time, the host interrupt controller, supply
//! regulators, and the input sink that receives decoded frames.

use core::convert::Infallible;
use core::fmt::Debug;

use embedded_hal::digital::{ErrorType, PinState};

use crate::report::TouchFrame;
use crate::session::InputDescriptor;
use crate::variant::Trigger;

/// A GPIO line whose direction can be changed while the driver runs.
///
/// The interrupt line is both an input (touch interrupt) and an output
/// (address select, wake pulse, resynchronization).
pub trait FlexPin: ErrorType {
    /// Hands the line back to the device as a floating input.
    fn set_as_input(&mut self) -> Result<(), Self::Error>;

    /// Drives the line at `level`.
    fn set_as_output(&mut self, level: PinState) -> Result<(), Self::Error>;
}

/// Which GPIO line is being acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRole {
    Interrupt,
    Reset,
}

/// Why a GPIO line could not be acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireError<E> {
    /// The GPIO provider is not ready yet; acquiring again later may succeed.
    NotReady,
    /// The line exists but can never be acquired.
    Failed(E),
}

/// Source of the optional interrupt and reset lines, usually backed by the
/// board description.
pub trait PinProvider {
    type Pin: FlexPin;

    /// Returns the line for `role`, or `None` when the board does not wire it.
    fn acquire(
        &mut self,
        role: LineRole,
    ) -> Result<Option<Self::Pin>, AcquireError<<Self::Pin as ErrorType>::Error>>;

    /// Takes back a line the driver no longer uses.
    fn release(&mut self, role: LineRole, pin: Self::Pin);
}

/// The host interrupt the controller raises, independent of the GPIO line.
pub trait InterruptLine {
    type Error: Debug;

    /// Installs the touch handler with the given trigger.
    fn request(&mut self, trigger: Trigger) -> Result<(), Self::Error>;

    /// Removes the touch handler.
    fn free(&mut self);

    /// Resumes delivery of an installed handler.
    fn enable(&mut self);

    /// Masks delivery of an installed handler.
    fn disable(&mut self);
}

/// A switchable supply rail.
pub trait Regulator {
    type Error: Debug;

    fn enable(&mut self) -> Result<(), Self::Error>;

    fn disable(&mut self) -> Result<(), Self::Error>;

    fn is_enabled(&mut self) -> bool;
}

/// Receiver of decoded touch events.
pub trait TouchSink {
    type Error: Debug;

    /// Declares the device and its capabilities. Called once per attach.
    fn register(&mut self, descriptor: &InputDescriptor) -> Result<(), Self::Error>;

    /// Reports the state of the dedicated button.
    fn emit_button(&mut self, pressed: bool);

    /// Reports one frame. Slots missing from `frame` are lifted.
    fn emit_frame(&mut self, frame: &TouchFrame);
}

/// Stand-in for boards without switchable supply rails.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRegulator;

impl Regulator for NoRegulator {
    type Error = Infallible;

    fn enable(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn disable(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn is_enabled(&mut self) -> bool {
        true
    }
}

/// The two supply rails of the controller.
pub struct Regulators<REG> {
    /// Analog supply.
    pub vdd_ana: REG,
    /// I2C pull-up supply.
    pub vcc_i2c: REG,
}

impl<REG: Regulator> Regulators<REG> {
    /// Switches both rails. Failures are logged, the other rail is still
    /// switched.
    pub(crate) fn switch(&mut self, on: bool) {
        log::debug!("regulators {}", if on { "enabled" } else { "disabled" });
        for (name, rail) in [("vdd_ana", &mut self.vdd_ana), ("vcc_i2c", &mut self.vcc_i2c)] {
            let result = if on { rail.enable() } else { rail.disable() };
            if let Err(err) = result {
                log::warn!("Error switching regulator {name}: {err:?}");
            }
        }
    }

    /// Whether both rails are currently enabled.
    pub(crate) fn all_enabled(&mut self) -> bool {
        self.vdd_ana.is_enabled() && self.vcc_i2c.is_enabled()
    }

    pub(crate) fn any_enabled(&mut self) -> bool {
        self.vdd_ana.is_enabled() || self.vcc_i2c.is_enabled()
    }
}

/// Stand-in line type for boards that wire neither the interrupt nor the
/// reset line to a GPIO.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPin;

impl ErrorType for NoPin {
    type Error = Infallible;
}

impl FlexPin for NoPin {
    fn set_as_input(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_as_output(&mut self, _level: PinState) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// A [`PinProvider`] that wires no lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPins;

impl PinProvider for NoPins {
    type Pin = NoPin;

    fn acquire(&mut self, _role: LineRole) -> Result<Option<NoPin>, AcquireError<Infallible>> {
        Ok(None)
    }

    fn release(&mut self, _role: LineRole, _pin: NoPin) {}
}
