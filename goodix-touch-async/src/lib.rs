//! An asynchronous, `no_std` driver core for Goodix GT9xx / GT1x capacitive
//! touch controllers.
//!
//! The driver owns the control logic of the controller: bring-up (reset
//! timing, bus probe, identification, chip-variant resolution, configuration
//! upload), interrupt-driven decoding of touch reports, and suspend/resume
//! sequencing. Everything outside that logic is a collaborator reached
//! through a trait:
//!
//! * the register bus is any `embedded-hal-async` [`I2c`](embedded_hal_async::i2c::I2c),
//! * delays come from an `embedded-hal-async` [`DelayNs`](embedded_hal_async::delay::DelayNs)
//!   (`embassy_time::Delay` on embassy targets),
//! * the interrupt and reset lines implement [`hal::FlexPin`],
//! * the host interrupt controller implements [`hal::InterruptLine`],
//! * supply rails implement [`hal::Regulator`],
//! * decoded frames are pushed into a [`hal::TouchSink`].
//!
//! # Usage
//!
//! ```no_run
//! use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
//! use embedded_hal_async::{delay::DelayNs, i2c::I2c};
//! use goodix_touch_async::hal::{InterruptLine, PinProvider, Regulator, TouchSink};
//! use goodix_touch_async::{Config, Goodix, Parts};
//!
//! async fn touch_task<I2C, PP, IRQ, REG, S, D>(parts: Parts<I2C, IRQ, REG, S, D>, pins: &mut PP)
//! where
//!     I2C: I2c,
//!     PP: PinProvider,
//!     IRQ: InterruptLine,
//!     REG: Regulator,
//!     S: TouchSink,
//!     D: DelayNs,
//! {
//!     let touch: Goodix<CriticalSectionRawMutex, _, PP::Pin, _, _, _, _> =
//!         Goodix::new(parts, Config::default());
//!     if let Err(err) = touch.bring_up(pins).await {
//!         log::error!("Touch bring-up failed: {err:?}");
//!         return;
//!     }
//!     loop {
//!         // Wait for the touch interrupt here, then:
//!         if let Err(err) = touch.handle_interrupt().await {
//!             log::warn!("Dropped touch frame: {err:?}");
//!         }
//!     }
//! }
//! ```

#![no_std]

pub mod blob;
pub mod bus;
pub mod conf;
pub mod error;
pub mod hal;
pub mod reg;
pub mod report;
pub mod variant;

mod bringup;
mod completion;
mod driver;
mod event;
mod power;
mod session;

pub use blob::{ChecksumKind, ConfigBlob};
pub use bringup::BringUpState;
pub use conf::{BusAddress, Config, ConfigSource, TouchscreenOverrides};
pub use driver::{Goodix, Parts};
pub use error::{BusError, ConfigError, Error};
pub use power::{PowerEvent, PowerState};
pub use report::{Contact, TouchFrame};
pub use session::{Identity, InputDescriptor};
pub use variant::{Trigger, VariantDescriptor};
