//! Error types for the Goodix driver.

use core::fmt::{self, Debug, Display};

/// An error raised by the register access shim.
pub enum BusError<E> {
    /// A register read transaction failed.
    Read(E),
    /// A register write transaction failed.
    Write(E),
    /// The payload does not fit the write buffer.
    Overflow,
}

impl<E: Debug> Debug for BusError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(err) => write!(f, "Read({err:?})"),
            Self::Write(err) => write!(f, "Write({err:?})"),
            Self::Overflow => write!(f, "Overflow"),
        }
    }
}

/// Rejection reasons of the configuration validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The blob is longer than the configuration block or too short to carry
    /// its checksum.
    InvalidLength,
    /// The stored checksum does not match the payload.
    ChecksumMismatch,
    /// The config-fresh marker is not set.
    NotFresh,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLength => f.write_str("the length of the config is not correct"),
            Self::ChecksumMismatch => f.write_str("the checksum of the config is not correct"),
            Self::NotFresh => f.write_str("config must have the config-fresh byte set"),
        }
    }
}

/// The main error type of the driver.
///
/// `BE` is the bus error type, `PE` the GPIO error type.
pub enum Error<BE, PE> {
    /// A bus transaction failed.
    Bus(BusError<BE>),
    /// A GPIO direction change failed.
    Pin(PE),
    /// A GPIO line is not ready yet; attach may be retried later.
    ProbeDeferred,
    /// The configuration blob was rejected.
    Config(ConfigError),
    /// No configuration blob is available although the reset lines are present.
    ConfigUnavailable,
    /// The sensor id register holds an id without a configuration slot.
    InvalidSensorId(u8),
    /// The report announced more contacts than the device supports.
    Protocol {
        /// Contacts announced by the status byte.
        contacts: u8,
        /// Contacts supported by the session.
        max: u8,
    },
    /// The host interrupt could not be requested.
    Interrupt,
    /// The input sink refused the device.
    Registration,
    /// The operation is not allowed in the current bring-up or power state.
    InvalidState,
}

impl<BE: Debug, PE: Debug> Debug for Error<BE, PE> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(err) => write!(f, "Bus({err:?})"),
            Self::Pin(err) => write!(f, "Pin({err:?})"),
            Self::ProbeDeferred => write!(f, "ProbeDeferred"),
            Self::Config(err) => write!(f, "Config({err:?})"),
            Self::ConfigUnavailable => write!(f, "ConfigUnavailable"),
            Self::InvalidSensorId(id) => write!(f, "InvalidSensorId({id})"),
            Self::Protocol { contacts, max } => {
                write!(f, "Protocol {{ contacts: {contacts}, max: {max} }}")
            }
            Self::Interrupt => write!(f, "Interrupt"),
            Self::Registration => write!(f, "Registration"),
            Self::InvalidState => write!(f, "InvalidState"),
        }
    }
}

impl<BE, PE> From<BusError<BE>> for Error<BE, PE> {
    fn from(err: BusError<BE>) -> Self {
        Error::Bus(err)
    }
}

impl<BE, PE> From<ConfigError> for Error<BE, PE> {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}
