//! Driver configuration supplied by the board.

use crate::blob::ConfigBlob;
use crate::reg::{PRIMARY_ADDRESS, SECONDARY_ADDRESS};

/// The two bus addresses selectable during reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BusAddress {
    /// 0x5D, interrupt line low while reset is released.
    #[default]
    Primary,
    /// 0x14, interrupt line high while reset is released.
    Secondary,
}

impl BusAddress {
    /// The 7-bit address.
    pub const fn addr(self) -> u8 {
        match self {
            Self::Primary => PRIMARY_ADDRESS,
            Self::Secondary => SECONDARY_ADDRESS,
        }
    }

    /// Whether the interrupt line must be driven high to select this address.
    pub const fn select_high(self) -> bool {
        matches!(self, Self::Secondary)
    }
}

/// Where the configuration blob comes from.
#[derive(Debug, Clone, Default)]
pub enum ConfigSource {
    /// No blob. Bring-up fails if both GPIO lines are wired.
    #[default]
    None,
    /// One blob for every sensor.
    Blob(ConfigBlob),
    /// A blob per sensor id, as listed in the board description.
    PerSensor(fn(u8) -> Option<ConfigBlob>),
    /// The blob is loaded asynchronously and handed to
    /// [`Goodix::load_deferred_config`](crate::Goodix::load_deferred_config).
    Deferred,
}

/// Board overrides of the touchscreen properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TouchscreenOverrides {
    /// Replaces the x maximum read from the device.
    pub max_x: Option<u16>,
    /// Replaces the y maximum read from the device.
    pub max_y: Option<u16>,
    pub invert_x: bool,
    pub invert_y: bool,
    pub swap_xy: bool,
}

/// Configuration parameters used to attach the controller.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Bus address the controller is strapped to during reset.
    pub address: BusAddress,
    /// Source of the configuration blob.
    pub source: ConfigSource,
    /// Axis overrides and orientation quirks.
    pub properties: TouchscreenOverrides,
}
