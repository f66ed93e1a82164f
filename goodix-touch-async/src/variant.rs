//! Chip identification and the chip-variant table.

use crate::blob::ChecksumKind;
use crate::reg::{
    CONFIG_911_LENGTH, CONFIG_967_LENGTH, CONFIG_MAX_LENGTH, REG_GT1X_CONFIG_DATA,
    REG_GT9X_CONFIG_DATA,
};

/// Chip id reported when the product id is not a decimal number.
pub const FALLBACK_CHIP_ID: u16 = 0x1001;

/// Per-family parameters of the configuration block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantDescriptor {
    /// Family name, for diagnostics.
    pub name: &'static str,
    /// Register address of the configuration block.
    pub config_addr: u16,
    /// Length of the configuration block.
    pub config_len: usize,
    /// Checksum used by the configuration block.
    pub checksum: ChecksumKind,
}

pub const GT1X: VariantDescriptor = VariantDescriptor {
    name: "gt1x",
    config_addr: REG_GT1X_CONFIG_DATA,
    config_len: CONFIG_MAX_LENGTH,
    checksum: ChecksumKind::SixteenBit,
};

pub const GT911: VariantDescriptor = VariantDescriptor {
    name: "gt911",
    config_addr: REG_GT9X_CONFIG_DATA,
    config_len: CONFIG_911_LENGTH,
    checksum: ChecksumKind::EightBit,
};

pub const GT967: VariantDescriptor = VariantDescriptor {
    name: "gt967",
    config_addr: REG_GT9X_CONFIG_DATA,
    config_len: CONFIG_967_LENGTH,
    checksum: ChecksumKind::EightBit,
};

/// Used for every chip id missing from [`VARIANTS`].
pub const GT9X: VariantDescriptor = VariantDescriptor {
    name: "gt9x",
    config_addr: REG_GT9X_CONFIG_DATA,
    config_len: CONFIG_MAX_LENGTH,
    checksum: ChecksumKind::EightBit,
};

/// Known chip ids and their variant.
pub static VARIANTS: &[(u16, &VariantDescriptor)] = &[
    (1151, &GT1X),
    (911, &GT911),
    (9271, &GT911),
    (9110, &GT911),
    (927, &GT911),
    (928, &GT911),
    (912, &GT967),
    (967, &GT967),
];

impl VariantDescriptor {
    /// Resolves the variant of `chip_id`, falling back to [`GT9X`].
    pub fn lookup(chip_id: u16) -> &'static VariantDescriptor {
        VARIANTS
            .iter()
            .find(|(id, _)| *id == chip_id)
            .map(|(_, variant)| *variant)
            .unwrap_or(&GT9X)
    }
}

/// Parses the 4-byte product id field.
///
/// The field holds up to four ASCII digits, NUL-terminated when shorter.
/// Anything else yields [`FALLBACK_CHIP_ID`].
pub fn parse_chip_id(field: &[u8; 4]) -> u16 {
    let digits = field.split(|&b| b == 0).next().unwrap_or(&[]);
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return FALLBACK_CHIP_ID;
    }
    digits
        .iter()
        .fold(0u16, |acc, &d| acc * 10 + u16::from(d - b'0'))
}

/// Interrupt trigger configured in the device's configuration block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Trigger {
    RisingEdge,
    #[default]
    FallingEdge,
    LevelLow,
    LevelHigh,
}

impl Trigger {
    /// Decodes the two trigger bits of the configuration block.
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Self::RisingEdge,
            1 => Self::FallingEdge,
            2 => Self::LevelLow,
            _ => Self::LevelHigh,
        }
    }
}
