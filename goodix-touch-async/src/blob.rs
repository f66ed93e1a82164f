//! Configuration blobs and their validation.
//!
//! A blob is the raw image of the controller's configuration block. Its tail
//! carries a checksum over the payload followed by the config-fresh marker:
//!
//! ```text
//! 8-bit:  [payload .. ][sum8][fresh]
//! 16-bit: [payload .. ][sum16 hi][sum16 lo][fresh]
//! ```
//!
//! The checksum is the two's-complement negation of the payload sum, so the
//! payload plus checksum sums to zero.

use heapless::Vec;

use crate::error::ConfigError;
use crate::reg::CONFIG_MAX_LENGTH;

/// Value of the config-fresh marker that makes the device apply a blob.
pub const FRESH: u8 = 1;

/// How a blob's checksum is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumKind {
    /// Negated sum of all payload bytes, one checksum byte.
    EightBit,
    /// Negated sum of the payload as big-endian halfwords, two checksum bytes.
    SixteenBit,
}

impl ChecksumKind {
    /// Bytes occupied by the checksum field.
    pub const fn checksum_len(self) -> usize {
        match self {
            Self::EightBit => 1,
            Self::SixteenBit => 2,
        }
    }

    /// Bytes occupied by the checksum field and the fresh marker.
    pub const fn trailer_len(self) -> usize {
        self.checksum_len() + 1
    }
}

/// An immutable configuration image bounded by the configuration block size.
#[derive(Clone, PartialEq, Eq)]
pub struct ConfigBlob {
    bytes: Vec<u8, CONFIG_MAX_LENGTH>,
    kind: ChecksumKind,
}

impl core::fmt::Debug for ConfigBlob {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ConfigBlob")
            .field("len", &self.bytes.len())
            .field("kind", &self.kind)
            .field("fresh", &self.fresh_marker())
            .finish()
    }
}

impl ConfigBlob {
    /// Copies a complete blob (payload, checksum and fresh marker).
    pub fn new(bytes: &[u8], kind: ChecksumKind) -> Result<Self, ConfigError> {
        let bytes = Vec::from_slice(bytes).map_err(|_| ConfigError::InvalidLength)?;
        Ok(Self { bytes, kind })
    }

    /// Builds a blob from raw payload bytes by appending the checksum and a
    /// set fresh marker.
    pub fn seal(payload: &[u8], kind: ChecksumKind) -> Result<Self, ConfigError> {
        if payload.len() + kind.trailer_len() > CONFIG_MAX_LENGTH {
            return Err(ConfigError::InvalidLength);
        }
        let mut bytes: Vec<u8, CONFIG_MAX_LENGTH> = Vec::new();
        bytes
            .extend_from_slice(payload)
            .map_err(|_| ConfigError::InvalidLength)?;
        match kind {
            ChecksumKind::EightBit => {
                let sum = checksum8(payload);
                bytes.push(sum).map_err(|_| ConfigError::InvalidLength)?;
            }
            ChecksumKind::SixteenBit => {
                let sum = if payload.len() % 2 == 1 {
                    solve_odd_checksum16(payload).ok_or(ConfigError::ChecksumMismatch)?
                } else {
                    checksum16(payload, 0)
                };
                bytes
                    .extend_from_slice(&sum.to_be_bytes())
                    .map_err(|_| ConfigError::InvalidLength)?;
            }
        }
        bytes.push(FRESH).map_err(|_| ConfigError::InvalidLength)?;
        Ok(Self { bytes, kind })
    }

    /// The complete blob as written to the device.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Blob length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the blob holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The checksum kind the blob was tagged with.
    pub fn kind(&self) -> ChecksumKind {
        self.kind
    }

    /// The trailing config-fresh marker, if any.
    pub fn fresh_marker(&self) -> Option<u8> {
        self.bytes.last().copied()
    }

    /// Validates the blob against its own checksum kind.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate(&self.bytes, self.kind)
    }
}

/// Checks length, checksum and fresh marker of a blob.
pub fn validate(bytes: &[u8], kind: ChecksumKind) -> Result<(), ConfigError> {
    if bytes.len() > CONFIG_MAX_LENGTH || bytes.len() < kind.trailer_len() {
        return Err(ConfigError::InvalidLength);
    }
    if bytes[bytes.len() - 1] != FRESH {
        return Err(ConfigError::NotFresh);
    }
    let payload_len = bytes.len() - kind.trailer_len();

    match kind {
        ChecksumKind::EightBit => {
            if checksum8(&bytes[..payload_len]) != bytes[payload_len] {
                return Err(ConfigError::ChecksumMismatch);
            }
        }
        ChecksumKind::SixteenBit => {
            let stored = u16::from_be_bytes([bytes[payload_len], bytes[payload_len + 1]]);
            if checksum16(&bytes[..payload_len], bytes[payload_len]) != stored {
                return Err(ConfigError::ChecksumMismatch);
            }
        }
    }
    Ok(())
}

fn checksum8(payload: &[u8]) -> u8 {
    payload
        .iter()
        .fold(0u8, |acc, &b| acc.wrapping_add(b))
        .wrapping_neg()
}

/// `pad` completes an odd trailing byte; the device reads past the payload
/// into the first checksum byte.
fn checksum16(payload: &[u8], pad: u8) -> u16 {
    payload
        .chunks(2)
        .map(|pair| match *pair {
            [hi, lo] => u16::from_be_bytes([hi, lo]),
            [hi] => u16::from_be_bytes([hi, pad]),
            _ => 0,
        })
        .fold(0u16, |acc, word| acc.wrapping_add(word))
        .wrapping_neg()
}

/// For an odd payload the checksum's high byte is part of the summed data,
/// so look for the high byte that makes the stored word match.
fn solve_odd_checksum16(payload: &[u8]) -> Option<u16> {
    (0..=u8::MAX)
        .map(|hi| checksum16(payload, hi))
        .zip(0..=u8::MAX)
        .find(|&(sum, hi)| (sum >> 8) as u8 == hi)
        .map(|(sum, _)| sum)
}
