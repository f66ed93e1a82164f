//! Touch report layout and decoding.
//!
//! The report register holds a status byte followed by one 8-byte record per
//! contact:
//!
//! ```text
//! status: [ready:1][-:2][button:1][count:4]
//! record: [slot][x lo][x hi][y lo][y hi][w lo][w hi][-]
//! ```

use heapless::Vec;

use crate::reg::{CONTACT_SIZE, MAX_CONTACTS, STATUS_BUTTON, STATUS_COUNT_MASK, STATUS_READY};

/// One finger touching the panel in a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    /// Persistent track id (0..=15).
    pub slot: u8,
    pub x: u16,
    pub y: u16,
    /// Contact width, reported as both touch and width major.
    pub width: u16,
}

impl Contact {
    /// Decodes one contact record.
    pub fn decode(record: &[u8; CONTACT_SIZE]) -> Self {
        Self {
            slot: record[0] & 0x0F,
            x: u16::from_le_bytes([record[1], record[2]]),
            y: u16::from_le_bytes([record[3], record[4]]),
            width: u16::from_le_bytes([record[5], record[6]]),
        }
    }
}

/// Decoded snapshot of one interrupt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TouchFrame {
    /// Dedicated button state.
    pub button: bool,
    /// Contacts in report order.
    pub contacts: Vec<Contact, { MAX_CONTACTS as usize }>,
}

impl TouchFrame {
    /// A frame without contacts and with the button released.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether no finger touches the panel.
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}

/// The report status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status(pub u8);

impl Status {
    /// The device has finished writing the report.
    pub fn is_ready(self) -> bool {
        self.0 & STATUS_READY != 0
    }

    /// The dedicated button is pressed.
    pub fn button(self) -> bool {
        self.0 & STATUS_BUTTON != 0
    }

    /// Number of contact records following the status byte.
    pub fn contacts(self) -> u8 {
        self.0 & STATUS_COUNT_MASK
    }
}

/// Axis bounds and orientation of the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchscreenProperties {
    pub max_x: u16,
    pub max_y: u16,
    pub invert_x: bool,
    pub invert_y: bool,
    pub swap_xy: bool,
}

impl TouchscreenProperties {
    /// Maps a raw contact into panel coordinates.
    ///
    /// Inversion applies to the device axes, before an optional swap.
    pub fn apply(&self, contact: Contact) -> Contact {
        let mut x = contact.x;
        let mut y = contact.y;
        if self.invert_x {
            x = self.max_x.saturating_sub(x);
        }
        if self.invert_y {
            y = self.max_y.saturating_sub(y);
        }
        if self.swap_xy {
            core::mem::swap(&mut x, &mut y);
        }
        Contact { x, y, ..contact }
    }

    /// Axis maxima as seen by the sink.
    pub fn reported_max(&self) -> (u16, u16) {
        if self.swap_xy {
            (self.max_y, self.max_x)
        } else {
            (self.max_x, self.max_y)
        }
    }
}

/// Decodes `count` records from `data`, where `data[0]` is the status byte.
pub(crate) fn decode_frame(
    status: Status,
    data: &[u8],
    count: usize,
    props: &TouchscreenProperties,
) -> TouchFrame {
    let mut frame = TouchFrame {
        button: status.button(),
        contacts: Vec::new(),
    };
    for record in data[1..]
        .chunks_exact(CONTACT_SIZE)
        .take(count)
        .filter_map(|chunk| <&[u8; CONTACT_SIZE]>::try_from(chunk).ok())
    {
        if frame.contacts.push(props.apply(Contact::decode(record))).is_err() {
            break;
        }
    }
    frame
}
