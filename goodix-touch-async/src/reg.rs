//! Register map, bus addresses and the hardware timing table.

/// Primary 7-bit bus address (interrupt line low during reset).
pub const PRIMARY_ADDRESS: u8 = 0x5D;
/// Secondary 7-bit bus address (interrupt line high during reset).
pub const SECONDARY_ADDRESS: u8 = 0x14;

/// Command register.
pub const REG_COMMAND: u16 = 0x8040;
/// Configuration block of GT1x parts.
pub const REG_GT1X_CONFIG_DATA: u16 = 0x8050;
/// Configuration block of GT9xx parts.
pub const REG_GT9X_CONFIG_DATA: u16 = 0x8047;
/// Product id (4 ASCII digits) followed by the LE firmware version.
pub const REG_ID: u16 = 0x8140;
/// Sensor id, selects the matching configuration blob.
pub const REG_SENSOR_ID: u16 = 0x814A;
/// Touch report: status byte followed by 8-byte contact records.
pub const REG_READ_COOR: u16 = 0x814E;

/// Screen-off command written to [`REG_COMMAND`] on suspend.
pub const CMD_SCREEN_OFF: u8 = 0x05;

/// Length of the identification block at [`REG_ID`].
pub const ID_BLOCK_LEN: usize = 6;
/// Size of one contact record in the touch report.
pub const CONTACT_SIZE: usize = 8;
/// Contacts the report buffer can hold.
pub const MAX_CONTACTS: u8 = 10;
/// Highest sensor id with a configuration slot.
pub const MAX_SENSOR_ID: u8 = 6;
/// Upper bound for a configuration blob.
pub const CONFIG_MAX_LENGTH: usize = 240;
/// Configuration length of the GT911 family.
pub const CONFIG_911_LENGTH: usize = 186;
/// Configuration length of the GT967 family.
pub const CONFIG_967_LENGTH: usize = 228;

/// Ready flag in the report status byte.
pub const STATUS_READY: u8 = 1 << 7;
/// Dedicated button flag in the report status byte.
pub const STATUS_BUTTON: u8 = 1 << 4;
/// Contact count in the report status byte.
pub const STATUS_COUNT_MASK: u8 = 0x0F;

/// Offsets inside the on-device configuration block.
pub(crate) mod cfg {
    pub const RESOLUTION: usize = 1;
    pub const MAX_CONTACTS: usize = 5;
    pub const TRIGGER: usize = 6;
}

/// Defaults applied when the on-device configuration is unusable.
pub const DEFAULT_MAX_X: u16 = 4096 - 1;
pub const DEFAULT_MAX_Y: u16 = 4096 - 1;

/// Hardware-mandated delays.
pub mod timing {
    use embassy_time::Duration;

    /// Reset held low (T2, > 10 ms).
    pub const RESET_LOW: Duration = Duration::from_millis(20);
    /// Address-select level settle before reset release (T3, > 100 us).
    pub const ADDRESS_SELECT: Duration = Duration::from_micros(100);
    /// Reset released high before handing the line back (T4, > 5 ms).
    pub const RESET_HIGH: Duration = Duration::from_millis(6);
    /// Interrupt line held low during resynchronization (T5).
    pub const INT_SYNC: Duration = Duration::from_millis(50);
    /// Backoff between bus liveness attempts.
    pub const PROBE_BACKOFF: Duration = Duration::from_millis(20);
    /// Re-latch time after a configuration write.
    pub const CONFIG_LATCH: Duration = Duration::from_millis(10);
    /// Deadline for the report ready flag.
    pub const REPORT_DEADLINE: Duration = Duration::from_millis(20);
    /// Sleep between report polls.
    pub const REPORT_POLL: Duration = Duration::from_millis(1);
    /// Interrupt line held low before the screen-off command.
    pub const SUSPEND_INT_LOW: Duration = Duration::from_millis(5);
    /// Supply rails settle after switching.
    pub const REGULATOR_SETTLE: Duration = Duration::from_millis(20);
    /// Minimum interval between screen-off and the next wake-up.
    pub const QUIESCENCE: Duration = Duration::from_millis(58);
    /// Wake pulse on the interrupt line (2..5 ms).
    pub const WAKE_PULSE: Duration = Duration::from_millis(2);
}
