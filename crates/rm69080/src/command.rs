//! RM69080 command definitions and the vendor init table

// DCS user commands
pub const DCS_ENTER_SLEEP_MODE: u8 = 0x10; // Sleep in
pub const DCS_EXIT_SLEEP_MODE: u8 = 0x11; // Sleep out
pub const DCS_SET_DISPLAY_OFF: u8 = 0x28; // Display off
pub const DCS_SET_DISPLAY_ON: u8 = 0x29; // Display on
pub const DCS_SET_TEAR_ON: u8 = 0x35; // Tearing effect line on
pub const DCS_EXIT_IDLE_MODE: u8 = 0x38; // Idle mode off (60 Hz)
pub const DCS_ENTER_IDLE_MODE: u8 = 0x39; // Idle mode on (15 Hz)
pub const DCS_SET_BRIGHTNESS: u8 = 0x51; // Brightness 0~255

// Manufacturer command set
pub const CMD_PAGE_SELECT: u8 = 0xFE; // Switch register page, 0x00 = user commands
pub const PAGE_USER: u8 = 0x00;

/// Register value that turns an entry into a delay of `value` milliseconds.
pub const SLEEP_CMD: u8 = 0x00;

/// One step of a command table: either a two-byte generic write or a delay.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandEntry {
    pub register: u8,
    pub value: u8,
}

impl CommandEntry {
    /// A `[register, value]` generic write.
    pub const fn write(register: u8, value: u8) -> Self {
        Self { register, value }
    }

    /// A delay of `ms` milliseconds.
    pub const fn sleep(ms: u8) -> Self {
        Self {
            register: SLEEP_CMD,
            value: ms,
        }
    }

    /// `Some(ms)` when this entry is a delay directive.
    pub const fn delay_ms(&self) -> Option<u8> {
        if self.register == SLEEP_CMD {
            Some(self.value)
        } else {
            None
        }
    }

    /// Bytes put on the wire for a write entry.
    pub const fn payload(&self) -> [u8; 2] {
        [self.register, self.value]
    }
}

/// Power-on script for the Kingtech PV13900ALS20C (400x400, 1 lane).
///
/// Order matters: page selects scope the register writes that follow them.
pub const RM69080_400X400_INIT: &[CommandEntry] = &[
    CommandEntry::write(CMD_PAGE_SELECT, 0x05),
    CommandEntry::write(0x05, 0x00),
    CommandEntry::write(CMD_PAGE_SELECT, 0x07),
    CommandEntry::write(0x07, 0x4F),
    CommandEntry::write(CMD_PAGE_SELECT, 0x0A),
    CommandEntry::write(0x1C, 0x1B),
    CommandEntry::write(CMD_PAGE_SELECT, PAGE_USER),
    CommandEntry::write(DCS_SET_TEAR_ON, 0x00),
    CommandEntry::write(DCS_SET_BRIGHTNESS, 0xF0),
    CommandEntry::write(DCS_EXIT_IDLE_MODE, 0x00),
    // CommandEntry::write(DCS_ENTER_IDLE_MODE, 0x00), // 15 Hz idle
    CommandEntry::write(DCS_EXIT_SLEEP_MODE, 0x00),
    CommandEntry::sleep(150),
    CommandEntry::sleep(150),
    CommandEntry::write(DCS_SET_DISPLAY_ON, 0x00),
];
