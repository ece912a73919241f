//! Panel configuration types and builder

use crate::command::{CommandEntry, RM69080_400X400_INIT};
pub use crate::error::{BuilderError, MAX_DATA_LANES};
use crate::mode::{DisplayMode, ModeType, PhysicalSize, RM69080_400X400_MODE};

/// Pixel format on the DSI video stream
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PixelFormat {
    /// 24 bpp
    #[default]
    Rgb888,
    /// 18 bpp, loosely packed
    Rgb666,
    /// 18 bpp, packed
    Rgb666Packed,
    /// 16 bpp
    Rgb565,
}

impl PixelFormat {
    /// Bits per pixel on the link
    pub const fn bits_per_pixel(self) -> u8 {
        match self {
            PixelFormat::Rgb888 => 24,
            PixelFormat::Rgb666 | PixelFormat::Rgb666Packed => 18,
            PixelFormat::Rgb565 => 16,
        }
    }
}

/// DSI link mode flags
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ModeFlags {
    /// Video mode (as opposed to command mode)
    pub video: bool,
    /// Video mode with sync pulses instead of sync events
    pub video_sync_pulse: bool,
    /// Send commands in low-power mode
    pub lpm: bool,
}

/// Link configuration handed to the DSI host on attach
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DsiDeviceConfig {
    pub lanes: u8,
    pub format: PixelFormat,
    pub mode_flags: ModeFlags,
}

impl Default for DsiDeviceConfig {
    fn default() -> Self {
        DsiDeviceConfig {
            lanes: 1,
            format: PixelFormat::Rgb888,
            mode_flags: ModeFlags {
                video: true,
                video_sync_pulse: true,
                lpm: true,
            },
        }
    }
}

/// Panel configuration
///
/// This struct holds every tunable of the power-on ritual and the mode the
/// panel reports. Use `Builder` to create a Config.
#[derive(Clone, Debug)]
pub struct Config {
    /// DSI link configuration
    pub device: DsiDeviceConfig,
    /// Vendor command table run at the start of prepare
    pub init_sequence: &'static [CommandEntry],
    /// Wait after DCS exit-sleep, in milliseconds
    pub exit_sleep_delay_ms: u32,
    /// Wait after DCS display-on, in milliseconds
    pub display_on_delay_ms: u32,
    /// Native display mode
    pub mode: DisplayMode,
    /// Reject `enable` on an unprepared panel
    pub strict_enable: bool,
}

impl Config {
    /// Stock configuration for the Kingtech PV13900ALS20C
    pub fn rm69080() -> Self {
        Builder::new().build_unchecked()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::rm69080()
    }
}

/// Builder for constructing panel configuration
///
/// # Example
///
/// ```
/// use rm69080::{Builder, PixelFormat};
///
/// let config = Builder::new()
///     .lanes(1)
///     .format(PixelFormat::Rgb888)
///     .strict_enable(true)
///     .build()
///     .expect("valid configuration");
/// assert_eq!(config.exit_sleep_delay_ms, 40);
/// ```
pub struct Builder {
    device: DsiDeviceConfig,
    init_sequence: &'static [CommandEntry],
    exit_sleep_delay_ms: u32,
    display_on_delay_ms: u32,
    mode: DisplayMode,
    strict_enable: bool,
}

impl Default for Builder {
    fn default() -> Self {
        Builder {
            // 1 lane, RGB888, video + sync pulse, LPM commands
            device: DsiDeviceConfig::default(),
            init_sequence: RM69080_400X400_INIT,
            exit_sleep_delay_ms: 40,
            display_on_delay_ms: 20,
            mode: RM69080_400X400_MODE,
            strict_enable: false,
        }
    }
}

impl Builder {
    /// Create a new Builder with the stock RM69080 values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of DSI data lanes
    pub fn lanes(mut self, lanes: u8) -> Self {
        self.device.lanes = lanes;
        self
    }

    /// Set the pixel format
    pub fn format(mut self, format: PixelFormat) -> Self {
        self.device.format = format;
        self
    }

    /// Set the link mode flags
    pub fn mode_flags(mut self, flags: ModeFlags) -> Self {
        self.device.mode_flags = flags;
        self
    }

    /// Replace the vendor command table
    pub fn init_sequence(mut self, table: &'static [CommandEntry]) -> Self {
        self.init_sequence = table;
        self
    }

    /// Set the settle time after exit-sleep
    pub fn exit_sleep_delay_ms(mut self, ms: u32) -> Self {
        self.exit_sleep_delay_ms = ms;
        self
    }

    /// Set the settle time after display-on
    pub fn display_on_delay_ms(mut self, ms: u32) -> Self {
        self.display_on_delay_ms = ms;
        self
    }

    /// Replace the native display mode
    pub fn mode(mut self, mode: DisplayMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the physical size reported with the mode
    pub fn physical_size(mut self, width_mm: u32, height_mm: u32) -> Self {
        self.mode = self.mode.with_physical_size(PhysicalSize {
            width_mm,
            height_mm,
        });
        self
    }

    /// Mark the mode as preferred
    pub fn preferred(mut self, preferred: bool) -> Self {
        self.mode = self.mode.with_type(ModeType {
            preferred,
            ..self.mode.mode_type
        });
        self
    }

    /// Make `enable` fail with `Error::NotPrepared` on an unprepared panel
    pub fn strict_enable(mut self, strict: bool) -> Self {
        self.strict_enable = strict;
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    ///
    /// Returns `BuilderError::InvalidLaneCount` for a lane count outside
    /// `1..=4`, `BuilderError::EmptyInitSequence` for an empty table and
    /// `BuilderError::InvalidTimings` for a malformed mode.
    pub fn build(self) -> Result<Config, BuilderError> {
        if self.device.lanes == 0 || self.device.lanes > MAX_DATA_LANES {
            return Err(BuilderError::InvalidLaneCount(self.device.lanes));
        }
        if self.init_sequence.is_empty() {
            return Err(BuilderError::EmptyInitSequence);
        }
        if !self.mode.is_valid() {
            return Err(BuilderError::InvalidTimings {
                hdisplay: self.mode.hdisplay,
                vdisplay: self.mode.vdisplay,
            });
        }
        Ok(self.build_unchecked())
    }

    fn build_unchecked(self) -> Config {
        Config {
            device: self.device,
            init_sequence: self.init_sequence,
            exit_sleep_delay_ms: self.exit_sleep_delay_ms,
            display_on_delay_ms: self.display_on_delay_ms,
            mode: self.mode,
            strict_enable: self.strict_enable,
        }
    }
}
