//! Display timing descriptors and the mode registry seam

use core::fmt;

/// How the graphics stack should treat a probed mode
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ModeType {
    /// Mode comes from the driver rather than EDID or the user
    pub driver: bool,
    /// Mode should be picked when nothing else is requested
    pub preferred: bool,
}

impl ModeType {
    /// Driver-provided, not preferred
    pub const DRIVER: ModeType = ModeType {
        driver: true,
        preferred: false,
    };
}

/// Physical size of the active area in millimetres
///
/// `0x0` means unknown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PhysicalSize {
    pub width_mm: u32,
    pub height_mm: u32,
}

/// Video timing of one display mode
///
/// Horizontal values are in pixels, vertical values in lines, `clock` in kHz.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplayMode {
    pub clock: u32,
    pub hdisplay: u16,
    pub hsync_start: u16,
    pub hsync_end: u16,
    pub htotal: u16,
    pub vdisplay: u16,
    pub vsync_start: u16,
    pub vsync_end: u16,
    pub vtotal: u16,
    pub mode_type: ModeType,
    pub physical: PhysicalSize,
}

impl DisplayMode {
    /// Build a mode from active size, porches and sync pulse widths
    ///
    /// Timing sums saturate at `u16::MAX` instead of wrapping.
    #[allow(clippy::too_many_arguments)]
    pub const fn from_porches(
        clock: u32,
        hdisplay: u16,
        hfront_porch: u16,
        hsync_len: u16,
        hback_porch: u16,
        vdisplay: u16,
        vfront_porch: u16,
        vsync_len: u16,
        vback_porch: u16,
    ) -> Self {
        let hsync_start = hdisplay.saturating_add(hfront_porch);
        let hsync_end = hsync_start.saturating_add(hsync_len);
        let vsync_start = vdisplay.saturating_add(vfront_porch);
        let vsync_end = vsync_start.saturating_add(vsync_len);
        Self {
            clock,
            hdisplay,
            hsync_start,
            hsync_end,
            htotal: hsync_end.saturating_add(hback_porch),
            vdisplay,
            vsync_start,
            vsync_end,
            vtotal: vsync_end.saturating_add(vback_porch),
            mode_type: ModeType::DRIVER,
            physical: PhysicalSize {
                width_mm: 0,
                height_mm: 0,
            },
        }
    }

    /// Timings are ordered `display <= sync_start <= sync_end <= total`
    pub fn is_valid(&self) -> bool {
        self.clock > 0
            && self.hdisplay > 0
            && self.vdisplay > 0
            && self.hdisplay <= self.hsync_start
            && self.hsync_start <= self.hsync_end
            && self.hsync_end <= self.htotal
            && self.vdisplay <= self.vsync_start
            && self.vsync_start <= self.vsync_end
            && self.vsync_end <= self.vtotal
    }

    /// Refresh rate in Hz, rounded to the closest integer
    pub fn vrefresh(&self) -> u32 {
        let den = u64::from(self.htotal) * u64::from(self.vtotal);
        if den == 0 {
            return 0;
        }
        let num = u64::from(self.clock) * 1000;
        u32::try_from((num + den / 2) / den).unwrap_or(u32::MAX)
    }

    /// Same timings with a different mode type
    pub const fn with_type(mut self, mode_type: ModeType) -> Self {
        self.mode_type = mode_type;
        self
    }

    /// Same timings with a physical size
    pub const fn with_physical_size(mut self, physical: PhysicalSize) -> Self {
        self.physical = physical;
        self
    }
}

/// Mode name as the graphics stack lists it, e.g. `400x400`
impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.hdisplay, self.vdisplay)
    }
}

/// Native 400x400 timing of the PV13900ALS20C, 60 Hz
pub const RM69080_400X400_MODE: DisplayMode =
    DisplayMode::from_porches(11094, 400, 10, 10, 10, 400, 10, 10, 10);

/// Collaborator that stores probed modes for the display configuration layer
pub trait ModeRegistry {
    /// Error type when the registry cannot take the mode
    type Error: fmt::Debug;

    /// Store a copy of `mode` in the probed-mode list
    fn add_probed_mode(&mut self, mode: &DisplayMode) -> Result<(), Self::Error>;

    /// Record the physical size of the connector's display
    fn set_physical_size(&mut self, size: PhysicalSize);
}

impl<R: ModeRegistry + ?Sized> ModeRegistry for &mut R {
    type Error = R::Error;

    fn add_probed_mode(&mut self, mode: &DisplayMode) -> Result<(), Self::Error> {
        (**self).add_probed_mode(mode)
    }

    fn set_physical_size(&mut self, size: PhysicalSize) {
        (**self).set_physical_size(size)
    }
}
