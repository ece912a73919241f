//! Driver for the Raydium RM69080 MIPI-DSI AMOLED controller
//!
//! Brings up the Kingtech PV13900ALS20C (400x400, single data lane) from an
//! unpowered state to a rendering state and back, and reports the panel's
//! native timing to the graphics stack.
//!
//! The crate is built around two pieces:
//!
//! - [`sequencer`] walks a vendor command table such as
//!   [`RM69080_400X400_INIT`]: two-byte writes with embedded delays, stopping
//!   at the first failed write.
//! - [`Rm69080`] is the lifecycle state machine (`prepare`, `enable`,
//!   `disable`, `unprepare`, `get_modes`) driving the sequencer and the DCS
//!   power commands.
//!
//! The DSI link, delays, the mode registry and the display host are all
//! collaborators passed in through [`DsiBus`], [`embedded_hal::delay::DelayNs`],
//! [`ModeRegistry`] and [`DsiHost`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use rm69080::{on_attach, Config};
//!
//! let mut panel = on_attach(&mut dsi, delay, &mut host, Config::rm69080())?;
//! panel.get_modes(&mut connector)?;
//! panel.prepare()?;
//! panel.enable()?;
//! // ... frames ...
//! panel.disable()?;
//! panel.unprepare()?;
//! rm69080::on_detach(panel, &mut host);
//! ```

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![forbid(unsafe_code)]
#![cfg_attr(
    not(test),
    deny(
        clippy::expect_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented,
        clippy::unreachable,
        clippy::unwrap_used
    )
)]

pub mod attach;
pub mod command;
pub mod config;
pub mod error;
pub mod event;
pub mod interface;
pub mod mode;
pub mod panel;
pub mod sequencer;
#[cfg(any(test, feature = "std"))]
pub mod shared;

pub use attach::{
    COMPATIBLE, DRIVER_NAME, matches_compatible, on_attach, on_attach_observed, on_detach,
};
pub use command::{CommandEntry, RM69080_400X400_INIT, SLEEP_CMD};
pub use config::{Builder, Config, DsiDeviceConfig, ModeFlags, PixelFormat};
pub use error::{BuilderError, Error};
pub use event::{NoopObserver, Observer, Operation, PanelEvent, TeardownStep};
pub use interface::{DsiBus, DsiHost};
pub use mode::{DisplayMode, ModeRegistry, ModeType, PhysicalSize, RM69080_400X400_MODE};
pub use panel::{PanelState, PowerState, Rm69080};
#[cfg(any(test, feature = "std"))]
pub use shared::SharedPanel;

/// Panel width in pixels
pub const DISPLAY_WIDTH: u32 = RM69080_400X400_MODE.hdisplay as u32;
/// Panel height in pixels
pub const DISPLAY_HEIGHT: u32 = RM69080_400X400_MODE.vdisplay as u32;
