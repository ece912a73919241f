//! Hardware interface abstraction
//!
//! This module provides the [`DsiBus`] trait the panel uses to talk to the
//! RM69080 over a MIPI-DSI link, and the [`DsiHost`] trait the attach/detach
//! path uses to register the panel with the display host.
//!
//! ## Example
//!
//! ```rust,ignore
//! use rm69080::DsiBus;
//!
//! // Two-byte manufacturer write
//! bus.generic_write(&[0xFE, 0x05])?;
//!
//! // DCS helpers are built on dcs_write
//! bus.exit_sleep_mode()?;
//! bus.set_display_on()?;
//! ```

use core::fmt::Debug;

use crate::command::*;
use crate::config::DsiDeviceConfig;

/// Trait for the DSI link to the RM69080 controller
///
/// Implementations are synchronous: each call returns once the packet has
/// been handed to the link (or the link reported a failure).
///
/// A `&mut B` is itself a [`DsiBus`], so the panel can borrow a bus that stays
/// owned by the host.
pub trait DsiBus {
    /// Error type for bus operations
    ///
    /// Must implement [`Debug`] for error reporting.
    type Error: Debug;

    /// Send a generic (manufacturer) write packet
    ///
    /// # Errors
    ///
    /// Returns an error if the packet could not be transferred.
    fn generic_write(&mut self, payload: &[u8]) -> Result<(), Self::Error>;

    /// Send a DCS write packet, `payload[0]` being the DCS command
    ///
    /// # Errors
    ///
    /// Returns an error if the packet could not be transferred.
    fn dcs_write(&mut self, payload: &[u8]) -> Result<(), Self::Error>;

    /// DCS `exit_sleep_mode` (0x11)
    fn exit_sleep_mode(&mut self) -> Result<(), Self::Error> {
        self.dcs_write(&[DCS_EXIT_SLEEP_MODE])
    }

    /// DCS `enter_sleep_mode` (0x10)
    fn enter_sleep_mode(&mut self) -> Result<(), Self::Error> {
        self.dcs_write(&[DCS_ENTER_SLEEP_MODE])
    }

    /// DCS `set_display_on` (0x29)
    fn set_display_on(&mut self) -> Result<(), Self::Error> {
        self.dcs_write(&[DCS_SET_DISPLAY_ON])
    }

    /// DCS `set_display_off` (0x28)
    fn set_display_off(&mut self) -> Result<(), Self::Error> {
        self.dcs_write(&[DCS_SET_DISPLAY_OFF])
    }
}

impl<B: DsiBus + ?Sized> DsiBus for &mut B {
    type Error = B::Error;

    fn generic_write(&mut self, payload: &[u8]) -> Result<(), Self::Error> {
        (**self).generic_write(payload)
    }

    fn dcs_write(&mut self, payload: &[u8]) -> Result<(), Self::Error> {
        (**self).dcs_write(payload)
    }

    fn exit_sleep_mode(&mut self) -> Result<(), Self::Error> {
        (**self).exit_sleep_mode()
    }

    fn enter_sleep_mode(&mut self) -> Result<(), Self::Error> {
        (**self).enter_sleep_mode()
    }

    fn set_display_on(&mut self) -> Result<(), Self::Error> {
        (**self).set_display_on()
    }

    fn set_display_off(&mut self) -> Result<(), Self::Error> {
        (**self).set_display_off()
    }
}

/// Trait for the display host the panel attaches to
///
/// Mirrors the two registrations a panel goes through on discovery: it is
/// published to the graphics stack as a panel, then the DSI device is attached
/// to the host controller with its link configuration.
pub trait DsiHost {
    /// Error type for host operations
    type Error: Debug;

    /// Publish the panel under `name` to the graphics stack
    fn add_panel(&mut self, name: &'static str) -> Result<(), Self::Error>;

    /// Withdraw a panel previously published with [`DsiHost::add_panel`]
    fn remove_panel(&mut self, name: &'static str);

    /// Attach the DSI device, applying lane count, pixel format and mode flags
    fn attach(&mut self, device: &DsiDeviceConfig) -> Result<(), Self::Error>;

    /// Detach the DSI device
    fn detach(&mut self) -> Result<(), Self::Error>;
}

impl<H: DsiHost + ?Sized> DsiHost for &mut H {
    type Error = H::Error;

    fn add_panel(&mut self, name: &'static str) -> Result<(), Self::Error> {
        (**self).add_panel(name)
    }

    fn remove_panel(&mut self, name: &'static str) {
        (**self).remove_panel(name)
    }

    fn attach(&mut self, device: &DsiDeviceConfig) -> Result<(), Self::Error> {
        (**self).attach(device)
    }

    fn detach(&mut self) -> Result<(), Self::Error> {
        (**self).detach()
    }
}
