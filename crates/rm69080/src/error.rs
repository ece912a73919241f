//! Error types for the driver
//!
//! This module defines error types for configuration building ([`BuilderError`])
//! and panel operations ([`Error`]).
//!
//! ## Example
//!
//! ```
//! use rm69080::{Builder, BuilderError};
//!
//! // A panel needs at least one data lane
//! let result = Builder::new().lanes(0).build();
//! assert!(matches!(result, Err(BuilderError::InvalidLaneCount(0))));
//! ```

/// Maximum number of DSI data lanes a device can request
pub const MAX_DATA_LANES: u8 = 4;

/// Errors that can occur when driving the panel
///
/// Generic over the bus error type so callers can match on the underlying
/// link failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error<E> {
    /// A write in a command table failed
    ///
    /// Entries before `index` were applied; nothing from `index` on was.
    /// The controller is left in a panel-specific intermediate state.
    Sequence {
        /// Position of the failing entry in the table
        index: usize,
        /// Underlying bus error
        source: E,
    },
    /// DCS exit-sleep failed during prepare
    ExitSleep(E),
    /// DCS display-on failed during prepare
    ///
    /// The controller already left sleep mode, so the panel is awake but
    /// dark. It is still reported as unprepared.
    DisplayOn(E),
    /// `enable` was called on an unprepared panel with strict enable set
    NotPrepared,
    /// The mode registry could not take a copy of the display mode
    Allocation,
    /// The DSI host rejected the attach handshake
    Attach(E),
}

impl<E> Error<E> {
    /// Whether the panel may have executed part of the power-on ritual
    ///
    /// Such a panel should be unprepared before `prepare` is retried.
    pub fn is_partial(&self) -> bool {
        matches!(
            self,
            Error::Sequence { index, .. } if *index > 0
        ) || matches!(self, Error::ExitSleep(_) | Error::DisplayOn(_))
    }
}

impl<E: core::fmt::Debug> core::fmt::Display for Error<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Sequence { index, source } => {
                write!(f, "Command table write {index} failed: {source:?}")
            }
            Error::ExitSleep(e) => write!(f, "Exit sleep mode failed: {e:?}"),
            Error::DisplayOn(e) => write!(f, "Set display on failed: {e:?}"),
            Error::NotPrepared => write!(f, "Panel is not prepared"),
            Error::Allocation => write!(f, "Failed to duplicate display mode"),
            Error::Attach(e) => write!(f, "DSI attach failed: {e:?}"),
        }
    }
}

impl<E: core::fmt::Debug> core::error::Error for Error<E> {}

/// Errors that can occur when building configuration
///
/// These errors occur during the builder pattern before the panel is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuilderError {
    /// Lane count outside `1..=MAX_DATA_LANES`
    InvalidLaneCount(u8),
    /// The init table has no entries
    EmptyInitSequence,
    /// Timings are not ordered `display <= sync_start <= sync_end <= total`
    InvalidTimings {
        /// Active width requested
        hdisplay: u16,
        /// Active height requested
        vdisplay: u16,
    },
}

impl core::fmt::Display for BuilderError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BuilderError::InvalidLaneCount(lanes) => {
                write!(f, "Invalid lane count {lanes} (1..={MAX_DATA_LANES})")
            }
            BuilderError::EmptyInitSequence => write!(f, "Init sequence is empty"),
            BuilderError::InvalidTimings { hdisplay, vdisplay } => {
                write!(f, "Invalid timings for {hdisplay}x{vdisplay} mode")
            }
        }
    }
}

impl core::error::Error for BuilderError {}
