//! Structured lifecycle events
//!
//! Every lifecycle transition reports a [`PanelEvent`] to the panel's
//! [`Observer`], next to the text records sent through `log`. Tests and
//! host tooling assert on these instead of scraping log output.

/// Lifecycle operation an event belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Attach,
    Detach,
    Prepare,
    Enable,
    Disable,
    Unprepare,
    GetModes,
}

impl Operation {
    /// Name used in log records
    pub const fn name(self) -> &'static str {
        match self {
            Operation::Attach => "attach",
            Operation::Detach => "detach",
            Operation::Prepare => "prepare",
            Operation::Enable => "enable",
            Operation::Disable => "disable",
            Operation::Unprepare => "unprepare",
            Operation::GetModes => "get_modes",
        }
    }
}

/// Teardown step that may fail without aborting unprepare or detach
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TeardownStep {
    DisplayOff,
    EnterSleep,
    HostDetach,
}

/// Something the panel did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelEvent {
    /// Operation was invoked
    Entered(Operation),
    /// Operation found the panel already in its target state
    Skipped(Operation),
    /// Operation finished and changed state
    Completed(Operation),
    /// Operation returned an error
    Failed(Operation),
    /// Command table delay entry at `index`
    Delay { index: usize, ms: u8 },
    /// `enable` went through on an unprepared panel
    EnabledUnprepared,
    /// A best-effort teardown write failed
    TeardownFailed(TeardownStep),
    /// A mode was handed to the registry
    ModeAdded {
        hdisplay: u16,
        vdisplay: u16,
        vrefresh: u32,
    },
}

/// Receiver of [`PanelEvent`]s
pub trait Observer {
    fn on_event(&mut self, event: PanelEvent);
}

/// Observer that drops every event
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn on_event(&mut self, _event: PanelEvent) {}
}
