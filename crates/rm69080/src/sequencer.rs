//! Command table interpreter
//!
//! Walks a table of [`CommandEntry`] strictly in order. Write entries go out
//! as two-byte generic writes; entries whose register is
//! [`SLEEP_CMD`](crate::command::SLEEP_CMD) block the caller for `value`
//! milliseconds instead.
//!
//! The first failed write stops the walk. Entries already applied stay
//! applied; the caller must treat the panel as being in an unknown state.
//!
//! ## Example
//!
//! ```rust,ignore
//! use rm69080::{sequencer, RM69080_400X400_INIT};
//!
//! sequencer::run(&mut bus, &mut delay, RM69080_400X400_INIT)?;
//! ```

use embedded_hal::delay::DelayNs;

use crate::command::CommandEntry;
use crate::error::Error;
use crate::event::{NoopObserver, Observer, PanelEvent};
use crate::interface::DsiBus;

/// Run `commands` against `bus`
///
/// # Errors
///
/// Returns [`Error::Sequence`] carrying the index of the first write that
/// failed. No entry after it is applied.
pub fn run<B, D>(
    bus: &mut B,
    delay: &mut D,
    commands: &[CommandEntry],
) -> Result<(), Error<B::Error>>
where
    B: DsiBus + ?Sized,
    D: DelayNs + ?Sized,
{
    run_observed(bus, delay, commands, &mut NoopObserver)
}

/// Like [`run`], reporting each delay entry to `observer`
pub fn run_observed<B, D, O>(
    bus: &mut B,
    delay: &mut D,
    commands: &[CommandEntry],
    observer: &mut O,
) -> Result<(), Error<B::Error>>
where
    B: DsiBus + ?Sized,
    D: DelayNs + ?Sized,
    O: Observer + ?Sized,
{
    for (index, entry) in commands.iter().enumerate() {
        match entry.delay_ms() {
            Some(ms) => {
                log::info!("sleep: {} ms", ms);
                observer.on_event(PanelEvent::Delay { index, ms });
                delay.delay_ms(u32::from(ms));
            }
            None => {
                if let Err(source) = bus.generic_write(&entry.payload()) {
                    log::error!(
                        "generic write {:#04x} {:#04x} (entry {}) failed: {:?}",
                        entry.register,
                        entry.value,
                        index,
                        source
                    );
                    return Err(Error::Sequence { index, source });
                }
            }
        }
    }

    Ok(())
}
