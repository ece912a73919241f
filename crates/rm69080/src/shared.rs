//! Panel shared between threads
//!
//! Lifecycle methods on [`Rm69080`] take `&mut self`. When more than one
//! caller can reach the same panel, [`SharedPanel`] puts it behind a single
//! mutex so operations never interleave. A `prepare` holding the lock blocks
//! other callers for the full power-on ritual.

use std::sync::{Mutex, MutexGuard};

use embedded_hal::delay::DelayNs;

use crate::error::Error;
use crate::event::{NoopObserver, Observer};
use crate::interface::DsiBus;
use crate::mode::ModeRegistry;
use crate::panel::{PanelState, Rm69080};

/// Mutex-serialized [`Rm69080`]
pub struct SharedPanel<B, D, O = NoopObserver> {
    inner: Mutex<Rm69080<B, D, O>>,
}

impl<B, D, O> SharedPanel<B, D, O>
where
    B: DsiBus,
    D: DelayNs,
    O: Observer,
{
    pub fn new(panel: Rm69080<B, D, O>) -> Self {
        Self {
            inner: Mutex::new(panel),
        }
    }

    /// Lock the panel for a sequence of operations
    ///
    /// A poisoned lock is recovered: every operation leaves the state
    /// flags consistent before it can panic.
    pub fn lock(&self) -> MutexGuard<'_, Rm69080<B, D, O>> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn prepare(&self) -> Result<(), Error<B::Error>> {
        self.lock().prepare()
    }

    pub fn enable(&self) -> Result<(), Error<B::Error>> {
        self.lock().enable()
    }

    pub fn disable(&self) -> Result<(), Error<B::Error>> {
        self.lock().disable()
    }

    pub fn unprepare(&self) -> Result<(), Error<B::Error>> {
        self.lock().unprepare()
    }

    pub fn get_modes<R>(&self, registry: &mut R) -> Result<usize, Error<B::Error>>
    where
        R: ModeRegistry + ?Sized,
    {
        self.lock().get_modes(registry)
    }

    pub fn state(&self) -> PanelState {
        self.lock().state()
    }

    pub fn into_inner(self) -> Rm69080<B, D, O> {
        self.inner
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
