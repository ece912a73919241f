//! Host-side harness for scripted panel lifecycle scenarios.
//!
//! Couples an [`Rm69080`] with in-memory collaborators: a bus and delay that
//! append to one shared [`Timeline`], a mode registry, a DSI host and an event
//! log. Faults can be injected into the bus to exercise the error paths.

use std::cell::RefCell;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;
use rm69080::{
    on_attach_observed, on_detach, Config, DisplayMode, DsiBus, DsiDeviceConfig, DsiHost, Error,
    ModeRegistry, Observer, PanelEvent, PanelState, PhysicalSize, Rm69080,
};

/// One thing that happened on the wire or the clock
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Two-byte generic write `[register, value]`
    Generic(u8, u8),
    /// DCS write, first byte only
    Dcs(u8),
    /// Blocking delay
    Delay(Duration),
}

impl Step {
    pub fn is_write(&self) -> bool {
        !matches!(self, Step::Delay(_))
    }

    pub fn delay_ms(ms: u64) -> Self {
        Step::Delay(Duration::from_millis(ms))
    }
}

/// Fault injected into [`RecordingBus`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fault {
    /// Fail the generic write with this 0-based index (counted over the bus lifetime)
    GenericWrite(usize),
    /// Fail every DCS write of this command
    Dcs(u8),
}

/// Link failure reported by [`RecordingBus`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BusError {
    #[error("generic write {0} not acknowledged")]
    GenericNak(usize),
    #[error("DCS command {0:#04x} not acknowledged")]
    DcsNak(u8),
}

#[derive(Default)]
struct TimelineInner {
    steps: Vec<Step>,
    faults: Vec<Fault>,
    generic_writes: usize,
}

/// Shared ordered record of bus writes and delays
#[derive(Clone, Default)]
pub struct Timeline(Rc<RefCell<TimelineInner>>);

impl Timeline {
    pub fn steps(&self) -> Vec<Step> {
        self.0.borrow().steps.clone()
    }

    /// Writes only, in order
    pub fn writes(&self) -> Vec<Step> {
        self.0
            .borrow()
            .steps
            .iter()
            .copied()
            .filter(Step::is_write)
            .collect()
    }

    /// Sum of all recorded delays
    pub fn total_delay(&self) -> Duration {
        self.0
            .borrow()
            .steps
            .iter()
            .filter_map(|s| match s {
                Step::Delay(d) => Some(*d),
                _ => None,
            })
            .sum()
    }

    pub fn inject(&self, fault: Fault) {
        self.0.borrow_mut().faults.push(fault);
    }

    pub fn clear_faults(&self) {
        self.0.borrow_mut().faults.clear();
    }

    /// Forget recorded steps; faults and the write counter stay
    pub fn clear(&self) {
        self.0.borrow_mut().steps.clear();
    }

    fn push(&self, step: Step) {
        self.0.borrow_mut().steps.push(step);
    }
}

/// [`DsiBus`] that records to a [`Timeline`]
pub struct RecordingBus {
    timeline: Timeline,
}

impl RecordingBus {
    pub fn new(timeline: Timeline) -> Self {
        Self { timeline }
    }
}

impl DsiBus for RecordingBus {
    type Error = BusError;

    fn generic_write(&mut self, payload: &[u8]) -> Result<(), Self::Error> {
        let mut inner = self.timeline.0.borrow_mut();
        let index = inner.generic_writes;
        inner.generic_writes += 1;
        if inner.faults.contains(&Fault::GenericWrite(index)) {
            log::debug!("injecting NAK on generic write {}", index);
            return Err(BusError::GenericNak(index));
        }
        let register = payload.first().copied().unwrap_or_default();
        let value = payload.get(1).copied().unwrap_or_default();
        inner.steps.push(Step::Generic(register, value));
        Ok(())
    }

    fn dcs_write(&mut self, payload: &[u8]) -> Result<(), Self::Error> {
        let command = payload.first().copied().unwrap_or_default();
        let mut inner = self.timeline.0.borrow_mut();
        if inner.faults.contains(&Fault::Dcs(command)) {
            log::debug!("injecting NAK on DCS {:#04x}", command);
            return Err(BusError::DcsNak(command));
        }
        inner.steps.push(Step::Dcs(command));
        Ok(())
    }
}

/// [`DelayNs`] that records to a [`Timeline`], optionally sleeping for real
pub struct RecordingDelay {
    timeline: Timeline,
    realtime: bool,
}

impl RecordingDelay {
    /// Record only; returns immediately
    pub fn new(timeline: Timeline) -> Self {
        Self {
            timeline,
            realtime: false,
        }
    }

    /// Record and block the thread for the requested time
    pub fn realtime(timeline: Timeline) -> Self {
        Self {
            timeline,
            realtime: true,
        }
    }

    fn wait(&mut self, duration: Duration) {
        log::trace!("delay {:?} (realtime: {})", duration, self.realtime);
        self.timeline.push(Step::Delay(duration));
        if self.realtime {
            thread::sleep(duration);
        }
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.wait(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_us(&mut self, us: u32) {
        self.wait(Duration::from_micros(u64::from(us)));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.wait(Duration::from_millis(u64::from(ms)));
    }
}

/// Mode registry failure
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("out of memory duplicating mode")]
    OutOfMemory,
}

/// [`ModeRegistry`] keeping probed modes in a Vec
#[derive(Default)]
pub struct ProbedModes {
    modes: Vec<DisplayMode>,
    physical: Option<PhysicalSize>,
    out_of_memory: bool,
}

impl ProbedModes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `add_probed_mode` fail
    pub fn exhaust(&mut self) {
        self.out_of_memory = true;
    }

    pub fn modes(&self) -> &[DisplayMode] {
        &self.modes
    }

    pub fn physical_size(&self) -> Option<PhysicalSize> {
        self.physical
    }
}

impl ModeRegistry for ProbedModes {
    type Error = RegistryError;

    fn add_probed_mode(&mut self, mode: &DisplayMode) -> Result<(), Self::Error> {
        if self.out_of_memory {
            return Err(RegistryError::OutOfMemory);
        }
        self.modes.push(*mode);
        Ok(())
    }

    fn set_physical_size(&mut self, size: PhysicalSize) {
        self.physical = Some(size);
    }
}

/// DSI host failure
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("panel registry refused the panel")]
    PanelRejected,
    #[error("DSI attach handshake failed")]
    AttachRejected,
    #[error("DSI detach failed")]
    DetachRejected,
}

/// [`DsiHost`] with scriptable failures
#[derive(Default)]
pub struct FakeHost {
    pub panels: Vec<&'static str>,
    pub attached: Option<DsiDeviceConfig>,
    pub reject_panel: bool,
    pub reject_attach: bool,
    pub reject_detach: bool,
}

impl DsiHost for FakeHost {
    type Error = HostError;

    fn add_panel(&mut self, name: &'static str) -> Result<(), Self::Error> {
        if self.reject_panel {
            return Err(HostError::PanelRejected);
        }
        self.panels.push(name);
        Ok(())
    }

    fn remove_panel(&mut self, name: &'static str) {
        self.panels.retain(|p| *p != name);
    }

    fn attach(&mut self, device: &DsiDeviceConfig) -> Result<(), Self::Error> {
        if self.reject_attach {
            return Err(HostError::AttachRejected);
        }
        self.attached = Some(*device);
        Ok(())
    }

    fn detach(&mut self) -> Result<(), Self::Error> {
        if self.reject_detach {
            return Err(HostError::DetachRejected);
        }
        self.attached = None;
        Ok(())
    }
}

/// [`Observer`] collecting every event
#[derive(Default)]
pub struct EventLog {
    events: Vec<PanelEvent>,
}

impl EventLog {
    pub fn events(&self) -> &[PanelEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl Observer for EventLog {
    fn on_event(&mut self, event: PanelEvent) {
        self.events.push(event);
    }
}

pub type HarnessPanel = Rm69080<RecordingBus, RecordingDelay, EventLog>;

/// Install `env_logger` for tests; `RUST_LOG` picks the level
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Attached panel plus every collaborator it talks to
pub struct PanelHarness {
    panel: HarnessPanel,
    timeline: Timeline,
    host: FakeHost,
    modes: ProbedModes,
}

impl PanelHarness {
    /// Attach a panel whose delays return immediately
    pub fn new(config: Config) -> Self {
        Self::build(config, false)
    }

    /// Attach a panel whose delays block for real
    pub fn realtime(config: Config) -> Self {
        Self::build(config, true)
    }

    fn build(config: Config, realtime: bool) -> Self {
        init_logging();
        let timeline = Timeline::default();
        let delay = if realtime {
            RecordingDelay::realtime(timeline.clone())
        } else {
            RecordingDelay::new(timeline.clone())
        };
        let mut host = FakeHost::default();
        let panel = on_attach_observed(
            RecordingBus::new(timeline.clone()),
            delay,
            &mut host,
            config,
            EventLog::default(),
        )
        .expect("fake host accepts attach");

        Self {
            panel,
            timeline,
            host,
            modes: ProbedModes::new(),
        }
    }

    pub fn panel(&self) -> &HarnessPanel {
        &self.panel
    }

    pub fn panel_mut(&mut self) -> &mut HarnessPanel {
        &mut self.panel
    }

    pub fn state(&self) -> PanelState {
        self.panel.state()
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn host(&self) -> &FakeHost {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut FakeHost {
        &mut self.host
    }

    pub fn modes(&self) -> &ProbedModes {
        &self.modes
    }

    pub fn modes_mut(&mut self) -> &mut ProbedModes {
        &mut self.modes
    }

    pub fn events(&self) -> &[PanelEvent] {
        self.panel.observer().events()
    }

    /// Forget recorded steps and events
    pub fn clear_trace(&mut self) {
        self.timeline.clear();
        self.panel.observer_mut().clear();
    }

    pub fn prepare(&mut self) -> Result<(), Error<BusError>> {
        self.panel.prepare()
    }

    /// Prepare and return elapsed wall time
    pub fn prepare_timed(&mut self) -> (Result<(), Error<BusError>>, Duration) {
        let start = Instant::now();
        let result = self.prepare();
        (result, start.elapsed())
    }

    pub fn enable(&mut self) -> Result<(), Error<BusError>> {
        self.panel.enable()
    }

    pub fn disable(&mut self) -> Result<(), Error<BusError>> {
        self.panel.disable()
    }

    pub fn unprepare(&mut self) -> Result<(), Error<BusError>> {
        self.panel.unprepare()
    }

    pub fn get_modes(&mut self) -> Result<usize, Error<BusError>> {
        self.panel.get_modes(&mut self.modes)
    }

    /// Detach the panel; returns the host and the collected events
    pub fn detach(self) -> (FakeHost, Vec<PanelEvent>) {
        let mut host = self.host;
        let (_, _, log) = on_detach(self.panel, &mut host);
        (host, log.events)
    }
}
