//! Panel lifecycle
//!
//! [`Rm69080`] tracks whether the panel is prepared (powered, out of sleep,
//! display on) and enabled (feeding composited frames), and drives the bus at
//! each transition:
//!
//! ```text
//! [Unprepared] --prepare--> [Prepared] --enable--> [Enabled]
//!      ^                      |    ^                  |
//!      +------unprepare-------+    +-----disable------+
//! ```
//!
//! Every transition is idempotent: calling an operation when the panel is
//! already in its target state succeeds without touching the bus.
//!
//! Power-up is strict: `prepare` stops at the first failed write and leaves
//! the panel unprepared. If some of the ritual already reached the panel
//! (see [`Error::is_partial`]) the panel is remembered as powered, and
//! `unprepare` sends the teardown writes even though it never became
//! prepared. Power-down is best effort: `unprepare` logs failed writes and
//! always ends unpowered, so `prepare` can be retried from scratch.
//!
//! `enable` does not require `prepare` unless [`Builder::strict_enable`] is
//! set. Callers are expected to enable only a prepared panel; a permissive
//! enable on an unprepared panel is logged and reported as
//! [`PanelEvent::EnabledUnprepared`].
//!
//! [`Builder::strict_enable`]: crate::config::Builder::strict_enable

use embedded_hal::delay::DelayNs;

use crate::attach::DRIVER_NAME;
use crate::config::Config;
use crate::error::Error;
use crate::event::{NoopObserver, Observer, Operation, PanelEvent, TeardownStep};
use crate::interface::DsiBus;
use crate::mode::{DisplayMode, ModeRegistry};
use crate::sequencer;

/// Power state flags of one panel
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PanelState {
    /// Power-on ritual completed and panel out of sleep
    pub prepared: bool,
    /// Output turned on for composition
    pub enabled: bool,
}

/// Coarse view of [`PanelState`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PowerState {
    Unprepared,
    Prepared,
    Enabled,
}

impl PanelState {
    pub fn power(&self) -> PowerState {
        match (self.prepared, self.enabled) {
            (_, true) => PowerState::Enabled,
            (true, false) => PowerState::Prepared,
            (false, false) => PowerState::Unprepared,
        }
    }
}

/// RM69080 panel driver
///
/// Generic over:
/// - `B` — the [`DsiBus`] link (pass `&mut bus` to keep the bus owned elsewhere)
/// - `D` — an [`embedded_hal::delay::DelayNs`] used for the mandatory waits
/// - `O` — an [`Observer`] receiving [`PanelEvent`]s
pub struct Rm69080<B, D, O = NoopObserver> {
    /// DSI link
    bus: B,
    /// Blocking delay provider
    delay: D,
    /// Panel configuration
    config: Config,
    /// Prepared/enabled flags
    state: PanelState,
    /// A failed prepare left the panel partly powered
    partial: bool,
    /// Event sink
    observer: O,
}

impl<B, D> Rm69080<B, D>
where
    B: DsiBus,
    D: DelayNs,
{
    /// Create an unprepared, disabled panel
    pub fn new(bus: B, delay: D, config: Config) -> Self {
        Self {
            bus,
            delay,
            config,
            state: PanelState::default(),
            partial: false,
            observer: NoopObserver,
        }
    }
}

impl<B, D, O> Rm69080<B, D, O>
where
    B: DsiBus,
    D: DelayNs,
    O: Observer,
{
    /// Route lifecycle events to `observer`
    pub fn with_observer<O2: Observer>(self, observer: O2) -> Rm69080<B, D, O2> {
        Rm69080 {
            bus: self.bus,
            delay: self.delay,
            config: self.config,
            state: self.state,
            partial: self.partial,
            observer,
        }
    }

    /// Power the panel up
    ///
    /// Runs the vendor command table, then exit-sleep, waits, display-on and
    /// waits again. Blocks for the whole ritual (over 300 ms with the stock
    /// table).
    ///
    /// # Errors
    ///
    /// - [`Error::Sequence`] when a table write fails
    /// - [`Error::ExitSleep`] when exit-sleep fails
    /// - [`Error::DisplayOn`] when display-on fails after the panel woke up
    ///
    /// The panel stays unprepared in every case. When the error
    /// [`is_partial`](Error::is_partial), call `unprepare` before retrying.
    pub fn prepare(&mut self) -> Result<(), Error<B::Error>> {
        self.enter(Operation::Prepare);

        if self.state.prepared {
            self.skip(Operation::Prepare);
            return Ok(());
        }

        match self.power_on() {
            Ok(()) => {
                self.state.prepared = true;
                self.partial = false;
                self.complete(Operation::Prepare);
                Ok(())
            }
            Err(e) => {
                self.partial |= e.is_partial();
                self.observer.on_event(PanelEvent::Failed(Operation::Prepare));
                Err(e)
            }
        }
    }

    fn power_on(&mut self) -> Result<(), Error<B::Error>> {
        sequencer::run_observed(
            &mut self.bus,
            &mut self.delay,
            self.config.init_sequence,
            &mut self.observer,
        )?;

        if let Err(e) = self.bus.exit_sleep_mode() {
            log::error!("exit_sleep_mode() failed: {:?}", e);
            return Err(Error::ExitSleep(e));
        }
        self.delay.delay_ms(self.config.exit_sleep_delay_ms);

        if let Err(e) = self.bus.set_display_on() {
            log::error!("set_display_on() failed: {:?}", e);
            return Err(Error::DisplayOn(e));
        }
        self.delay.delay_ms(self.config.display_on_delay_ms);

        Ok(())
    }

    /// Turn output on for composition
    ///
    /// # Errors
    ///
    /// [`Error::NotPrepared`] when the panel is unprepared and strict enable
    /// is configured. Never fails otherwise.
    pub fn enable(&mut self) -> Result<(), Error<B::Error>> {
        self.enter(Operation::Enable);

        if self.state.enabled {
            self.skip(Operation::Enable);
            return Ok(());
        }

        if !self.state.prepared {
            if self.config.strict_enable {
                log::warn!("enable rejected: panel not prepared");
                self.observer.on_event(PanelEvent::Failed(Operation::Enable));
                return Err(Error::NotPrepared);
            }
            log::warn!("enable on unprepared panel");
            self.observer.on_event(PanelEvent::EnabledUnprepared);
        }

        self.state.enabled = true;
        self.complete(Operation::Enable);
        Ok(())
    }

    /// Stop feeding the panel. Never fails.
    pub fn disable(&mut self) -> Result<(), Error<B::Error>> {
        self.enter(Operation::Disable);

        if !self.state.enabled {
            self.skip(Operation::Disable);
            return Ok(());
        }

        self.state.enabled = false;
        self.complete(Operation::Disable);
        Ok(())
    }

    /// Power the panel down
    ///
    /// Sends display-off and enter-sleep. Failures of either are logged and
    /// the panel is marked unprepared regardless. A panel still enabled is
    /// disabled as well. A panel left partly powered by a failed `prepare`
    /// is torn down the same way. Never fails.
    pub fn unprepare(&mut self) -> Result<(), Error<B::Error>> {
        self.enter(Operation::Unprepare);

        if !self.is_powered() {
            self.skip(Operation::Unprepare);
            return Ok(());
        }

        if !self.state.prepared {
            log::warn!("tearing down partly powered panel");
        }

        if self.state.enabled {
            log::warn!("unprepare while enabled");
            self.state.enabled = false;
        }

        if let Err(e) = self.bus.set_display_off() {
            log::warn!("failed to set display off: {:?}", e);
            self.observer
                .on_event(PanelEvent::TeardownFailed(TeardownStep::DisplayOff));
        }

        if let Err(e) = self.bus.enter_sleep_mode() {
            log::warn!("failed to enter sleep mode: {:?}", e);
            self.observer
                .on_event(PanelEvent::TeardownFailed(TeardownStep::EnterSleep));
        }

        self.state.prepared = false;
        self.partial = false;
        self.complete(Operation::Unprepare);
        Ok(())
    }

    /// Hand the native mode to `registry`
    ///
    /// Returns the number of modes added, always 1.
    ///
    /// # Errors
    ///
    /// [`Error::Allocation`] when the registry cannot store the mode.
    pub fn get_modes<R>(&mut self, registry: &mut R) -> Result<usize, Error<B::Error>>
    where
        R: ModeRegistry + ?Sized,
    {
        self.enter(Operation::GetModes);

        let mode = self.config.mode;
        if let Err(e) = registry.add_probed_mode(&mode) {
            log::error!("failed to add mode {}: {:?}", mode, e);
            self.observer
                .on_event(PanelEvent::Failed(Operation::GetModes));
            return Err(Error::Allocation);
        }

        let vrefresh = mode.vrefresh();
        log::info!("add mode {}x{}@{}", mode.hdisplay, mode.vdisplay, vrefresh);
        registry.set_physical_size(mode.physical);

        self.observer.on_event(PanelEvent::ModeAdded {
            hdisplay: mode.hdisplay,
            vdisplay: mode.vdisplay,
            vrefresh,
        });
        self.complete(Operation::GetModes);
        Ok(1)
    }

    pub(crate) fn enter(&mut self, op: Operation) {
        log::info!("{}:{}", DRIVER_NAME, op.name());
        self.observer.on_event(PanelEvent::Entered(op));
    }

    pub(crate) fn skip(&mut self, op: Operation) {
        log::debug!("{}: already done", op.name());
        self.observer.on_event(PanelEvent::Skipped(op));
    }

    pub(crate) fn complete(&mut self, op: Operation) {
        self.observer.on_event(PanelEvent::Completed(op));
    }
}

impl<B, D, O> Rm69080<B, D, O> {
    /// Current prepared/enabled flags
    pub fn state(&self) -> PanelState {
        self.state
    }

    pub fn is_prepared(&self) -> bool {
        self.state.prepared
    }

    pub fn is_enabled(&self) -> bool {
        self.state.enabled
    }

    /// Prepared, or left partly powered by a failed `prepare`
    pub fn is_powered(&self) -> bool {
        self.state.prepared || self.partial
    }

    /// Native display mode
    pub fn mode(&self) -> &DisplayMode {
        &self.config.mode
    }

    /// Access the underlying configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    /// Give back the bus, delay and observer
    pub fn release(self) -> (B, D, O) {
        (self.bus, self.delay, self.observer)
    }

    #[cfg(test)]
    pub(crate) fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Builder;

    #[derive(Default)]
    struct Bus {
        generic: Vec<[u8; 2]>,
        dcs: Vec<u8>,
        fail_dcs: Option<u8>,
        fail_generic_at: Option<usize>,
    }

    impl Bus {
        fn writes(&self) -> usize {
            self.generic.len() + self.dcs.len()
        }
    }

    impl DsiBus for Bus {
        type Error = u8;

        fn generic_write(&mut self, payload: &[u8]) -> Result<(), u8> {
            if self.fail_generic_at == Some(self.generic.len()) {
                return Err(payload[0]);
            }
            self.generic.push([payload[0], payload[1]]);
            Ok(())
        }

        fn dcs_write(&mut self, payload: &[u8]) -> Result<(), u8> {
            if self.fail_dcs == Some(payload[0]) {
                return Err(payload[0]);
            }
            self.dcs.push(payload[0]);
            Ok(())
        }
    }

    #[derive(Default)]
    struct Delay {
        waits_ms: Vec<u32>,
    }

    impl DelayNs for Delay {
        fn delay_ns(&mut self, ns: u32) {
            self.waits_ms.push(ns / 1_000_000);
        }

        fn delay_ms(&mut self, ms: u32) {
            self.waits_ms.push(ms);
        }
    }

    #[derive(Default)]
    struct Events(Vec<PanelEvent>);

    impl Observer for Events {
        fn on_event(&mut self, event: PanelEvent) {
            self.0.push(event);
        }
    }

    fn panel(bus: &mut Bus) -> Rm69080<&mut Bus, Delay, Events> {
        Rm69080::new(bus, Delay::default(), Config::rm69080()).with_observer(Events::default())
    }

    #[test]
    fn prepare_runs_table_then_dcs_with_settle_waits() {
        let mut bus = Bus::default();
        let mut panel = panel(&mut bus);

        panel.prepare().unwrap();

        assert_eq!(panel.state().power(), PowerState::Prepared);
        let (_, delay, _) = panel.release();
        assert_eq!(delay.waits_ms, vec![150, 150, 40, 20]);
        assert_eq!(bus.generic.len(), 12);
        assert_eq!(bus.dcs, vec![0x11, 0x29]);
    }

    #[test]
    fn second_prepare_touches_nothing() {
        let mut bus = Bus::default();
        let mut panel = panel(&mut bus);
        panel.prepare().unwrap();
        panel.prepare().unwrap();
        assert!(panel.is_prepared());
        assert_eq!(
            panel.observer().0.last(),
            Some(&PanelEvent::Skipped(Operation::Prepare))
        );
        drop(panel);
        assert_eq!(bus.writes(), 14);
    }

    #[test]
    fn exit_sleep_failure_leaves_panel_unprepared() {
        let mut bus = Bus {
            fail_dcs: Some(0x11),
            ..Default::default()
        };
        let mut panel = panel(&mut bus);
        assert_eq!(panel.prepare(), Err(Error::ExitSleep(0x11)));
        assert!(!panel.is_prepared());
        drop(panel);
        assert!(bus.dcs.is_empty());
    }

    #[test]
    fn display_on_failure_is_distinct_and_unprepared() {
        let mut bus = Bus {
            fail_dcs: Some(0x29),
            ..Default::default()
        };
        let mut panel = panel(&mut bus);
        let err = panel.prepare().unwrap_err();
        assert_eq!(err, Error::DisplayOn(0x29));
        assert!(err.is_partial());
        assert!(!panel.is_prepared());
    }

    #[test]
    fn table_failure_aborts_prepare() {
        let mut bus = Bus {
            fail_generic_at: Some(2),
            ..Default::default()
        };
        let mut panel = panel(&mut bus);
        assert!(matches!(
            panel.prepare(),
            Err(Error::Sequence { index: 2, .. })
        ));
        assert!(!panel.is_prepared());
        drop(panel);
        assert_eq!(bus.generic.len(), 2);
        assert!(bus.dcs.is_empty());
    }

    #[test]
    fn permissive_enable_is_reported() {
        let mut bus = Bus::default();
        let mut panel = panel(&mut bus);
        panel.enable().unwrap();
        assert!(panel.is_enabled());
        assert!(panel.observer().0.contains(&PanelEvent::EnabledUnprepared));
    }

    #[test]
    fn strict_enable_requires_prepare() {
        let mut bus = Bus::default();
        let config = Builder::new().strict_enable(true).build().unwrap();
        let mut panel = Rm69080::new(&mut bus, Delay::default(), config);
        assert_eq!(panel.enable(), Err(Error::NotPrepared));
        assert!(!panel.is_enabled());
        panel.prepare().unwrap();
        panel.enable().unwrap();
        assert_eq!(panel.state().power(), PowerState::Enabled);
    }

    #[test]
    fn unprepare_is_best_effort() {
        let mut bus = Bus::default();
        let mut panel = panel(&mut bus);
        panel.prepare().unwrap();
        panel.bus_mut().fail_dcs = Some(0x28);

        panel.unprepare().unwrap();

        assert!(!panel.is_prepared());
        assert!(
            panel
                .observer()
                .0
                .contains(&PanelEvent::TeardownFailed(TeardownStep::DisplayOff))
        );
        drop(panel);
        assert_eq!(bus.dcs, vec![0x11, 0x29, 0x10]);
    }

    #[test]
    fn partial_prepare_is_torn_down_by_unprepare() {
        let mut bus = Bus {
            fail_dcs: Some(0x29),
            ..Default::default()
        };
        let mut panel = panel(&mut bus);
        assert!(panel.prepare().unwrap_err().is_partial());
        assert!(!panel.is_prepared());
        assert!(panel.is_powered());

        panel.bus_mut().fail_dcs = None;
        panel.unprepare().unwrap();
        assert!(!panel.is_powered());
        panel.unprepare().unwrap();

        drop(panel);
        assert_eq!(bus.dcs, vec![0x11, 0x28, 0x10]);
    }

    #[test]
    fn first_entry_failure_leaves_nothing_to_tear_down() {
        let mut bus = Bus {
            fail_generic_at: Some(0),
            ..Default::default()
        };
        let mut panel = panel(&mut bus);
        assert!(!panel.prepare().unwrap_err().is_partial());
        assert!(!panel.is_powered());
        panel.unprepare().unwrap();
        drop(panel);
        assert!(bus.dcs.is_empty());
    }

    #[test]
    fn unprepare_also_disables() {
        let mut bus = Bus::default();
        let mut panel = panel(&mut bus);
        panel.prepare().unwrap();
        panel.enable().unwrap();
        panel.unprepare().unwrap();
        assert_eq!(panel.state(), PanelState::default());
    }
}
