use std::time::Duration;

use rm69080::command::{
    DCS_ENTER_SLEEP_MODE, DCS_EXIT_SLEEP_MODE, DCS_SET_DISPLAY_OFF, DCS_SET_DISPLAY_ON,
};
use rm69080::{
    Builder, Config, Error, Operation, PanelEvent, PanelState, PowerState, TeardownStep,
    RM69080_400X400_INIT,
};
use rm69080_harness::{BusError, Fault, PanelHarness, Step};

fn prepared_state() -> PanelState {
    PanelState {
        prepared: true,
        enabled: false,
    }
}

/// Steps a clean prepare of the stock panel must produce, in order.
fn stock_power_on() -> Vec<Step> {
    let mut steps: Vec<Step> = RM69080_400X400_INIT
        .iter()
        .map(|entry| match entry.delay_ms() {
            Some(ms) => Step::delay_ms(u64::from(ms)),
            None => Step::Generic(entry.register, entry.value),
        })
        .collect();
    steps.extend([
        Step::Dcs(DCS_EXIT_SLEEP_MODE),
        Step::delay_ms(40),
        Step::Dcs(DCS_SET_DISPLAY_ON),
        Step::delay_ms(20),
    ]);
    steps
}

#[test]
fn fresh_prepare_applies_whole_table_then_wakes_panel() {
    let mut harness = PanelHarness::new(Config::rm69080());

    harness.prepare().unwrap();

    let steps = harness.timeline().steps();
    assert_eq!(steps, stock_power_on());
    assert_eq!(steps.iter().filter(|s| matches!(s, Step::Generic(..))).count(), 12);
    assert_eq!(harness.timeline().total_delay(), Duration::from_millis(360));
    assert_eq!(harness.state(), prepared_state());
    assert_eq!(
        harness.events().last(),
        Some(&PanelEvent::Completed(Operation::Prepare))
    );
}

#[test]
fn third_table_write_failing_stops_prepare() {
    let mut harness = PanelHarness::new(Config::rm69080());
    harness.timeline().inject(Fault::GenericWrite(2));

    let err = harness.prepare().unwrap_err();

    assert_eq!(
        err,
        Error::Sequence {
            index: 2,
            source: BusError::GenericNak(2)
        }
    );
    assert_eq!(
        harness.timeline().steps(),
        vec![Step::Generic(0xFE, 0x05), Step::Generic(0x05, 0x00)]
    );
    assert!(!harness.state().prepared);
    assert_eq!(
        harness.events().last(),
        Some(&PanelEvent::Failed(Operation::Prepare))
    );
}

#[test]
fn failed_prepare_can_be_retried_from_scratch() {
    let mut harness = PanelHarness::new(Config::rm69080());
    harness.timeline().inject(Fault::Dcs(DCS_EXIT_SLEEP_MODE));
    assert_eq!(
        harness.prepare(),
        Err(Error::ExitSleep(BusError::DcsNak(DCS_EXIT_SLEEP_MODE)))
    );
    assert!(!harness.state().prepared);

    harness.timeline().clear_faults();
    harness.timeline().clear();
    harness.prepare().unwrap();

    assert_eq!(harness.timeline().steps(), stock_power_on());
    assert_eq!(harness.state(), prepared_state());
}

#[test]
fn display_on_failure_is_reported_as_partial() {
    let mut harness = PanelHarness::new(Config::rm69080());
    harness.timeline().inject(Fault::Dcs(DCS_SET_DISPLAY_ON));

    let err = harness.prepare().unwrap_err();

    assert_eq!(err, Error::DisplayOn(BusError::DcsNak(DCS_SET_DISPLAY_ON)));
    assert!(err.is_partial());
    assert!(!harness.state().prepared);
    // Sleep-exit went out and its settle time was honoured.
    let steps = harness.timeline().steps();
    assert_eq!(
        &steps[steps.len() - 2..],
        &[Step::Dcs(DCS_EXIT_SLEEP_MODE), Step::delay_ms(40)]
    );
}

#[test]
fn disable_unprepare_prepare_returns_to_first_prepare_state() {
    let mut harness = PanelHarness::new(Config::rm69080());
    harness.prepare().unwrap();
    harness.enable().unwrap();
    assert_eq!(harness.state().power(), PowerState::Enabled);

    harness.disable().unwrap();
    harness.unprepare().unwrap();
    assert_eq!(harness.state(), PanelState::default());

    harness.clear_trace();
    harness.prepare().unwrap();

    assert_eq!(harness.state(), prepared_state());
    assert_eq!(harness.timeline().steps(), stock_power_on());
}

#[test]
fn unprepare_sends_display_off_then_sleep() {
    let mut harness = PanelHarness::new(Config::rm69080());
    harness.prepare().unwrap();
    harness.clear_trace();

    harness.unprepare().unwrap();

    assert_eq!(
        harness.timeline().steps(),
        vec![Step::Dcs(DCS_SET_DISPLAY_OFF), Step::Dcs(DCS_ENTER_SLEEP_MODE)]
    );
    assert!(!harness.state().prepared);
}

#[test]
fn unprepare_survives_every_teardown_write_failing() {
    let mut harness = PanelHarness::new(Config::rm69080());
    harness.prepare().unwrap();
    harness.clear_trace();
    harness.timeline().inject(Fault::Dcs(DCS_SET_DISPLAY_OFF));
    harness.timeline().inject(Fault::Dcs(DCS_ENTER_SLEEP_MODE));

    assert_eq!(harness.unprepare(), Ok(()));

    assert!(!harness.state().prepared);
    assert!(harness.timeline().steps().is_empty());
    assert_eq!(
        harness.events(),
        &[
            PanelEvent::Entered(Operation::Unprepare),
            PanelEvent::TeardownFailed(TeardownStep::DisplayOff),
            PanelEvent::TeardownFailed(TeardownStep::EnterSleep),
            PanelEvent::Completed(Operation::Unprepare),
        ]
    );
}

#[test]
fn repeated_operations_do_not_touch_the_bus() {
    let mut harness = PanelHarness::new(Config::rm69080());
    harness.prepare().unwrap();
    harness.enable().unwrap();
    harness.clear_trace();

    harness.prepare().unwrap();
    harness.enable().unwrap();
    assert!(harness.timeline().steps().is_empty());
    assert_eq!(harness.state().power(), PowerState::Enabled);

    harness.disable().unwrap();
    harness.disable().unwrap();
    harness.unprepare().unwrap();
    harness.clear_trace();
    harness.unprepare().unwrap();

    assert!(harness.timeline().steps().is_empty());
    assert_eq!(
        harness.events(),
        &[
            PanelEvent::Entered(Operation::Unprepare),
            PanelEvent::Skipped(Operation::Unprepare),
        ]
    );
}

#[test]
fn strict_enable_rejects_unprepared_panel() {
    let mut harness = PanelHarness::new(Builder::new().strict_enable(true).build().unwrap());

    assert_eq!(harness.enable(), Err(Error::NotPrepared));
    assert_eq!(harness.state(), PanelState::default());

    harness.prepare().unwrap();
    harness.enable().unwrap();
    assert_eq!(harness.state().power(), PowerState::Enabled);
}

#[test]
fn permissive_enable_flags_out_of_order_call() {
    let mut harness = PanelHarness::new(Config::rm69080());

    harness.enable().unwrap();

    assert!(harness.state().enabled);
    assert!(harness.events().contains(&PanelEvent::EnabledUnprepared));
    assert!(harness.timeline().steps().is_empty());
}

#[test]
fn unprepare_puts_panel_back_to_sleep_after_display_on_failure() {
    let mut harness = PanelHarness::new(Config::rm69080());
    harness.timeline().inject(Fault::Dcs(DCS_SET_DISPLAY_ON));
    assert!(harness.prepare().unwrap_err().is_partial());
    assert!(harness.panel().is_powered());
    harness.timeline().clear_faults();
    harness.clear_trace();

    harness.unprepare().unwrap();

    assert_eq!(
        harness.timeline().steps(),
        vec![Step::Dcs(DCS_SET_DISPLAY_OFF), Step::Dcs(DCS_ENTER_SLEEP_MODE)]
    );
    assert_eq!(
        harness.events(),
        &[
            PanelEvent::Entered(Operation::Unprepare),
            PanelEvent::Completed(Operation::Unprepare),
        ]
    );
    assert!(!harness.panel().is_powered());

    harness.clear_trace();
    harness.prepare().unwrap();
    assert_eq!(harness.timeline().steps(), stock_power_on());
}

#[test]
fn failure_on_first_table_write_needs_no_teardown() {
    let mut harness = PanelHarness::new(Config::rm69080());
    harness.timeline().inject(Fault::GenericWrite(0));
    assert!(!harness.prepare().unwrap_err().is_partial());
    harness.clear_trace();

    harness.unprepare().unwrap();

    assert!(harness.timeline().steps().is_empty());
    assert_eq!(
        harness.events(),
        &[
            PanelEvent::Entered(Operation::Unprepare),
            PanelEvent::Skipped(Operation::Unprepare),
        ]
    );
}
