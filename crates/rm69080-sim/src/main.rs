//! Host simulator for the RM69080 panel lifecycle.
//!
//! Runs attach, get_modes, prepare, enable, disable, unprepare and detach
//! against the in-memory harness and prints what went over the link.

use clap::Parser;
use log::info;
use rm69080::{Builder, PanelEvent, DISPLAY_HEIGHT, DISPLAY_WIDTH};
use rm69080_harness::{Fault, PanelHarness, Step};

#[derive(Debug, Parser)]
#[command(about = "Walk an RM69080 panel through a full power cycle")]
struct Args {
    /// Fail the Nth (0-based) generic write during prepare
    #[arg(long, value_name = "N")]
    fail_at: Option<usize>,

    /// Block for the real delay durations
    #[arg(long)]
    realtime: bool,

    /// Reject enable on an unprepared panel
    #[arg(long)]
    strict: bool,

    /// Print lifecycle events as well as the wire trace
    #[arg(long)]
    events: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    let args = Args::parse();
    info!("simulating {}x{} panel", DISPLAY_WIDTH, DISPLAY_HEIGHT);

    let config = Builder::new().strict_enable(args.strict).build()?;
    let mut harness = if args.realtime {
        PanelHarness::realtime(config)
    } else {
        PanelHarness::new(config)
    };
    if let Some(n) = args.fail_at {
        harness.timeline().inject(Fault::GenericWrite(n));
    }

    let added = harness.get_modes()?;
    for mode in harness.modes().modes() {
        info!("mode {} @ {} Hz ({} added)", mode, mode.vrefresh(), added);
    }

    let (result, elapsed) = harness.prepare_timed();
    print_trace("prepare", &harness.timeline().steps());
    info!("prepare took {:?}", elapsed);
    if let Err(e) = result {
        eprintln!("prepare failed: {e}");
        if e.is_partial() {
            harness.clear_trace();
            harness.unprepare()?;
            print_trace("teardown", &harness.timeline().steps());
        }
        let (_, events) = harness.detach();
        if args.events {
            print_events(&events);
        }
        std::process::exit(1);
    }

    harness.clear_trace();
    harness.enable()?;
    harness.disable()?;
    harness.unprepare()?;
    print_trace("unprepare", &harness.timeline().steps());

    let (host, events) = harness.detach();
    if args.events {
        print_events(&events);
    }
    println!(
        "panels left registered: {}, link attached: {}",
        host.panels.len(),
        host.attached.is_some()
    );

    Ok(())
}

fn print_trace(label: &str, steps: &[Step]) {
    println!("{label}:");
    for step in steps {
        match step {
            Step::Generic(reg, val) => println!("  gen  {reg:#04x} {val:#04x}"),
            Step::Dcs(cmd) => println!("  dcs  {cmd:#04x}"),
            Step::Delay(d) => println!("  wait {} ms", d.as_millis()),
        }
    }
}

fn print_events(events: &[PanelEvent]) {
    println!("events:");
    for event in events {
        println!("  {event:?}");
    }
}
