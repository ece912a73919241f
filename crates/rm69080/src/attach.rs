//! Attach and detach
//!
//! The host calls [`on_attach`] when it discovers a DSI device whose
//! compatible string passes [`matches_compatible`], and [`on_detach`] when the
//! device goes away. Both take the host as an explicit collaborator.

use embedded_hal::delay::DelayNs;

use crate::config::Config;
use crate::error::Error;
use crate::event::{NoopObserver, Observer, Operation, PanelEvent, TeardownStep};
use crate::interface::{DsiBus, DsiHost};
use crate::panel::Rm69080;

/// Name the panel is registered under
pub const DRIVER_NAME: &str = "kingtech-pv13900als20c";

/// Device-tree compatible strings served by this driver
pub const COMPATIBLE: &[&str] = &["kingtech,pv13900als20c", "raydium,rm69080"];

/// Whether `compatible` selects this driver
pub fn matches_compatible(compatible: &str) -> bool {
    COMPATIBLE.contains(&compatible)
}

/// Create the panel context and register it with `host`
///
/// The panel is published first, then the DSI device is attached with the
/// link settings from `config.device`. If the attach handshake fails the
/// panel is withdrawn again before the error is returned.
///
/// # Errors
///
/// [`Error::Attach`] with the host error from either registration step.
pub fn on_attach<B, D, H>(
    bus: B,
    delay: D,
    host: &mut H,
    config: Config,
) -> Result<Rm69080<B, D>, Error<H::Error>>
where
    B: DsiBus,
    D: DelayNs,
    H: DsiHost + ?Sized,
{
    on_attach_observed(bus, delay, host, config, NoopObserver)
}

/// Like [`on_attach`], routing events to `observer` from the start
pub fn on_attach_observed<B, D, H, O>(
    bus: B,
    delay: D,
    host: &mut H,
    config: Config,
    observer: O,
) -> Result<Rm69080<B, D, O>, Error<H::Error>>
where
    B: DsiBus,
    D: DelayNs,
    H: DsiHost + ?Sized,
    O: Observer,
{
    let mut panel = Rm69080::new(bus, delay, config).with_observer(observer);
    panel.enter(Operation::Attach);

    let device = panel.config().device;
    log::debug!(
        "lanes={} format={:?} bpp={} flags={:?}",
        device.lanes,
        device.format,
        device.format.bits_per_pixel(),
        device.mode_flags
    );

    if let Err(e) = host.add_panel(DRIVER_NAME) {
        log::error!("add panel failed: {:?}", e);
        panel
            .observer_mut()
            .on_event(PanelEvent::Failed(Operation::Attach));
        return Err(Error::Attach(e));
    }

    if let Err(e) = host.attach(&device) {
        log::error!("dsi attach failed: {:?}", e);
        host.remove_panel(DRIVER_NAME);
        panel
            .observer_mut()
            .on_event(PanelEvent::Failed(Operation::Attach));
        return Err(Error::Attach(e));
    }

    panel.complete(Operation::Attach);
    Ok(panel)
}

/// Detach the DSI device and withdraw the panel from `host`
///
/// A failed detach is logged and does not stop the panel from being
/// withdrawn. The panel is dropped; its bus, delay and observer are handed
/// back.
pub fn on_detach<B, D, O, H>(mut panel: Rm69080<B, D, O>, host: &mut H) -> (B, D, O)
where
    B: DsiBus,
    D: DelayNs,
    O: Observer,
    H: DsiHost + ?Sized,
{
    panel.enter(Operation::Detach);

    if panel.is_powered() {
        log::warn!("detach while powered");
    }

    if let Err(e) = host.detach() {
        log::warn!("dsi detach failed: {:?}", e);
        panel
            .observer_mut()
            .on_event(PanelEvent::TeardownFailed(TeardownStep::HostDetach));
    }
    host.remove_panel(DRIVER_NAME);

    panel.complete(Operation::Detach);
    panel.release()
}
