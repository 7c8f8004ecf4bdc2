//! Capture service — the hexagonal core.
//!
//! [`CaptureService`] owns the capture [`Session`], the advertising
//! controller and the identity manager. It exposes a hardware-agnostic API;
//! all BLE I/O flows through port traits injected at call sites.
//!
//! ```text
//!   BlePort ──▶ ┌────────────────────────────┐ ──▶ EventSink
//!               │       CaptureService       │
//!  ClockPort ──▶│ Session · Advertising · ID │◀── AppCommand
//!               └────────────────────────────┘
//!                  ▲ ConnectionEvents (router)
//! ```
//!
//! Per tick (gated to once per `loop_interval_ms`):
//! 1. no peer connected → idle;
//! 2. heart-rate notification if `notify_interval_ms` has passed;
//! 3. poll the bond store; on an IRK publish it, disconnect, clear the handle.

use core::fmt;

use log::{debug, info, warn};

use crate::ble::address::{CaptureResult, DeviceIdentity};
use crate::ble::advertising::{AdvertisingController, AdvertisingDescriptor};
use crate::ble::bond::try_get_irk;
use crate::ble::gatt::heart_rate_payload;
use crate::ble::identity::IdentityManager;
use crate::config::{BleName, CaptureConfig, parse_ble_name};
use crate::error::{self, NameError};
use crate::timing::{IntervalGate, keep_alive_wait};

use super::commands::AppCommand;
use super::events::AppEvent;
use super::ports::{BlePort, ClockPort, EntropyPort, EventSink, GapPort, KeepAlivePort};

// ───────────────────────────────────────────────────────────────
// Session
// ───────────────────────────────────────────────────────────────

/// Mutable capture state shared by the loop, the router and the commands.
///
/// Exactly one peer is tracked at a time.
#[derive(Debug)]
pub struct Session {
    /// Live connection being polled; `None` when idle or after a capture.
    pub conn_handle: Option<u16>,
    /// Last authentication-complete observation for that connection.
    pub authenticated: bool,
    pub ble_name: BleName,
    pub last_capture: Option<CaptureResult>,
    loop_gate: IntervalGate,
    notify_gate: IntervalGate,
}

impl Session {
    fn new(config: &CaptureConfig) -> Self {
        Self {
            conn_handle: None,
            authenticated: false,
            ble_name: config.ble_name.clone(),
            last_capture: None,
            loop_gate: IntervalGate::new(config.loop_interval_ms),
            notify_gate: IntervalGate::new(config.notify_interval_ms),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// CaptureService
// ───────────────────────────────────────────────────────────────

pub struct CaptureService {
    config: CaptureConfig,
    session: Session,
    advertising: AdvertisingController,
    identity: IdentityManager,
}

impl CaptureService {
    /// Construct the service from configuration.
    ///
    /// Touches no hardware — call [`init`](Self::init) next.
    pub fn new(config: CaptureConfig) -> Self {
        let session = Session::new(&config);
        Self {
            config,
            session,
            advertising: AdvertisingController::new(),
            identity: IdentityManager::new(),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Install a fresh identity and, if configured, start advertising.
    pub fn init(
        &mut self,
        ble: &mut impl GapPort,
        rng: &mut impl EntropyPort,
        sink: &mut impl EventSink,
    ) {
        info!("Setting up IRK capture...");
        if let Err(e) = self.identity.generate_and_install(ble, rng, sink) {
            warn!("Random address not installed ({}), using controller default", e);
        }

        self.advertising
            .set_operator_enabled(self.config.start_on_boot);
        if self.config.start_on_boot {
            self.start_advertising(ble, sink);
        }

        sink.emit(&AppEvent::Started {
            name: self.session.ble_name.clone(),
            identity: self.identity.current(),
            advertising: self.advertising.is_advertising(),
        });
        info!(
            "IRK capture ready - advertising as '{}'",
            self.session.ble_name
        );
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one capture pass. Cheap to call far more often than
    /// `loop_interval_ms`; extra calls return immediately.
    pub fn tick(
        &mut self,
        ble: &mut impl BlePort,
        clock: &impl ClockPort,
        sink: &mut impl EventSink,
    ) {
        let now = clock.now_ms();
        if !self.session.loop_gate.try_pass(now) {
            return;
        }

        if ble.connected_count() == 0 {
            return;
        }

        // Keep the link busy so the peer carries on bonding.
        if self.session.notify_gate.try_pass_after(now) {
            let payload = heart_rate_payload(self.config.heart_rate_flags, clock.now_us());
            if let Err(e) = ble.notify_heart_rate(&payload) {
                debug!("Heart-rate notify skipped: {}", e);
            }
        }

        let Some(handle) = self.session.conn_handle else {
            return;
        };
        let Some(result) = try_get_irk(&*ble, handle) else {
            return;
        };

        info!("");
        info!("*** IRK CAPTURED ***");
        info!("Address: {}", result.address);
        info!("IRK: {}", result.irk_label());
        info!("");

        sink.emit(&AppEvent::IrkCaptured {
            irk: result.irk_label(),
            address: result.address.clone(),
        });

        if let Err(e) = ble.disconnect(handle) {
            warn!("Disconnect after capture failed: {}", e);
        }
        self.session.conn_handle = None;
        self.session.authenticated = false;
        self.session.last_capture = Some(result);
    }

    // ── Command handling ──────────────────────────────────────

    /// Process a command from one of the user-facing entities.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        ble: &mut impl GapPort,
        rng: &mut impl EntropyPort,
        wdt: &mut impl KeepAlivePort,
        sink: &mut impl EventSink,
    ) -> error::Result<()> {
        match cmd {
            AppCommand::SetAdvertising(enabled) => {
                self.set_advertising(enabled, ble, sink);
            }
            AppCommand::RefreshMac => {
                self.refresh_mac(ble, rng, wdt, sink);
            }
            AppCommand::SetBleName(name) => {
                self.set_ble_name(&name, ble, wdt, sink)?;
            }
        }
        Ok(())
    }

    /// Advertising switch.
    pub fn set_advertising(
        &mut self,
        enabled: bool,
        ble: &mut impl GapPort,
        sink: &mut impl EventSink,
    ) {
        self.advertising.set_operator_enabled(enabled);
        if enabled {
            self.start_advertising(ble, sink);
        } else {
            self.advertising.stop(ble, sink);
        }
    }

    /// Stop advertising, install a new address, advertise again.
    ///
    /// The settle waits around the address change feed the watchdog.
    /// Open links are not affected by the new address.
    pub fn refresh_mac(
        &mut self,
        ble: &mut impl GapPort,
        rng: &mut impl EntropyPort,
        wdt: &mut impl KeepAlivePort,
        sink: &mut impl EventSink,
    ) {
        info!("Refreshing MAC address...");
        self.advertising.set_operator_enabled(true);
        self.advertising.stop(ble, sink);
        keep_alive_wait(wdt, self.config.settle_slice_ms, 1);

        if self.identity.generate_and_install(ble, rng, sink).is_err() {
            warn!("Keeping previous MAC address");
        }

        keep_alive_wait(wdt, self.config.settle_slice_ms, 1);
        self.start_advertising(ble, sink);
    }

    /// Rename the device. Restarts advertising if it is running so the new
    /// name goes on air; otherwise it applies to the next start.
    pub fn set_ble_name(
        &mut self,
        name: &str,
        ble: &mut impl GapPort,
        wdt: &mut impl KeepAlivePort,
        sink: &mut impl EventSink,
    ) -> Result<(), NameError> {
        let name = parse_ble_name(name).inspect_err(|e| {
            warn!("BLE name rejected: {}", e);
        })?;
        info!("BLE name changed to: {}", name);
        self.session.ble_name = name.clone();
        sink.emit(&AppEvent::NameChanged(name));

        if self.advertising.is_advertising() {
            self.advertising.stop(ble, sink);
            keep_alive_wait(wdt, self.config.settle_slice_ms, 1);
            self.start_advertising(ble, sink);
        }
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn is_advertising(&self) -> bool {
        self.advertising.is_advertising()
    }

    pub fn connection_handle(&self) -> Option<u16> {
        self.session.conn_handle
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.authenticated
    }

    pub fn ble_name(&self) -> &str {
        &self.session.ble_name
    }

    pub fn identity(&self) -> Option<DeviceIdentity> {
        self.identity.current()
    }

    /// Most recent capture since boot.
    pub fn last_capture(&self) -> Option<&CaptureResult> {
        self.session.last_capture.as_ref()
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Diagnostic dump, rendered by `Display`.
    pub fn describe(&self) -> Description<'_> {
        Description {
            name: &self.session.ble_name,
            advertising: self.advertising.is_advertising(),
            identity: self.identity.current(),
        }
    }

    // ── Internal (shared with the connection router) ──────────

    pub(crate) fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub(crate) fn advertising_descriptor(&self) -> AdvertisingDescriptor {
        AdvertisingDescriptor::heart_rate(&self.session.ble_name, &self.config)
    }

    /// Re-arm after link activity, unless switched off by the operator.
    pub(crate) fn rearm_advertising(&mut self, ble: &mut impl GapPort, sink: &mut impl EventSink) {
        let descriptor = self.advertising_descriptor();
        self.advertising.rearm(ble, &descriptor, sink);
    }

    fn start_advertising(&mut self, ble: &mut impl GapPort, sink: &mut impl EventSink) {
        let descriptor = self.advertising_descriptor();
        self.advertising.start(ble, &descriptor, sink);
    }
}

/// Read-only summary for the diagnostics log.
pub struct Description<'a> {
    name: &'a str,
    advertising: bool,
    identity: Option<DeviceIdentity>,
}

impl fmt::Display for Description<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "IRK Capture:")?;
        writeln!(f, "  BLE Name: {}", self.name)?;
        match self.identity {
            Some(id) => writeln!(f, "  MAC: {}", id)?,
            None => writeln!(f, "  MAC: (controller default)")?,
        }
        write!(
            f,
            "  Advertising: {}",
            if self.advertising { "YES" } else { "NO" }
        )
    }
}
