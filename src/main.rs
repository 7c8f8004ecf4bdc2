//! IRK Capture Firmware — Main Entry Point
//!
//! Poses as a heart-rate peripheral, waits for a central to bond, reads the
//! peer's Identity Resolving Key out of the NimBLE bond store, reports it and
//! hangs up.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  NimbleAdapter          LogEventSink   Esp32Time   HardwareRng │
//! │  (Gap+Conn+BondStore)   (EventSink)    (Clock)     (Entropy)   │
//! │  Watchdog (KeepAlive)                                          │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            CaptureService (pure logic)                 │    │
//! │  │  Session · Advertising · Identity · Bond reader        │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  events: NimBLE callbacks ─▶ channel ─▶ ConnectionEventRouter  │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use log::{info, warn};

use irkcapture::adapters::entropy::HardwareRng;
use irkcapture::adapters::log_sink::LogEventSink;
use irkcapture::adapters::nimble::NimbleAdapter;
use irkcapture::adapters::time::Esp32TimeAdapter;
use irkcapture::app::service::CaptureService;
use irkcapture::ble::router::ConnectionEventRouter;
use irkcapture::config::CaptureConfig;
use irkcapture::drivers::watchdog::{WATCHDOG_TIMEOUT_MS, Watchdog};
use irkcapture::events;

/// Main loop period. Well below the capture gate so callbacks are drained
/// promptly.
const IDLE_DELAY_MS: u32 = 20;

fn load_config() -> CaptureConfig {
    let Some(json) = option_env!("IRK_CAPTURE_CONFIG") else {
        return CaptureConfig::default();
    };
    match CaptureConfig::from_json(json) {
        Ok(cfg) => {
            info!("Config: build-time override applied");
            cfg
        }
        Err(e) => {
            warn!("Config override rejected ({}), using defaults", e);
            CaptureConfig::default()
        }
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  IRK Capture v{}                     ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let mut watchdog = Watchdog::new(WATCHDOG_TIMEOUT_MS);

    // ── 2. Config ─────────────────────────────────────────────
    let config = load_config();

    // ── 3. Adapters ───────────────────────────────────────────
    let mut ble = NimbleAdapter::new(&config)
        .map_err(|e| anyhow::anyhow!("BLE init failed: {}", e))?;
    let clock = Esp32TimeAdapter::new();
    let mut rng = HardwareRng;
    let mut sink = LogEventSink::new();

    // ── 4. Capture service ────────────────────────────────────
    let mut app = CaptureService::new(config);
    app.init(&mut ble, &mut rng, &mut sink);
    for line in app.describe().to_string().lines() {
        info!("{}", line);
    }

    info!("System ready. Entering event loop.");

    // ── 5. Event loop ─────────────────────────────────────────
    loop {
        // Link callbacks first so tick() sees the current session.
        events::dispatch_ble_events(&mut ConnectionEventRouter::new(
            &mut app, &mut ble, &mut sink,
        ));

        while let Some(cmd) = events::take_command() {
            if let Err(e) = app.handle_command(cmd, &mut ble, &mut rng, &mut watchdog, &mut sink) {
                warn!("Command rejected: {}", e);
            }
        }

        app.tick(&mut ble, &clock, &mut sink);

        // Feed watchdog on every iteration.
        watchdog.feed();
        FreeRtos::delay_ms(IDLE_DELAY_MS);
    }
}
