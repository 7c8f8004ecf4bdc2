//! Integration tests for the connect → bond → capture → hang-up pipeline.
//!
//! Link notifications are delivered straight through the
//! `ConnectionEventRouter`, the same path the main loop uses after
//! draining the callback queue.

use irkcapture::app::events::AppEvent;
use irkcapture::app::ports::ConnectionEvents;
use irkcapture::app::service::CaptureService;
use irkcapture::ble::bond::BondRecord;
use irkcapture::ble::router::ConnectionEventRouter;
use irkcapture::config::CaptureConfig;

use crate::mock_ble::{
    MockBle, MockClock, MockRng, PEER_ID, PEER_OTA, RecordingSink, counting_irk,
};

const IRK_LABEL: &str = "irk:0f0e0d0c0b0a09080706050403020100";
const PEER_MAC: &str = "CC:BB:AA:03:02:01";

fn make_app() -> (CaptureService, MockBle, RecordingSink) {
    let mut app = CaptureService::new(CaptureConfig::default());
    let mut ble = MockBle::new();
    let mut sink = RecordingSink::new();
    app.init(&mut ble, &mut MockRng(0), &mut sink);
    (app, ble, sink)
}

fn connect(app: &mut CaptureService, ble: &mut MockBle, sink: &mut RecordingSink, handle: u16) {
    ble.connect(handle, PEER_OTA, PEER_ID);
    ConnectionEventRouter::new(app, ble, sink).on_connect(handle);
}

// ── Full capture scenario ─────────────────────────────────────

#[test]
fn bonded_peer_irk_is_published_and_link_torn_down() {
    let (mut app, mut ble, mut sink) = make_app();
    let clock = MockClock::at(1_000);

    connect(&mut app, &mut ble, &mut sink, 7);
    ConnectionEventRouter::new(&mut app, &mut ble, &mut sink).on_auth_complete(true);
    assert_eq!(app.connection_handle(), Some(7));
    assert!(app.is_authenticated());

    // First tick: no bond record yet.
    app.tick(&mut ble, &clock, &mut sink);
    assert!(app.is_advertising());
    assert!(sink.captures().is_empty());
    assert_eq!(app.connection_handle(), Some(7));

    // Keys land in the store; next tick captures.
    ble.store_bond(BondRecord::with_irk(PEER_ID, counting_irk()));
    clock.advance(500);
    app.tick(&mut ble, &clock, &mut sink);

    assert_eq!(
        sink.captures(),
        vec![(IRK_LABEL.to_owned(), PEER_MAC.to_owned())]
    );
    assert_eq!(ble.disconnects(), vec![7]);
    assert_eq!(app.connection_handle(), None);
    assert!(!app.is_authenticated());

    let last = app.last_capture().expect("capture retained");
    assert_eq!(last.irk_label().as_str(), IRK_LABEL);
    assert_eq!(last.address.as_str(), PEER_MAC);
}

#[test]
fn encryption_only_bond_is_polled_until_irk_arrives() {
    let (mut app, mut ble, mut sink) = make_app();
    let clock = MockClock::at(1_000);
    connect(&mut app, &mut ble, &mut sink, 3);
    ble.store_bond(BondRecord::encryption_only(PEER_ID));

    for _ in 0..5 {
        app.tick(&mut ble, &clock, &mut sink);
        clock.advance(500);
    }
    assert!(sink.captures().is_empty());
    assert_eq!(ble.bond_reads.get(), 5);
    assert!(ble.disconnects().is_empty());

    ble.store_bond(BondRecord::with_irk(PEER_ID, [0xAB; 16]));
    app.tick(&mut ble, &clock, &mut sink);
    assert_eq!(sink.captures().len(), 1);
    assert_eq!(sink.captures()[0].0, format!("irk:{}", "ab".repeat(16)));
}

#[test]
fn stale_handle_is_not_an_error() {
    let (mut app, mut ble, mut sink) = make_app();
    let clock = MockClock::at(1_000);
    connect(&mut app, &mut ble, &mut sink, 7);

    // Peer vanished without a disconnect notification yet, while another
    // link keeps the stack busy.
    ble.links.clear();
    ble.connect(9, PEER_OTA, PEER_ID);
    ble.store_bond(BondRecord::with_irk(PEER_ID, counting_irk()));

    app.tick(&mut ble, &clock, &mut sink);
    assert!(sink.captures().is_empty());
    assert_eq!(ble.bond_reads.get(), 0);
    assert_eq!(app.connection_handle(), Some(7));
}

// ── Tick gating ───────────────────────────────────────────────

#[test]
fn tick_runs_at_most_once_per_loop_interval() {
    let (mut app, mut ble, mut sink) = make_app();
    let clock = MockClock::at(1_000);
    connect(&mut app, &mut ble, &mut sink, 1);

    app.tick(&mut ble, &clock, &mut sink);
    for _ in 0..10 {
        clock.advance(40);
        app.tick(&mut ble, &clock, &mut sink);
    }
    assert_eq!(ble.bond_reads.get(), 1, "400 ms after the first pass");

    clock.advance(100);
    app.tick(&mut ble, &clock, &mut sink);
    assert_eq!(ble.bond_reads.get(), 2);
}

#[test]
fn idle_tick_touches_nothing() {
    let (mut app, mut ble, mut sink) = make_app();
    let clock = MockClock::at(5_000);
    ble.clear();
    app.tick(&mut ble, &clock, &mut sink);
    assert!(ble.calls.is_empty());
    assert_eq!(ble.bond_reads.get(), 0);
}

#[test]
fn heart_rate_notifications_carry_flags_and_clock_byte() {
    let (mut app, mut ble, mut sink) = make_app();
    let clock = MockClock::at(1_000);
    connect(&mut app, &mut ble, &mut sink, 1);
    clock.us.set(0x1234_5678);

    app.tick(&mut ble, &clock, &mut sink);
    assert_eq!(ble.notifications(), vec![[0x06, 0x78]]);

    clock.advance(500);
    app.tick(&mut ble, &clock, &mut sink);
    assert_eq!(ble.notifications().len(), 2);
}

#[test]
fn gate_survives_clock_wraparound() {
    let (mut app, mut ble, mut sink) = make_app();
    let clock = MockClock::at(u32::MAX - 100);
    connect(&mut app, &mut ble, &mut sink, 1);

    app.tick(&mut ble, &clock, &mut sink);
    assert_eq!(ble.bond_reads.get(), 1);

    clock.advance(600);
    app.tick(&mut ble, &clock, &mut sink);
    assert_eq!(ble.bond_reads.get(), 2);
}

// ── Repeat captures ───────────────────────────────────────────

#[test]
fn second_peer_after_capture_is_captured_too() {
    let (mut app, mut ble, mut sink) = make_app();
    let clock = MockClock::at(1_000);
    ble.store_bond(BondRecord::with_irk(PEER_ID, counting_irk()));

    connect(&mut app, &mut ble, &mut sink, 1);
    app.tick(&mut ble, &clock, &mut sink);
    ConnectionEventRouter::new(&mut app, &mut ble, &mut sink).on_disconnect(1);

    clock.advance(500);
    connect(&mut app, &mut ble, &mut sink, 2);
    app.tick(&mut ble, &clock, &mut sink);

    assert_eq!(sink.captures().len(), 2);
    assert_eq!(ble.disconnects(), vec![1, 2]);
    assert!(
        sink.events
            .iter()
            .filter(|e| matches!(e, AppEvent::IrkCaptured { .. }))
            .count()
            == 2
    );
}
