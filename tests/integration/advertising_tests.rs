//! Integration tests for the advertising controller as driven by the
//! service and the connection router.

use irkcapture::app::events::AppEvent;
use irkcapture::app::ports::ConnectionEvents;
use irkcapture::app::service::CaptureService;
use irkcapture::ble::advertising::OwnAddress;
use irkcapture::ble::router::ConnectionEventRouter;
use irkcapture::config::CaptureConfig;

use crate::mock_ble::{BleCall, MockBle, MockKeepAlive, MockRng, PEER_ID, PEER_OTA, RecordingSink};

fn make_app(config: CaptureConfig) -> (CaptureService, MockBle, RecordingSink) {
    let mut app = CaptureService::new(config);
    let mut ble = MockBle::new();
    let mut sink = RecordingSink::new();
    app.init(&mut ble, &mut MockRng(0), &mut sink);
    (app, ble, sink)
}

#[test]
fn init_installs_address_then_advertises() {
    let (app, ble, sink) = make_app(CaptureConfig::default());
    assert!(matches!(ble.calls[0], BleCall::SetAddress(_)));
    assert!(matches!(ble.calls[1], BleCall::StartAdvertising(_)));
    assert!(app.is_advertising());
    assert_eq!(app.identity().map(|id| id.bytes()[0] & 0xC1), Some(0xC0));

    match sink.events.last() {
        Some(AppEvent::Started {
            name,
            identity,
            advertising,
        }) => {
            assert_eq!(name.as_str(), "Beats Solo4");
            assert_eq!(*identity, app.identity());
            assert!(*advertising);
        }
        other => panic!("expected Started, got {:?}", other),
    }
}

#[test]
fn start_on_boot_disabled_stays_silent_until_switched_on() {
    let config = CaptureConfig {
        start_on_boot: false,
        ..CaptureConfig::default()
    };
    let (mut app, mut ble, mut sink) = make_app(config);
    assert!(!app.is_advertising());
    assert_eq!(ble.starts(), 0);
    assert!(app.identity().is_some(), "address is installed regardless");

    // A stray connection must not switch advertising on behind the operator.
    ble.connect(1, PEER_OTA, PEER_ID);
    ConnectionEventRouter::new(&mut app, &mut ble, &mut sink).on_connect(1);
    assert!(!app.is_advertising());

    app.set_advertising(true, &mut ble, &mut sink);
    assert!(app.is_advertising());
    assert_eq!(ble.starts(), 1);
}

#[test]
fn start_twice_is_idempotent() {
    let (mut app, mut ble, mut sink) = make_app(CaptureConfig::default());
    app.set_advertising(true, &mut ble, &mut sink);
    app.set_advertising(true, &mut ble, &mut sink);
    assert!(app.is_advertising());
    assert_eq!(sink.advertising_changes(), vec![true]);
}

#[test]
fn connect_and_disconnect_rearm_advertising() {
    let (mut app, mut ble, mut sink) = make_app(CaptureConfig::default());
    ble.clear();

    ble.connect(4, PEER_OTA, PEER_ID);
    let mut router = ConnectionEventRouter::new(&mut app, &mut ble, &mut sink);
    router.on_connect(4);
    router.on_disconnect(4);

    assert_eq!(ble.starts(), 2);
    assert!(app.is_advertising());
}

#[test]
fn switched_off_advertising_survives_link_activity() {
    let (mut app, mut ble, mut sink) = make_app(CaptureConfig::default());
    app.set_advertising(false, &mut ble, &mut sink);
    ble.clear();

    ble.connect(4, PEER_OTA, PEER_ID);
    let mut router = ConnectionEventRouter::new(&mut app, &mut ble, &mut sink);
    router.on_connect(4);
    router.on_disconnect(4);

    assert_eq!(ble.starts(), 0);
    assert!(!app.is_advertising());
    assert_eq!(sink.advertising_changes(), vec![true, false]);
}

#[test]
fn refused_start_reports_stopped_and_recovers() {
    let (mut app, mut ble, mut sink) = make_app(CaptureConfig::default());
    app.set_advertising(false, &mut ble, &mut sink);

    ble.fail_advertising = true;
    app.set_advertising(true, &mut ble, &mut sink);
    assert!(!app.is_advertising());

    // The next link event retries.
    ble.fail_advertising = false;
    ConnectionEventRouter::new(&mut app, &mut ble, &mut sink).on_disconnect(4);
    assert!(app.is_advertising());
}

#[test]
fn advertised_payload_is_heart_rate_profile() {
    let (_app, ble, _sink) = make_app(CaptureConfig::default());
    let Some(BleCall::StartAdvertising(d)) = ble.calls.get(1) else {
        panic!("no advertising start recorded");
    };
    assert_eq!(d.service_uuids, [0x180D, 0x180F]);
    assert_eq!(d.appearance, 0x0340);
    assert_eq!((d.min_interval, d.max_interval), (0x20, 0x40));
    assert!(d.scan_response);
}

#[test]
fn every_start_advertises_on_the_random_identity() {
    let (mut app, mut ble, mut sink) = make_app(CaptureConfig::default());
    app.refresh_mac(&mut ble, &mut MockRng(3), &mut MockKeepAlive::default(), &mut sink);
    let starts: Vec<_> = ble
        .calls
        .iter()
        .filter_map(|c| match c {
            BleCall::StartAdvertising(d) => Some(d.own_address),
            _ => None,
        })
        .collect();
    assert_eq!(starts, vec![OwnAddress::Random; 2]);
}

#[test]
fn rejected_boot_address_still_advertises() {
    let mut app = CaptureService::new(CaptureConfig::default());
    let mut ble = MockBle::new();
    let mut sink = RecordingSink::new();
    ble.reject_address = true;
    app.init(&mut ble, &mut MockRng(0), &mut sink);

    assert_eq!(app.identity(), None);
    assert!(app.is_advertising());
    assert_eq!(ble.calls.len(), 1);
    assert!(app.describe().to_string().contains("(controller default)"));
}
