//! Mock BLE stack for integration tests.
//!
//! Records every port call so tests can assert on the full call history
//! without a radio. Link table and bond store are plain maps the test
//! fills in directly.

use std::cell::Cell;
use std::collections::HashMap;

use irkcapture::app::events::AppEvent;
use irkcapture::app::ports::{
    BondStorePort, ClockPort, ConnectionDesc, ConnectionPort, EntropyPort, EventSink, GapPort,
    KeepAlivePort,
};
use irkcapture::ble::address::{AddressKind, DeviceIdentity, PeerAddress};
use irkcapture::ble::advertising::AdvertisingDescriptor;
use irkcapture::ble::bond::BondRecord;
use irkcapture::error::BleError;

// ── BLE call record ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum BleCall {
    SetAddress(DeviceIdentity),
    StartAdvertising(AdvertisingDescriptor),
    StopAdvertising,
    Disconnect(u16),
    Notify([u8; 2]),
}

// ── MockBle ───────────────────────────────────────────────────

#[derive(Default)]
pub struct MockBle {
    pub calls: Vec<BleCall>,
    pub links: HashMap<u16, ConnectionDesc>,
    pub bonds: HashMap<PeerAddress, BondRecord>,
    pub reject_address: bool,
    pub fail_advertising: bool,
    /// Number of `read_peer_sec` calls.
    pub bond_reads: Cell<usize>,
}

#[allow(dead_code)]
impl MockBle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a live link; the test delivers `on_connect` separately.
    pub fn connect(&mut self, handle: u16, ota: PeerAddress, id: PeerAddress) {
        self.links.insert(
            handle,
            ConnectionDesc {
                handle,
                peer_ota_addr: ota,
                peer_id_addr: id,
                encrypted: false,
                bonded: false,
            },
        );
    }

    pub fn store_bond(&mut self, record: BondRecord) {
        self.bonds.insert(record.peer_addr, record);
    }

    pub fn starts(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, BleCall::StartAdvertising(_)))
            .count()
    }

    pub fn notifications(&self) -> Vec<[u8; 2]> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                BleCall::Notify(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    pub fn disconnects(&self) -> Vec<u16> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                BleCall::Disconnect(h) => Some(*h),
                _ => None,
            })
            .collect()
    }

    pub fn last_advertised_name(&self) -> Option<String> {
        self.calls.iter().rev().find_map(|c| match c {
            BleCall::StartAdvertising(d) => Some(d.name.as_str().to_owned()),
            _ => None,
        })
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl GapPort for MockBle {
    fn set_random_address(&mut self, identity: &DeviceIdentity) -> Result<(), BleError> {
        if self.reject_address {
            return Err(BleError::AddressRejected);
        }
        self.calls.push(BleCall::SetAddress(*identity));
        Ok(())
    }

    fn start_advertising(&mut self, descriptor: &AdvertisingDescriptor) -> Result<(), BleError> {
        if self.fail_advertising {
            return Err(BleError::AdvertisingFailed);
        }
        self.calls.push(BleCall::StartAdvertising(descriptor.clone()));
        Ok(())
    }

    fn stop_advertising(&mut self) -> Result<(), BleError> {
        self.calls.push(BleCall::StopAdvertising);
        Ok(())
    }
}

impl ConnectionPort for MockBle {
    fn connected_count(&self) -> usize {
        self.links.len()
    }

    fn find_connection(&self, handle: u16) -> Option<ConnectionDesc> {
        self.links.get(&handle).copied()
    }

    fn disconnect(&mut self, handle: u16) -> Result<(), BleError> {
        self.calls.push(BleCall::Disconnect(handle));
        self.links
            .remove(&handle)
            .map(|_| ())
            .ok_or(BleError::InvalidHandle)
    }

    fn notify_heart_rate(&mut self, payload: &[u8; 2]) -> Result<(), BleError> {
        self.calls.push(BleCall::Notify(*payload));
        Ok(())
    }
}

impl BondStorePort for MockBle {
    fn read_peer_sec(&self, peer_id_addr: &PeerAddress) -> Option<BondRecord> {
        self.bond_reads.set(self.bond_reads.get() + 1);
        self.bonds.get(peer_id_addr).copied()
    }
}

// ── Clock / entropy / keep-alive ──────────────────────────────

pub struct MockClock {
    pub ms: Cell<u32>,
    pub us: Cell<u64>,
}

#[allow(dead_code)]
impl MockClock {
    pub fn at(ms: u32) -> Self {
        Self {
            ms: Cell::new(ms),
            us: Cell::new(u64::from(ms) * 1_000),
        }
    }

    pub fn advance(&self, ms: u32) {
        self.ms.set(self.ms.get().wrapping_add(ms));
        self.us.set(self.us.get() + u64::from(ms) * 1_000);
    }
}

impl ClockPort for MockClock {
    fn now_ms(&self) -> u32 {
        self.ms.get()
    }

    fn now_us(&self) -> u64 {
        self.us.get()
    }
}

/// Counts up from a seed; every draw differs from the last.
pub struct MockRng(pub u8);

impl EntropyPort for MockRng {
    fn fill(&mut self, buf: &mut [u8]) {
        for b in buf {
            *b = self.0;
            self.0 = self.0.wrapping_add(1);
        }
    }
}

#[derive(Default)]
pub struct MockKeepAlive {
    pub feeds: usize,
    pub slept_ms: u32,
}

impl KeepAlivePort for MockKeepAlive {
    fn feed(&mut self) {
        self.feeds += 1;
    }

    fn sleep_ms(&mut self, ms: u32) {
        self.slept_ms += ms;
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn captures(&self) -> Vec<(String, String)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::IrkCaptured { irk, address } => {
                    Some((irk.as_str().to_owned(), address.as_str().to_owned()))
                }
                _ => None,
            })
            .collect()
    }

    pub fn advertising_changes(&self) -> Vec<bool> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::AdvertisingChanged(on) => Some(*on),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Fixtures ──────────────────────────────────────────────────

pub const PEER_OTA: PeerAddress =
    PeerAddress::new(AddressKind::Random, [0x01, 0x02, 0x03, 0xAA, 0xBB, 0xCC]);
pub const PEER_ID: PeerAddress =
    PeerAddress::new(AddressKind::PublicId, [0x10, 0x20, 0x30, 0x40, 0x50, 0x60]);

/// IRK bytes 0x00..=0x0F in storage order.
pub fn counting_irk() -> [u8; 16] {
    let mut irk = [0u8; 16];
    for (i, b) in irk.iter_mut().enumerate() {
        *b = i as u8;
    }
    irk
}
