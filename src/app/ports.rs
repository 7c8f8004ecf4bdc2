//! Port traits — the hexagonal boundary between capture logic and the BLE stack.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ CaptureService (domain)
//! ```
//!
//! Driven adapters (NimBLE, clock, entropy, watchdog, event sinks) implement
//! these traits. The [`CaptureService`](super::service::CaptureService)
//! consumes them via generics, so the capture core never touches the radio
//! directly and takes only plain data (handles, booleans, byte arrays).
//!
//! ## Error policy
//!
//! - Lookups that are *expected* to miss while polling (stale handle, no bond
//!   yet) return `Option`, never an error.
//! - Commands that the stack can refuse return [`BleError`]; the service
//!   logs and absorbs them.

use crate::ble::address::{DeviceIdentity, PeerAddress};
use crate::ble::advertising::AdvertisingDescriptor;
use crate::ble::bond::BondRecord;
use crate::error::BleError;

// ───────────────────────────────────────────────────────────────
// GAP port (domain → advertising / own address)
// ───────────────────────────────────────────────────────────────

pub trait GapPort {
    /// Install `identity` as the active random device address.
    fn set_random_address(&mut self, identity: &DeviceIdentity) -> Result<(), BleError>;

    /// Drop any previous advertising configuration, apply `descriptor` from
    /// scratch and begin broadcasting.
    fn start_advertising(&mut self, descriptor: &AdvertisingDescriptor) -> Result<(), BleError>;

    /// Halt broadcasting. Succeeds when already stopped.
    fn stop_advertising(&mut self) -> Result<(), BleError>;
}

// ───────────────────────────────────────────────────────────────
// Connection port (domain ↔ live links)
// ───────────────────────────────────────────────────────────────

/// What the host stack knows about one live connection
/// (the subset of `ble_gap_conn_desc` the capture path needs).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionDesc {
    pub handle: u16,
    /// Address the peer is using on air right now.
    pub peer_ota_addr: PeerAddress,
    /// Resolved identity address; the bond store is keyed by this.
    pub peer_id_addr: PeerAddress,
    pub encrypted: bool,
    pub bonded: bool,
}

pub trait ConnectionPort {
    /// Number of peers currently connected.
    fn connected_count(&self) -> usize;

    /// Look up a live connection. `None` once the peer has gone.
    fn find_connection(&self, handle: u16) -> Option<ConnectionDesc>;

    /// Ask the stack to terminate the link.
    fn disconnect(&mut self, handle: u16) -> Result<(), BleError>;

    /// Update the heart-rate measurement value and notify subscribers.
    fn notify_heart_rate(&mut self, payload: &[u8; 2]) -> Result<(), BleError>;
}

// ───────────────────────────────────────────────────────────────
// Bond store port (read-only view of the security manager store)
// ───────────────────────────────────────────────────────────────

pub trait BondStorePort {
    /// Read the persisted security record of a peer, keyed by identity address.
    fn read_peer_sec(&self, peer_id_addr: &PeerAddress) -> Option<BondRecord>;
}

/// The whole BLE stack as the capture service sees it.
pub trait BlePort: GapPort + ConnectionPort + BondStorePort {}

impl<T: GapPort + ConnectionPort + BondStorePort> BlePort for T {}

// ───────────────────────────────────────────────────────────────
// Clock / entropy / keep-alive
// ───────────────────────────────────────────────────────────────

pub trait ClockPort {
    /// Milliseconds since boot, truncated to `u32` (wraps after ~49 days).
    fn now_ms(&self) -> u32;

    /// Microseconds since boot.
    fn now_us(&self) -> u64;
}

pub trait EntropyPort {
    fn fill(&mut self, buf: &mut [u8]);
}

/// Short blocking waits that must not starve the task watchdog.
pub trait KeepAlivePort {
    /// Signal liveness to the watchdog.
    fn feed(&mut self);

    /// Block the calling task for `ms` milliseconds.
    fn sleep_ms(&mut self, ms: u32);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → log / UI entities)
// ───────────────────────────────────────────────────────────────

/// The domain emits [`AppEvent`](super::events::AppEvent)s through this
/// port. Adapters decide where they go (serial log, text sensors, a switch
/// entity reflecting the advertising state, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Connection events (platform callbacks → domain)
// ───────────────────────────────────────────────────────────────

/// The three notifications the BLE stack delivers about links.
///
/// Implemented by [`ConnectionEventRouter`](crate::ble::router::ConnectionEventRouter);
/// adapters translate their callback types into these plain-data calls.
/// None of them can fail.
pub trait ConnectionEvents {
    fn on_connect(&mut self, handle: u16);
    fn on_disconnect(&mut self, handle: u16);
    fn on_auth_complete(&mut self, encrypted: bool);
}
