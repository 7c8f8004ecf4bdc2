//! Bond store reader.
//!
//! IRK distribution during SMP key exchange finishes asynchronously after
//! the authentication-complete callback, and NimBLE raises no "keys ready"
//! event. The capture loop therefore polls [`try_get_irk`] until the peer's
//! security record carries an IRK, or the peer goes away.
//!
//! Every miss below is an expected "not yet" and is logged at trace level
//! only.

use log::trace;

use super::address::{CaptureResult, Irk, PeerAddress};
use crate::app::ports::{BondStorePort, ConnectionPort};

/// Persisted per-peer security material
/// (mirror of the fields of `ble_store_value_sec` the firmware can see).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BondRecord {
    pub peer_addr: PeerAddress,
    pub key_size: u8,
    pub ltk_present: bool,
    pub irk_present: bool,
    pub irk: Irk,
    pub csrk_present: bool,
    pub authenticated: bool,
    pub secure_connections: bool,
}

impl BondRecord {
    /// An encryption-only bond: LTK exchanged, identity not (yet) distributed.
    pub fn encryption_only(peer_addr: PeerAddress) -> Self {
        Self {
            peer_addr,
            key_size: 16,
            ltk_present: true,
            irk_present: false,
            irk: Irk([0; 16]),
            csrk_present: false,
            authenticated: false,
            secure_connections: true,
        }
    }

    /// A full bond carrying the peer's identity key.
    pub fn with_irk(peer_addr: PeerAddress, irk: [u8; 16]) -> Self {
        Self {
            irk_present: true,
            irk: Irk(irk),
            ..Self::encryption_only(peer_addr)
        }
    }
}

/// Resolve the peer behind `handle`, read its bond and extract the IRK.
///
/// Returns `None` when the handle no longer names a live link, when no
/// record exists yet, or when the record has no IRK.
pub fn try_get_irk(
    ble: &(impl ConnectionPort + BondStorePort),
    handle: u16,
) -> Option<CaptureResult> {
    let Some(desc) = ble.find_connection(handle) else {
        trace!("bond: handle {} no longer connected", handle);
        return None;
    };

    let Some(record) = ble.read_peer_sec(&desc.peer_id_addr) else {
        trace!("bond: no record yet for {}", desc.peer_id_addr);
        return None;
    };

    if !record.irk_present {
        trace!("bond: record for {} has no IRK yet", desc.peer_id_addr);
        return None;
    }

    Some(CaptureResult {
        irk: record.irk.to_hex(),
        address: desc.peer_ota_addr.to_mac_string(),
    })
}
