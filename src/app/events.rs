//! Outbound application events.
//!
//! The [`CaptureService`](super::service::CaptureService) emits these
//! through the [`EventSink`](super::ports::EventSink) port. Adapters on the
//! other side decide what to do with them — log to serial, update a text
//! sensor, reflect the advertising switch, etc.

use crate::ble::address::{DeviceIdentity, IrkLabel, MacString};
use crate::config::BleName;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The service finished `init()`.
    Started {
        name: BleName,
        identity: Option<DeviceIdentity>,
        advertising: bool,
    },

    /// Advertising switched on or off. Emitted only on change.
    AdvertisingChanged(bool),

    /// A new random static address was installed.
    AddressChanged(DeviceIdentity),

    /// The advertised BLE name changed.
    NameChanged(BleName),

    /// A peer's IRK was read from the bond store.
    /// `irk` carries the `irk:` prefix; `address` is the peer's on-air MAC.
    IrkCaptured { irk: IrkLabel, address: MacString },
}
