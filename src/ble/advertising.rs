//! Advertising controller.
//!
//! ```text
//!            start()                     stop()
//!   ┌─────────┐ ──────────▶ ┌─────────────┐ ──────────▶ ┌─────────┐
//!   │ Stopped │             │ Advertising │             │ Stopped │
//!   └─────────┘ ◀────────── └─────────────┘ ◀────────── └─────────┘
//! ```
//!
//! Both transitions are allowed from either state. `start()` always hands
//! the stack a freshly built [`AdvertisingDescriptor`]; the adapter resets
//! the previous configuration before applying it, so there is no partial
//! reconfiguration path.
//!
//! The controller also remembers the operator's last explicit choice
//! (switch on/off). Implicit re-arms after connect/disconnect go through
//! [`AdvertisingController::rearm`], which respects a switched-off state.

use log::{debug, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, GapPort};
use crate::config::{BleName, CaptureConfig};

use super::gatt::{BATTERY_SERVICE, HEART_RATE_SERVICE};

/// Connectable mode (`BLE_GAP_CONN_MODE_*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectMode {
    NonConnectable,
    Directed,
    Undirected,
}

/// Discoverable mode (`BLE_GAP_DISC_MODE_*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoverMode {
    NonDiscoverable,
    Limited,
    General,
}

/// Address the advertiser puts on air (`BLE_OWN_ADDR_*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnAddress {
    Public,
    /// The installed random-static identity.
    Random,
}

/// Everything the stack needs to (re)start advertising.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertisingDescriptor {
    pub name: BleName,
    pub service_uuids: [u16; 2],
    pub appearance: u16,
    /// Units of 0.625 ms.
    pub min_interval: u16,
    pub max_interval: u16,
    pub connect_mode: ConnectMode,
    pub discover_mode: DiscoverMode,
    pub scan_response: bool,
    pub own_address: OwnAddress,
}

impl AdvertisingDescriptor {
    /// Heart-rate peripheral advertisement under `name`.
    pub fn heart_rate(name: &BleName, config: &CaptureConfig) -> Self {
        Self {
            name: name.clone(),
            service_uuids: [HEART_RATE_SERVICE, BATTERY_SERVICE],
            appearance: config.appearance,
            min_interval: config.adv_min_interval,
            max_interval: config.adv_max_interval,
            connect_mode: ConnectMode::Undirected,
            discover_mode: DiscoverMode::General,
            scan_response: true,
            own_address: OwnAddress::Random,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvertisingState {
    Stopped,
    Advertising,
}

pub struct AdvertisingController {
    state: AdvertisingState,
    operator_enabled: bool,
}

impl Default for AdvertisingController {
    fn default() -> Self {
        Self::new()
    }
}

impl AdvertisingController {
    pub fn new() -> Self {
        Self {
            state: AdvertisingState::Stopped,
            operator_enabled: true,
        }
    }

    pub fn state(&self) -> AdvertisingState {
        self.state
    }

    pub fn is_advertising(&self) -> bool {
        self.state == AdvertisingState::Advertising
    }

    /// Whether the operator currently wants the device discoverable.
    pub fn operator_enabled(&self) -> bool {
        self.operator_enabled
    }

    pub fn set_operator_enabled(&mut self, enabled: bool) {
        self.operator_enabled = enabled;
    }

    /// Any state → Advertising. Returns `false` if the stack refused.
    pub fn start(
        &mut self,
        gap: &mut impl GapPort,
        descriptor: &AdvertisingDescriptor,
        sink: &mut impl EventSink,
    ) -> bool {
        match gap.start_advertising(descriptor) {
            Ok(()) => {
                self.set_state(AdvertisingState::Advertising, sink);
                debug!("Advertising started as '{}'", descriptor.name);
                true
            }
            Err(e) => {
                // The adapter resets before applying, so nothing is on air.
                warn!("Advertising start failed: {}", e);
                self.set_state(AdvertisingState::Stopped, sink);
                false
            }
        }
    }

    /// Any state → Stopped.
    pub fn stop(&mut self, gap: &mut impl GapPort, sink: &mut impl EventSink) {
        if let Err(e) = gap.stop_advertising() {
            warn!("Advertising stop failed: {}", e);
        }
        self.set_state(AdvertisingState::Stopped, sink);
        debug!("Advertising stopped");
    }

    /// Implicit re-arm after link activity; a no-op while the operator has
    /// advertising switched off.
    pub fn rearm(
        &mut self,
        gap: &mut impl GapPort,
        descriptor: &AdvertisingDescriptor,
        sink: &mut impl EventSink,
    ) {
        if !self.operator_enabled {
            debug!("Advertising re-arm skipped (switched off)");
            return;
        }
        self.start(gap, descriptor, sink);
    }

    fn set_state(&mut self, next: AdvertisingState, sink: &mut impl EventSink) {
        if self.state == next {
            return;
        }
        self.state = next;
        sink.emit(&AppEvent::AdvertisingChanged(
            next == AdvertisingState::Advertising,
        ));
    }
}
