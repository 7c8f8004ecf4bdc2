//! Identity manager: our own random static BLE address.
//!
//! A fresh address is drawn at boot and on every "refresh MAC". Installing
//! it takes effect immediately, including for an advertising set that is
//! already running, so callers stop advertising first and restart after
//! (see [`CaptureService::refresh_mac`](crate::app::service::CaptureService::refresh_mac)).
//! Existing links keep their address.

use log::{info, warn};

use super::address::DeviceIdentity;
use crate::app::events::AppEvent;
use crate::app::ports::{EntropyPort, EventSink, GapPort};
use crate::error::BleError;

#[derive(Default)]
pub struct IdentityManager {
    current: Option<DeviceIdentity>,
}

impl IdentityManager {
    pub fn new() -> Self {
        Self { current: None }
    }

    /// The address installed last, if any.
    pub fn current(&self) -> Option<DeviceIdentity> {
        self.current
    }

    /// Draw six random bytes and force the random-static pattern.
    pub fn generate(rng: &mut impl EntropyPort) -> DeviceIdentity {
        let mut raw = [0u8; 6];
        rng.fill(&mut raw);
        DeviceIdentity::from_random(raw)
    }

    /// Generate a new identity and make it the active device address.
    ///
    /// On failure the previous identity stays active.
    pub fn generate_and_install(
        &mut self,
        gap: &mut impl GapPort,
        rng: &mut impl EntropyPort,
        sink: &mut impl EventSink,
    ) -> Result<DeviceIdentity, BleError> {
        let identity = Self::generate(rng);
        if let Err(e) = gap.set_random_address(&identity) {
            warn!("BLE MAC {} rejected: {}", identity, e);
            return Err(e);
        }
        self.current = Some(identity);
        info!("BLE MAC: {}", identity);
        sink.emit(&AppEvent::AddressChanged(identity));
        Ok(identity)
    }
}
