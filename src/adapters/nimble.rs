//! NimBLE adapter.
//!
//! Implements [`GapPort`], [`ConnectionPort`] and [`BondStorePort`] on top
//! of the NimBLE host.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp32-nimble` for the GATT server,
//!   advertising, own-address selection and security manager; raw
//!   `esp_idf_svc::sys` NimBLE calls for the pieces the wrapper does not
//!   expose (connection lookup, bond store reads).
//! - **all other targets**: [`SimBle`], an in-memory stack for host-side
//!   simulation and tests.
//!
//! GAP callbacks never touch the capture session directly; they push a
//! [`BleEvent`](crate::events::BleEvent) that the main loop drains.

#[cfg(target_os = "espidf")]
pub use esp::NimbleAdapter;

#[cfg(not(target_os = "espidf"))]
pub use sim::SimBle;

#[cfg(target_os = "espidf")]
mod esp {
    use std::sync::Arc;

    use esp32_nimble::enums::{
        AuthReq, ConnMode, DiscMode, OwnAddrType, PairKeyDist, SecurityIOCap,
    };
    use esp32_nimble::utilities::BleUuid;
    use esp32_nimble::utilities::mutex::Mutex;
    use esp32_nimble::{BLEAdvertisementData, BLECharacteristic, BLEDevice, NimbleProperties};
    use esp_idf_svc::sys;
    use log::{debug, info, warn};

    use crate::app::ports::{BondStorePort, ConnectionDesc, ConnectionPort, GapPort};
    use crate::ble::address::{AddressKind, DeviceIdentity, PeerAddress};
    use crate::ble::advertising::{AdvertisingDescriptor, ConnectMode, DiscoverMode, OwnAddress};
    use crate::ble::bond::BondRecord;
    use crate::ble::gatt::{InitialValue, PROFILE, Props};
    use crate::config::CaptureConfig;
    use crate::error::BleError;
    use crate::events::{BleEvent, push_ble_event};

    type Characteristic = Arc<Mutex<BLECharacteristic>>;

    pub struct NimbleAdapter {
        heart_rate: Option<Characteristic>,
        model: Option<Characteristic>,
        own_address: OwnAddress,
    }

    impl NimbleAdapter {
        /// Bring up the host, configure the security manager and build the
        /// GATT server. Advertising is not started here.
        pub fn new(config: &CaptureConfig) -> Result<Self, BleError> {
            let device = BLEDevice::take();
            BLEDevice::set_device_name(&config.ble_name).map_err(|e| {
                warn!("NimBLE: set_device_name failed: {:?}", e);
                BleError::StackInitFailed
            })?;
            // Advertise on the installed random-static identity, not the
            // controller's public MAC.
            device.set_own_addr_type(OwnAddrType::Random);

            // Bond + MITM + SC, no IO, distribute encryption and identity keys.
            device
                .security()
                .set_auth(AuthReq::Bond | AuthReq::Mitm | AuthReq::Sc)
                .set_io_cap(SecurityIOCap::NoInputNoOutput)
                .set_security_init_key(PairKeyDist::ENC | PairKeyDist::ID)
                .set_security_resp_key(PairKeyDist::ENC | PairKeyDist::ID);

            let server = device.get_server();
            server.advertise_on_disconnect(false);

            server.on_connect(|_server, desc| {
                push_ble_event(BleEvent::Connected {
                    handle: desc.conn_handle(),
                });
            });
            server.on_disconnect(|desc, reason| {
                let reason = reason.err().map_or(0, |e| e.code() as i32);
                push_ble_event(BleEvent::Disconnected {
                    handle: desc.conn_handle(),
                    reason,
                });
            });
            server.on_authentication_complete(|_server, desc, _result| {
                push_ble_event(BleEvent::AuthComplete {
                    handle: desc.conn_handle(),
                    encrypted: desc.encrypted(),
                    bonded: desc.bonded(),
                });
            });

            let mut adapter = Self {
                heart_rate: None,
                model: None,
                own_address: OwnAddress::Random,
            };

            for svc in PROFILE {
                let service = server.create_service(BleUuid::from_uuid16(svc.uuid));
                for spec in svc.characteristics {
                    let chr = service
                        .lock()
                        .create_characteristic(BleUuid::from_uuid16(spec.uuid), props(spec.props));
                    match spec.value {
                        InitialValue::HeartRate => {
                            chr.lock().set_value(&[0, 0]);
                            adapter.heart_rate = Some(chr);
                        }
                        InitialValue::Manufacturer => {
                            chr.lock().set_value(config.manufacturer.as_bytes());
                        }
                        InitialValue::BleName => {
                            chr.lock().set_value(config.ble_name.as_bytes());
                            adapter.model = Some(chr);
                        }
                        InitialValue::BatteryLevel => {
                            chr.lock().set_value(&[config.battery_level]);
                        }
                    }
                }
            }

            info!("NimBLE: GATT server ready ({} services)", PROFILE.len());
            Ok(adapter)
        }
    }

    fn props(p: Props) -> NimbleProperties {
        let mut out = NimbleProperties::empty();
        if p.contains(Props::READ) {
            out |= NimbleProperties::READ;
        }
        if p.contains(Props::READ_ENC) {
            out |= NimbleProperties::READ | NimbleProperties::READ_ENC;
        }
        if p.contains(Props::NOTIFY) {
            out |= NimbleProperties::NOTIFY;
        }
        out
    }

    fn peer_address(addr: &sys::ble_addr_t) -> PeerAddress {
        PeerAddress::new(AddressKind::from_raw(addr.type_), addr.val)
    }

    fn raw_address(addr: &PeerAddress) -> sys::ble_addr_t {
        sys::ble_addr_t {
            type_: addr.kind.raw(),
            val: addr.val,
        }
    }

    // ── GapPort ───────────────────────────────────────────────

    impl GapPort for NimbleAdapter {
        fn set_random_address(&mut self, identity: &DeviceIdentity) -> Result<(), BleError> {
            // Takes display order and stores it reversed.
            BLEDevice::take()
                .set_rnd_addr(identity.bytes())
                .map_err(|e| {
                    warn!("NimBLE: random address rejected: {:?}", e);
                    BleError::AddressRejected
                })
        }

        fn start_advertising(&mut self, d: &AdvertisingDescriptor) -> Result<(), BleError> {
            if BLEDevice::set_device_name(&d.name).is_err() {
                debug!("NimBLE: device name unchanged");
            }
            if let Some(model) = &self.model {
                model.lock().set_value(d.name.as_bytes());
            }
            if d.own_address != self.own_address {
                BLEDevice::take().set_own_addr_type(match d.own_address {
                    OwnAddress::Public => OwnAddrType::Public,
                    OwnAddress::Random => OwnAddrType::Random,
                });
                self.own_address = d.own_address;
            }

            let advertising = BLEDevice::take().get_advertising();
            let mut adv = advertising.lock();
            adv.reset().map_err(|e| {
                warn!("NimBLE: advertising reset failed: {:?}", e);
                BleError::AdvertisingFailed
            })?;

            let mut data = BLEAdvertisementData::new();
            data.name(&d.name).appearance(d.appearance);
            for uuid in d.service_uuids {
                data.add_service_uuid(BleUuid::from_uuid16(uuid));
            }

            // Mode and scan response first: `set_data` reads them to decide
            // whether the name moves into the scan response.
            adv.advertisement_type(match d.connect_mode {
                ConnectMode::NonConnectable => ConnMode::Non,
                ConnectMode::Directed => ConnMode::Dir,
                ConnectMode::Undirected => ConnMode::Und,
            })
            .disc_mode(match d.discover_mode {
                DiscoverMode::NonDiscoverable => DiscMode::Non,
                DiscoverMode::Limited => DiscMode::Ltd,
                DiscoverMode::General => DiscMode::Gen,
            })
            .min_interval(d.min_interval)
            .max_interval(d.max_interval)
            .scan_response(d.scan_response);
            adv.set_data(&mut data).map_err(|e| {
                warn!("NimBLE: advertising data rejected: {:?}", e);
                BleError::AdvertisingFailed
            })?;

            adv.start().map_err(|e| {
                warn!("NimBLE: advertising start failed: {:?}", e);
                BleError::AdvertisingFailed
            })
        }

        fn stop_advertising(&mut self) -> Result<(), BleError> {
            BLEDevice::take()
                .get_advertising()
                .lock()
                .stop()
                .map_err(|e| {
                    warn!("NimBLE: advertising stop failed: {:?}", e);
                    BleError::AdvertisingFailed
                })
        }
    }

    // ── ConnectionPort ────────────────────────────────────────

    impl ConnectionPort for NimbleAdapter {
        fn connected_count(&self) -> usize {
            BLEDevice::take().get_server().connected_count()
        }

        fn find_connection(&self, handle: u16) -> Option<ConnectionDesc> {
            // SAFETY: plain-old-data out parameter, filled on rc == 0.
            let mut desc: sys::ble_gap_conn_desc = unsafe { core::mem::zeroed() };
            let rc = unsafe { sys::ble_gap_conn_find(handle, &mut desc) };
            if rc != 0 {
                return None;
            }
            Some(ConnectionDesc {
                handle: desc.conn_handle,
                peer_ota_addr: peer_address(&desc.peer_ota_addr),
                peer_id_addr: peer_address(&desc.peer_id_addr),
                encrypted: desc.sec_state.encrypted() != 0,
                bonded: desc.sec_state.bonded() != 0,
            })
        }

        fn disconnect(&mut self, handle: u16) -> Result<(), BleError> {
            BLEDevice::take()
                .get_server()
                .disconnect(handle)
                .map_err(|e| {
                    debug!("NimBLE: disconnect {} failed: {:?}", handle, e);
                    BleError::DisconnectFailed
                })
        }

        fn notify_heart_rate(&mut self, payload: &[u8; 2]) -> Result<(), BleError> {
            let Some(chr) = &self.heart_rate else {
                return Err(BleError::NotifyFailed);
            };
            chr.lock().set_value(payload).notify();
            Ok(())
        }
    }

    // ── BondStorePort ─────────────────────────────────────────

    impl BondStorePort for NimbleAdapter {
        fn read_peer_sec(&self, peer_id_addr: &PeerAddress) -> Option<BondRecord> {
            // SAFETY: both structs are plain C data; `value` is only read
            // when NimBLE reports success.
            let mut key: sys::ble_store_key_sec = unsafe { core::mem::zeroed() };
            key.peer_addr = raw_address(peer_id_addr);
            let mut value: sys::ble_store_value_sec = unsafe { core::mem::zeroed() };
            let rc = unsafe { sys::ble_store_read_peer_sec(&key, &mut value) };
            if rc != 0 {
                return None;
            }
            Some(BondRecord {
                peer_addr: peer_address(&value.peer_addr),
                key_size: value.key_size,
                ltk_present: value.ltk_present() != 0,
                irk_present: value.irk_present() != 0,
                irk: crate::ble::address::Irk(value.irk),
                csrk_present: value.csrk_present() != 0,
                authenticated: value.authenticated() != 0,
                secure_connections: value.sc() != 0,
            })
        }
    }
}

#[cfg(not(target_os = "espidf"))]
mod sim {
    use std::collections::BTreeMap;

    use log::{debug, info};

    use crate::app::ports::{BondStorePort, ConnectionDesc, ConnectionPort, GapPort};
    use crate::ble::address::{DeviceIdentity, PeerAddress};
    use crate::ble::advertising::{AdvertisingDescriptor, OwnAddress};
    use crate::ble::bond::BondRecord;
    use crate::error::BleError;
    use crate::events::{BleEvent, push_ble_event};

    /// In-memory BLE stack for host simulation.
    ///
    /// The `simulate_*` methods stand in for a central: they update the
    /// link table or bond store and push the same callbacks NimBLE would.
    #[derive(Default)]
    pub struct SimBle {
        address: Option<DeviceIdentity>,
        advertising: Option<AdvertisingDescriptor>,
        links: BTreeMap<u16, ConnectionDesc>,
        bonds: Vec<BondRecord>,
        notifications: Vec<[u8; 2]>,
    }

    impl SimBle {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn address(&self) -> Option<DeviceIdentity> {
            self.address
        }

        pub fn advertising(&self) -> Option<&AdvertisingDescriptor> {
            self.advertising.as_ref()
        }

        /// Random identity a scanner currently sees; `None` while silent or
        /// when advertising on the public controller address.
        pub fn on_air_address(&self) -> Option<DeviceIdentity> {
            match self.advertising.as_ref()?.own_address {
                OwnAddress::Random => self.address,
                OwnAddress::Public => None,
            }
        }

        pub fn notifications(&self) -> &[[u8; 2]] {
            &self.notifications
        }

        /// A central connects. The host stops advertising on connect.
        pub fn simulate_connect(&mut self, handle: u16, ota: PeerAddress, id: PeerAddress) {
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
            self.advertising = None;
            push_ble_event(BleEvent::Connected { handle });
        }

        /// Pairing finished on `handle`; `bond` is written to the store.
        pub fn simulate_bond(&mut self, handle: u16, bond: BondRecord) {
            if let Some(link) = self.links.get_mut(&handle) {
                link.encrypted = true;
                link.bonded = true;
            }
            self.bonds.retain(|b| b.peer_addr != bond.peer_addr);
            self.bonds.push(bond);
            push_ble_event(BleEvent::AuthComplete {
                handle,
                encrypted: true,
                bonded: true,
            });
        }

        pub fn simulate_disconnect(&mut self, handle: u16, reason: i32) {
            if self.links.remove(&handle).is_some() {
                push_ble_event(BleEvent::Disconnected { handle, reason });
            }
        }
    }

    impl GapPort for SimBle {
        fn set_random_address(&mut self, identity: &DeviceIdentity) -> Result<(), BleError> {
            info!("BLE(sim): address {}", identity);
            self.address = Some(*identity);
            Ok(())
        }

        fn start_advertising(&mut self, descriptor: &AdvertisingDescriptor) -> Result<(), BleError> {
            debug!("BLE(sim): advertising as '{}'", descriptor.name);
            self.advertising = Some(descriptor.clone());
            Ok(())
        }

        fn stop_advertising(&mut self) -> Result<(), BleError> {
            self.advertising = None;
            Ok(())
        }
    }

    impl ConnectionPort for SimBle {
        fn connected_count(&self) -> usize {
            self.links.len()
        }

        fn find_connection(&self, handle: u16) -> Option<ConnectionDesc> {
            self.links.get(&handle).copied()
        }

        fn disconnect(&mut self, handle: u16) -> Result<(), BleError> {
            if !self.links.contains_key(&handle) {
                return Err(BleError::InvalidHandle);
            }
            // Local terminate: BLE_ERR_CONN_TERM_LOCAL.
            self.simulate_disconnect(handle, 0x216);
            Ok(())
        }

        fn notify_heart_rate(&mut self, payload: &[u8; 2]) -> Result<(), BleError> {
            self.notifications.push(*payload);
            Ok(())
        }
    }

    impl BondStorePort for SimBle {
        fn read_peer_sec(&self, peer_id_addr: &PeerAddress) -> Option<BondRecord> {
            self.bonds
                .iter()
                .find(|b| b.peer_addr == *peer_id_addr)
                .copied()
        }
    }
}
