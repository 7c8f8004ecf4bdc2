//! BLE domain: addresses, identity, advertising, bonding and the GATT
//! profile. Nothing here talks to the radio; the NimBLE adapter does.

pub mod address;
pub mod advertising;
pub mod bond;
pub mod gatt;
pub mod identity;
pub mod router;
