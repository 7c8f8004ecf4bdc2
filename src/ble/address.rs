//! Address and key formatting.
//!
//! Two byte orders meet here:
//!
//! - **storage order** — how the NimBLE host keeps addresses and keys
//!   (`ble_addr_t.val`, `ble_store_value_sec.irk`): least significant byte first.
//! - **display order** — how humans and tracking systems write them:
//!   most significant byte first.
//!
//! Both the peer MAC and the IRK are therefore byte-reversed on the way out.
//! Our own [`DeviceIdentity`] is kept in display order and only reversed
//! when it is handed to the controller.

use core::fmt::{self, Write};
use core::str::FromStr;

/// `XX:XX:XX:XX:XX:XX`
pub type MacString = heapless::String<17>;

/// 32 lowercase hex characters.
pub type IrkHex = heapless::String<32>;

/// `irk:` followed by [`IrkHex`], the form published to observers.
pub type IrkLabel = heapless::String<36>;

pub const IRK_LABEL_PREFIX: &str = "irk:";

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

// ───────────────────────────────────────────────────────────────
// Formatting
// ───────────────────────────────────────────────────────────────

/// Format a storage-order address as an uppercase colon-separated MAC.
pub fn format_mac(storage: &[u8; 6]) -> MacString {
    let mut s = MacString::new();
    let _ = write!(
        s,
        "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
        storage[5], storage[4], storage[3], storage[2], storage[1], storage[0]
    );
    s
}

/// Parse `XX:XX:XX:XX:XX:XX` (either case) into display-order bytes.
pub fn parse_mac(s: &str) -> Result<[u8; 6], AddressParseError> {
    if s.len() != 17 {
        return Err(AddressParseError::Length);
    }
    let mut out = [0u8; 6];
    let mut parts = s.split(':');
    for byte in &mut out {
        let part = parts.next().ok_or(AddressParseError::Separator)?;
        if part.len() != 2 {
            return Err(AddressParseError::Separator);
        }
        *byte = u8::from_str_radix(part, 16).map_err(|_| AddressParseError::Digit)?;
    }
    if parts.next().is_some() {
        return Err(AddressParseError::Separator);
    }
    Ok(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressParseError {
    Length,
    Separator,
    Digit,
}

impl fmt::Display for AddressParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Length => write!(f, "MAC must be 17 characters"),
            Self::Separator => write!(f, "MAC must be six colon-separated octets"),
            Self::Digit => write!(f, "MAC contains a non-hex digit"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Own identity
// ───────────────────────────────────────────────────────────────

/// Our random static device address, display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceIdentity([u8; 6]);

impl DeviceIdentity {
    /// Force the random-static pattern onto six random bytes: the two top
    /// bits of the first byte are set and its lowest bit cleared. The other
    /// five bytes are kept verbatim.
    pub fn from_random(mut bytes: [u8; 6]) -> Self {
        bytes[0] |= 0xC0;
        bytes[0] &= 0xFE;
        Self(bytes)
    }

    pub fn bytes(&self) -> [u8; 6] {
        self.0
    }

    /// Storage (little-endian) order, as the controller holds it.
    pub fn to_storage(&self) -> [u8; 6] {
        let mut le = self.0;
        le.reverse();
        le
    }

    pub fn to_mac_string(&self) -> MacString {
        format_mac(&self.to_storage())
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_mac_string())
    }
}

impl FromStr for DeviceIdentity {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_mac(s).map(Self)
    }
}

// ───────────────────────────────────────────────────────────────
// Peer addresses
// ───────────────────────────────────────────────────────────────

/// Address type as carried in `ble_addr_t.type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressKind {
    Public,
    Random,
    /// Resolved identity of a public-identity peer (`BLE_ADDR_PUBLIC_ID`).
    PublicId,
    /// Resolved identity of a random-identity peer (`BLE_ADDR_RANDOM_ID`).
    RandomId,
}

impl AddressKind {
    /// Decode a `BLE_ADDR_*` constant. Unknown values read as `Random`.
    pub const fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Public,
            2 => Self::PublicId,
            3 => Self::RandomId,
            _ => Self::Random,
        }
    }

    pub const fn raw(self) -> u8 {
        match self {
            Self::Public => 0,
            Self::Random => 1,
            Self::PublicId => 2,
            Self::RandomId => 3,
        }
    }
}

/// A peer address in storage order, as the host stack reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerAddress {
    pub kind: AddressKind,
    pub val: [u8; 6],
}

impl PeerAddress {
    pub const fn new(kind: AddressKind, val: [u8; 6]) -> Self {
        Self { kind, val }
    }

    pub fn to_mac_string(&self) -> MacString {
        format_mac(&self.val)
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_mac_string())
    }
}

// ───────────────────────────────────────────────────────────────
// Identity Resolving Key
// ───────────────────────────────────────────────────────────────

/// A 16-byte IRK in storage order.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Irk(pub [u8; 16]);

impl Irk {
    /// Reverse and hex-encode, lowercase.
    pub fn to_hex(&self) -> IrkHex {
        let mut s = IrkHex::new();
        for &b in self.0.iter().rev() {
            let _ = s.push(HEX_DIGITS[(b >> 4) as usize] as char);
            let _ = s.push(HEX_DIGITS[(b & 0x0F) as usize] as char);
        }
        s
    }
}

// Keys stay out of debug logs.
impl fmt::Debug for Irk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Irk(..)")
    }
}

/// One successful capture: formatted IRK and the peer's on-air address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureResult {
    pub irk: IrkHex,
    pub address: MacString,
}

impl CaptureResult {
    /// The IRK as published: `irk:` + 32 hex characters.
    pub fn irk_label(&self) -> IrkLabel {
        let mut s = IrkLabel::new();
        let _ = s.push_str(IRK_LABEL_PREFIX);
        let _ = s.push_str(&self.irk);
        s
    }
}
