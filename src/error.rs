//! Unified error types for the IRK capture firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! entry point's error handling uniform. All variants are `Copy` so they can
//! be passed through the capture service without allocation.
//!
//! Nothing in the capture path is fatal: port errors are logged by the
//! service and absorbed, the main loop keeps running and re-arming
//! advertising.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A BLE stack call failed.
    Ble(BleError),
    /// A BLE device name was rejected.
    Name(NameError),
    /// Configuration is invalid or could not be parsed.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ble(e) => write!(f, "ble: {e}"),
            Self::Name(e) => write!(f, "name: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// BLE stack errors
// ---------------------------------------------------------------------------

/// Failures reported by the BLE port adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BleError {
    /// Host stack or GATT server could not be brought up.
    StackInitFailed,
    /// The controller refused the random address (e.g. all-zero / all-one bits).
    AddressRejected,
    /// Advertising could not be configured or started/stopped.
    AdvertisingFailed,
    /// A GATT notification could not be queued.
    NotifyFailed,
    /// The terminate request for a connection failed.
    DisconnectFailed,
    /// The connection handle does not identify a live link.
    InvalidHandle,
}

impl fmt::Display for BleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StackInitFailed => write!(f, "BLE stack init failed"),
            Self::AddressRejected => write!(f, "random address rejected"),
            Self::AdvertisingFailed => write!(f, "advertising failed"),
            Self::NotifyFailed => write!(f, "notify failed"),
            Self::DisconnectFailed => write!(f, "disconnect failed"),
            Self::InvalidHandle => write!(f, "invalid connection handle"),
        }
    }
}

impl From<BleError> for Error {
    fn from(e: BleError) -> Self {
        Self::Ble(e)
    }
}

// ---------------------------------------------------------------------------
// Device name errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameError {
    Empty,
    /// Longer than fits a legacy advertising packet next to the UUIDs.
    TooLong,
    /// Contains bytes outside printable ASCII.
    NotPrintable,
}

impl fmt::Display for NameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "name is empty"),
            Self::TooLong => write!(f, "name too long"),
            Self::NotPrintable => write!(f, "name contains non-printable characters"),
        }
    }
}

impl From<NameError> for Error {
    fn from(e: NameError) -> Self {
        Self::Name(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
