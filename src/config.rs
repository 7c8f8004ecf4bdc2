//! Capture configuration parameters
//!
//! All tunable parameters for the IRK capture peripheral. Defaults match a
//! heart-rate peripheral that phones and earbuds readily bond with. A JSON
//! override can be baked in at build time (see `main.rs`).

use serde::{Deserialize, Serialize};

use crate::error::NameError;
use crate::utils::is_printable_ascii;

/// Longest name that still fits a legacy advertising packet next to the
/// flags, appearance and two 16-bit service UUIDs.
pub const MAX_NAME_LEN: usize = 29;

/// BLE device name, fixed capacity.
pub type BleName = heapless::String<MAX_NAME_LEN>;

/// Manufacturer string exposed through the Device Information service.
pub type Manufacturer = heapless::String<32>;

/// Validate and copy a BLE device name.
pub fn parse_ble_name(raw: &str) -> Result<BleName, NameError> {
    if raw.is_empty() {
        return Err(NameError::Empty);
    }
    if raw.len() > MAX_NAME_LEN {
        return Err(NameError::TooLong);
    }
    if !is_printable_ascii(raw) {
        return Err(NameError::NotPrintable);
    }
    let mut name = BleName::new();
    name.push_str(raw).map_err(|()| NameError::TooLong)?;
    Ok(name)
}

/// Errors from [`CaptureConfig::validate`] and [`CaptureConfig::from_json`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// JSON could not be parsed into a config.
    Malformed,
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Malformed => write!(f, "config malformed"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::Malformed => Self::Config("malformed"),
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
        }
    }
}

/// Core capture configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    // --- Identity ---
    /// Name advertised and reported as the Device Information model string
    pub ble_name: BleName,
    /// Device Information manufacturer string
    pub manufacturer: Manufacturer,
    /// Start advertising as soon as the stack is up
    pub start_on_boot: bool,

    // --- Timing ---
    /// Minimum spacing between capture loop passes (milliseconds)
    pub loop_interval_ms: u32,
    /// Minimum spacing between heart-rate notifications (milliseconds)
    pub notify_interval_ms: u32,
    /// One slice of the watchdog-safe settle wait around advertising restarts
    pub settle_slice_ms: u32,

    // --- Advertising ---
    /// GAP appearance (0x0340 = generic heart rate sensor)
    pub appearance: u16,
    /// Minimum advertising interval (units of 0.625 ms)
    pub adv_min_interval: u16,
    /// Maximum advertising interval (units of 0.625 ms)
    pub adv_max_interval: u16,

    // --- GATT values ---
    /// Flags byte of the heart-rate measurement notification
    pub heart_rate_flags: u8,
    /// Fixed battery level (0-100%)
    pub battery_level: u8,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        let mut ble_name = BleName::new();
        let _ = ble_name.push_str("Beats Solo4");
        let mut manufacturer = Manufacturer::new();
        let _ = manufacturer.push_str("ESPresense");

        Self {
            ble_name,
            manufacturer,
            start_on_boot: true,

            // Timing
            loop_interval_ms: 500,   // 2 Hz
            notify_interval_ms: 250,
            settle_slice_ms: 100,

            // Advertising
            appearance: 0x0340,
            adv_min_interval: 0x20, // 20 ms
            adv_max_interval: 0x40, // 40 ms

            // GATT
            heart_rate_flags: 0x06, // sensor contact supported + detected
            battery_level: 100,
        }
    }
}

impl CaptureConfig {
    /// Parse a JSON override; missing fields fall back to defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json).map_err(|_| ConfigError::Malformed)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Range-check every field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if parse_ble_name(&self.ble_name).is_err() {
            return Err(ConfigError::ValidationFailed(
                "ble_name must be 1-29 printable ASCII bytes",
            ));
        }
        if self.loop_interval_ms == 0 || self.notify_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("intervals must be non-zero"));
        }
        if self.notify_interval_ms > self.loop_interval_ms {
            return Err(ConfigError::ValidationFailed(
                "notify_interval_ms must not exceed loop_interval_ms",
            ));
        }
        if self.adv_min_interval < 0x20 {
            return Err(ConfigError::ValidationFailed("adv_min_interval below 20 ms"));
        }
        if self.adv_min_interval > self.adv_max_interval {
            return Err(ConfigError::ValidationFailed(
                "adv_min_interval exceeds adv_max_interval",
            ));
        }
        if self.battery_level > 100 {
            return Err(ConfigError::ValidationFailed("battery_level above 100"));
        }
        Ok(())
    }
}
