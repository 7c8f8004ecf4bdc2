//! Inbound commands to the capture service.
//!
//! These are the three actions the user-facing entities (advertising
//! switch, "new MAC" button, BLE name text input) forward into the core.
//! The entities keep no state of their own.

/// Raw operator text; validated by the service before use.
pub type NameInput = heapless::String<64>;

/// Commands that external adapters can send into the capture core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Advertising switch turned on or off.
    SetAdvertising(bool),

    /// Draw and install a new random static address.
    RefreshMac,

    /// Rename the device; restarts advertising when it is running.
    SetBleName(NameInput),
}

impl AppCommand {
    /// Build a `SetBleName` command, truncating input that does not fit.
    /// Over-long names are rejected by validation later anyway.
    pub fn set_ble_name(name: &str) -> Self {
        let mut input = NameInput::new();
        for c in name.chars() {
            if input.push(c).is_err() {
                break;
            }
        }
        Self::SetBleName(input)
    }
}
