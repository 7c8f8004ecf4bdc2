//! Fuzz target: `parse_mac` / `DeviceIdentity::from_str`
//!
//! Feeds arbitrary text into the MAC parser and asserts that anything it
//! accepts formats back to the same address.
//!
//! cargo fuzz run fuzz_parse_mac

#![no_main]

use irkcapture::ble::address::{DeviceIdentity, format_mac, parse_mac};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };

    if let Ok(bytes) = parse_mac(text) {
        // Parsed bytes are in display order; formatting expects storage order.
        let mut storage = bytes;
        storage.reverse();
        assert!(
            format_mac(&storage).eq_ignore_ascii_case(text),
            "accepted MAC must format back to its input"
        );
    }

    let _ = text.parse::<DeviceIdentity>();
});
