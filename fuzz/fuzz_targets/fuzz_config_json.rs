//! Fuzz target: `CaptureConfig::from_json`
//!
//! Arbitrary JSON must either be rejected or produce a config that passes
//! its own validation.
//!
//! cargo fuzz run fuzz_config_json

#![no_main]

use irkcapture::config::CaptureConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };

    if let Ok(cfg) = CaptureConfig::from_json(text) {
        assert!(cfg.validate().is_ok(), "from_json must only return valid configs");
    }
});
