//! IRK capture firmware library.
//!
//! Exposes the pure-logic modules for integration testing and host-side
//! simulation. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod ble;
pub mod config;
pub mod error;
pub mod events;
pub mod timing;

// The ESP-IDF-backed implementations are guarded by cfg attributes inside;
// host builds get simulation stand-ins.
pub mod adapters;
pub mod drivers;

mod utils;
