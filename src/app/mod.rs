//! Application core — capture logic, zero direct I/O.
//!
//! This module contains the rules of the IRK capture peripheral: the
//! capture loop, user commands, and the events published to the outside.
//! All interaction with the BLE stack happens through **port traits**
//! defined in [`ports`], keeping this layer testable without a radio.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
