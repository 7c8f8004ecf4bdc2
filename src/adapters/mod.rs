//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements                             | Connects to                 |
//! |------------|----------------------------------------|-----------------------------|
//! | `nimble`   | GapPort, ConnectionPort, BondStorePort | NimBLE host / in-memory sim |
//! | `log_sink` | EventSink                              | Serial log output           |
//! | `time`     | ClockPort                              | ESP32 system timer          |
//! | `entropy`  | EntropyPort                            | Hardware RNG / xorshift     |
//!
//! The task watchdog (`KeepAlivePort`) lives in `drivers::watchdog`.

pub mod entropy;
pub mod log_sink;
pub mod nimble;
pub mod time;
