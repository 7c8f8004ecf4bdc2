//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing capture events to the ESP-IDF
//! logger (UART / USB-CDC in production). The UI entities of a host
//! framework (advertising switch state, IRK and address text sensors)
//! would implement the same trait.

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started {
                name,
                identity,
                advertising,
            } => match identity {
                Some(id) => info!(
                    "START | name='{}' mac={} advertising={}",
                    name, id, advertising
                ),
                None => info!("START | name='{}' mac=default advertising={}", name, advertising),
            },
            AppEvent::AdvertisingChanged(on) => {
                info!("ADV   | {}", if *on { "on" } else { "off" });
            }
            AppEvent::AddressChanged(id) => {
                info!("MAC   | {}", id);
            }
            AppEvent::NameChanged(name) => {
                info!("NAME  | '{}'", name);
            }
            AppEvent::IrkCaptured { irk, address } => {
                info!("IRK   | {} address={}", irk, address);
            }
        }
    }
}
