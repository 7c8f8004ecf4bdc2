//! Callback bridge between the BLE host task and the main loop.
//!
//! NimBLE delivers GAP callbacks on its own host task. Rather than touching
//! the capture session from there, callbacks push a [`BleEvent`] into a
//! bounded channel and the main loop drains it right before each `tick()`.
//! Session updates and polling are thereby serialised on one task.
//!
//! User actions (switch, button, text input) travel the same way through a
//! second channel of [`AppCommand`]s.
//!
//! ```text
//! ┌──────────────────┐  push_ble_event  ┌──────────────┐
//! │ NimBLE host task │─────────────────▶│              │  dispatch_ble_events
//! └──────────────────┘                  │   Channels   │───────────────────▶ ConnectionEvents
//! ┌──────────────────┐  submit_command  │ (bounded, 16)│  take_command
//! │ UI / integration │─────────────────▶│              │───────────────────▶ CaptureService
//! └──────────────────┘                  └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{debug, warn};

use crate::app::commands::AppCommand;
use crate::app::ports::ConnectionEvents;

/// Maximum number of pending events per channel.
pub const EVENT_QUEUE_CAP: usize = 16;

/// Link notification as delivered by the host stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BleEvent {
    Connected { handle: u16 },
    Disconnected { handle: u16, reason: i32 },
    AuthComplete { handle: u16, encrypted: bool, bonded: bool },
}

static BLE_EVENTS: Channel<CriticalSectionRawMutex, BleEvent, EVENT_QUEUE_CAP> = Channel::new();
static COMMANDS: Channel<CriticalSectionRawMutex, AppCommand, EVENT_QUEUE_CAP> = Channel::new();

// ── BLE events ────────────────────────────────────────────────

/// Queue a link notification. Safe to call from the host task.
/// Returns `false` if the queue is full (event dropped).
pub fn push_ble_event(event: BleEvent) -> bool {
    if BLE_EVENTS.try_send(event).is_err() {
        warn!("BLE event queue full, dropping {:?}", event);
        return false;
    }
    true
}

/// Pop the next link notification, if any.
pub fn pop_ble_event() -> Option<BleEvent> {
    BLE_EVENTS.try_receive().ok()
}

/// Drain all pending link notifications into `target`, in FIFO order.
pub fn dispatch_ble_events(target: &mut impl ConnectionEvents) -> usize {
    let mut n = 0;
    while let Some(event) = pop_ble_event() {
        dispatch(event, target);
        n += 1;
    }
    n
}

/// Route one notification to the matching `ConnectionEvents` method.
pub fn dispatch(event: BleEvent, target: &mut impl ConnectionEvents) {
    match event {
        BleEvent::Connected { handle } => target.on_connect(handle),
        BleEvent::Disconnected { handle, reason } => {
            debug!("Link {} closed, reason {}", handle, reason);
            target.on_disconnect(handle);
        }
        BleEvent::AuthComplete {
            handle,
            encrypted,
            bonded,
        } => {
            debug!(
                "Auth complete on {}: encrypted={} bonded={}",
                handle, encrypted, bonded
            );
            target.on_auth_complete(encrypted);
        }
    }
}

// ── User commands ─────────────────────────────────────────────

/// Queue a user command for the main loop.
/// Returns `false` if the queue is full (command dropped).
pub fn submit_command(cmd: AppCommand) -> bool {
    match COMMANDS.try_send(cmd) {
        Ok(()) => true,
        Err(_) => {
            warn!("Command queue full, dropping command");
            false
        }
    }
}

/// Pop the next pending user command.
pub fn take_command() -> Option<AppCommand> {
    COMMANDS.try_receive().ok()
}

/// The channels are process-wide statics; tests that touch them hold this.
#[cfg(test)]
pub(crate) fn test_lock() -> std::sync::MutexGuard<'static, ()> {
    static SERIAL: std::sync::Mutex<()> = std::sync::Mutex::new(());
    SERIAL.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}
