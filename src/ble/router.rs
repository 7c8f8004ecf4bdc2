//! Connection event router.
//!
//! Translates link notifications from the BLE stack into session updates on
//! the [`CaptureService`]. The router only borrows its collaborators for the
//! duration of one dispatch; the main loop builds one per drained batch.
//!
//! Advertising is re-armed after both connect and disconnect so that further
//! centrals can keep discovering the device while a capture is in progress.

use log::{debug, info};

use crate::app::ports::{ConnectionEvents, EventSink, GapPort};
use crate::app::service::CaptureService;

pub struct ConnectionEventRouter<'a, B, S> {
    service: &'a mut CaptureService,
    ble: &'a mut B,
    sink: &'a mut S,
}

impl<'a, B: GapPort, S: EventSink> ConnectionEventRouter<'a, B, S> {
    pub fn new(service: &'a mut CaptureService, ble: &'a mut B, sink: &'a mut S) -> Self {
        Self { service, ble, sink }
    }
}

impl<B: GapPort, S: EventSink> ConnectionEvents for ConnectionEventRouter<'_, B, S> {
    fn on_connect(&mut self, handle: u16) {
        info!("Device connected (handle {})", handle);
        let session = self.service.session_mut();
        session.conn_handle = Some(handle);
        session.authenticated = false;
        self.service.rearm_advertising(self.ble, self.sink);
    }

    fn on_disconnect(&mut self, handle: u16) {
        info!("Device disconnected (handle {})", handle);
        let session = self.service.session_mut();
        // A late termination of an earlier link must not drop the tracked peer.
        if session.conn_handle == Some(handle) {
            session.conn_handle = None;
            session.authenticated = false;
        }
        self.service.rearm_advertising(self.ble, self.sink);
    }

    fn on_auth_complete(&mut self, encrypted: bool) {
        debug!("Authentication complete (encrypted: {})", encrypted);
        self.service.session_mut().authenticated = encrypted;
    }
}
