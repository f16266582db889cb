//! The X server connection shared by the RandR backend, the key grabs and
//! the feedback popups.
//!
//! Events arrive on a dedicated pump thread which translates them into
//! [`Message`]s for the main event loop; every request is issued from the
//! main thread.

use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use x11rb::connection::Connection;
use x11rb::protocol::xproto::{Screen, Window};
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;

use crate::error::Result;
use crate::event_loop::Message;
use crate::hotkeys::x11::KeyTable;

pub struct XSession {
    pub conn: RustConnection,
    pub screen_num: usize,
}

impl XSession {
    /// Connect to the display named by `$DISPLAY`.
    pub fn connect() -> Result<Arc<XSession>> {
        let (conn, screen_num) = x11rb::connect(None)?;
        tracing::debug!("Connected to X screen {}", screen_num);
        Ok(Arc::new(XSession { conn, screen_num }))
    }

    pub fn screen(&self) -> &Screen {
        &self.conn.setup().roots[self.screen_num]
    }

    pub fn root(&self) -> Window {
        self.screen().root
    }
}

/// Forward key presses matching a grab, and expose events, to `inbox`.
///
/// When the connection breaks the loop is told to shut down.
pub fn spawn_event_pump(
    session: Arc<XSession>,
    keys: KeyTable,
    inbox: Sender<Message>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        tracing::debug!("X11 event pump started");
        loop {
            let message = match session.conn.wait_for_event() {
                Ok(Event::KeyPress(event)) => {
                    match keys.lookup(event.detail, u16::from(event.state)) {
                        Some(id) => Message::Hotkey(id),
                        None => continue,
                    }
                }
                Ok(Event::Expose(event)) if event.count == 0 => Message::Expose(event.window),
                Ok(_) => continue,
                Err(e) => {
                    tracing::error!("Lost connection to the X server: {}", e);
                    let _ = inbox.send(Message::Shutdown);
                    break;
                }
            };
            if inbox.send(message).is_err() {
                break;
            }
        }
        tracing::debug!("X11 event pump ended");
    })
}
