//! Turn SIGINT and SIGTERM into a `Shutdown` message, so hotkeys are
//! released and open popups closed before the daemon exits.

use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

use nix::sys::signal::{SigSet, Signal};

use crate::error::Result;
use crate::event_loop::Message;

fn termination() -> SigSet {
    let mut set = SigSet::empty();
    set.add(Signal::SIGINT);
    set.add(Signal::SIGTERM);
    set
}

/// Block SIGINT and SIGTERM and forward the first one to `inbox`.
///
/// Must be called before any other thread is spawned: threads inherit the
/// signal mask, and an unblocked thread would take the default action.
pub fn forward_termination(inbox: Sender<Message>) -> Result<JoinHandle<()>> {
    let set = termination();
    set.thread_block().map_err(std::io::Error::from)?;
    Ok(thread::spawn(move || match forward_once(&set, &inbox) {
        Ok(signal) => tracing::info!("Received {}, shutting down", signal),
        Err(e) => tracing::warn!("Unable to wait for signals: {}", e),
    }))
}

fn forward_once(set: &SigSet, inbox: &Sender<Message>) -> Result<Signal> {
    let signal = set.wait().map_err(std::io::Error::from)?;
    // The loop may be gone already.
    let _ = inbox.send(Message::Shutdown);
    Ok(signal)
}
