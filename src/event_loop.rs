//! Single-threaded event loop.
//!
//! Hotkey fires and repaint requests arrive as messages; timers live in the
//! controller. Between messages the loop sleeps until the earliest timer
//! deadline, so a hotkey pressed during a pending revert is handled at once.

use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread;
use std::time::Instant;

use crate::controller::Controller;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Message {
    /// A registered hotkey with this binding id was pressed.
    Hotkey(u32),
    /// A feedback surface needs repainting.
    Expose(u32),
    Shutdown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunMode {
    /// Until a `Shutdown` message arrives or every sender is gone.
    Forever,
    /// Until no timers are left.
    UntilIdle,
}

pub fn run(controller: &mut Controller, inbox: &Receiver<Message>, mode: RunMode) {
    loop {
        controller.run_due(Instant::now());
        let deadline = controller.next_deadline();
        if deadline.is_none() && mode == RunMode::UntilIdle {
            return;
        }

        let received = match deadline {
            Some(deadline) => {
                inbox.recv_timeout(deadline.saturating_duration_since(Instant::now()))
            }
            None => inbox.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };
        match received {
            Ok(Message::Shutdown) => {
                controller.handle(Message::Shutdown, Instant::now());
                return;
            }
            Ok(message) => controller.handle(message, Instant::now()),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => match deadline {
                // Nobody can send anymore; sit out the remaining timers.
                Some(deadline) => thread::sleep(deadline.saturating_duration_since(Instant::now())),
                None => return,
            },
        }
    }
}
