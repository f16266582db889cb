//! Transient on-screen feedback after a rotation.
//!
//! Each notification closes on its own timer; the controller owns the
//! timers, notifiers only open and close surfaces.

use crate::error::Result;
use crate::orientation::Orientation;

pub mod x11;

pub type FeedbackId = u64;

pub trait Notifier {
    /// Show the orientation a display just turned to.
    fn show(&mut self, orientation: Orientation) -> Result<FeedbackId>;

    fn close(&mut self, id: FeedbackId);

    /// The display server asked for `surface` to be repainted.
    fn expose(&mut self, _surface: u32) {}
}

/// Writes notifications to the log instead of the screen.
#[derive(Default)]
pub struct LogNotifier {
    next_id: FeedbackId,
}

impl Notifier for LogNotifier {
    fn show(&mut self, orientation: Orientation) -> Result<FeedbackId> {
        self.next_id += 1;
        tracing::info!("Current angle: {}", orientation);
        Ok(self.next_id)
    }

    fn close(&mut self, id: FeedbackId) {
        tracing::trace!("feedback {} closed", id);
    }
}
