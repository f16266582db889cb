//! Hotkey action controller.
//!
//! Owns everything the daemon touches: settings, the display backend, the
//! process list, the feedback notifier and the hotkey grabs. Hotkey fires
//! and timer expiry both arrive through [`Controller::handle`] and
//! [`Controller::run_due`] on the event loop thread, one at a time.
//!
//! Timers are one-shot and never cancelled. A rotation issued while an
//! auto-revert is pending takes effect immediately, and the revert still
//! turns the display back to 0 degrees once its delay is up.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

use crate::backends::{DisplayApi, DisplayMode};
use crate::config::ConfigStore;
use crate::error::Result;
use crate::event_loop::Message;
use crate::feedback::{FeedbackId, Notifier};
use crate::guard;
use crate::hotkeys::{default_bindings, Action, HotkeyBinding, HotkeyHost};
use crate::orientation::Orientation;
use crate::processes::ProcessSource;
use crate::transform;

/// How long the auto-revert sequence stays at 90 degrees.
pub const REVERT_DELAY: Duration = Duration::from_secs(30);

/// How long a feedback notification stays on screen.
pub const FEEDBACK_LIFETIME: Duration = Duration::from_secs(5);

#[derive(Debug)]
enum Task {
    Revert { display_index: usize },
    CloseFeedback(FeedbackId),
}

struct Scheduled {
    deadline: Instant,
    seq: u64,
    task: Task,
}

// Reversed so the BinaryHeap pops the earliest deadline first; `seq` keeps
// timers with equal deadlines in scheduling order.
impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        (other.deadline, other.seq).cmp(&(self.deadline, self.seq))
    }
}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for Scheduled {}

pub struct Controller {
    config: ConfigStore,
    display: Box<dyn DisplayApi>,
    processes: Box<dyn ProcessSource>,
    notifier: Box<dyn Notifier>,
    hotkeys: Box<dyn HotkeyHost>,
    bindings: Vec<HotkeyBinding>,
    registered: Vec<u32>,
    timers: BinaryHeap<Scheduled>,
    next_seq: u64,
}

impl Controller {
    pub fn new(
        config: ConfigStore,
        display: Box<dyn DisplayApi>,
        processes: Box<dyn ProcessSource>,
        notifier: Box<dyn Notifier>,
        hotkeys: Box<dyn HotkeyHost>,
    ) -> Self {
        Controller {
            config,
            display,
            processes,
            notifier,
            hotkeys,
            bindings: default_bindings(),
            registered: Vec::new(),
            timers: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    /// Register every hotkey binding. A binding that cannot be registered
    /// is skipped; returns how many succeeded.
    pub fn start(&mut self) -> usize {
        for binding in &self.bindings {
            match self.hotkeys.register(binding) {
                Ok(()) => self.registered.push(binding.id),
                Err(e) => tracing::warn!("{}", e),
            }
        }
        tracing::info!(
            "Registered {} of {} hotkeys",
            self.registered.len(),
            self.bindings.len()
        );
        self.registered.len()
    }

    /// Release the hotkeys and close any feedback still on screen.
    /// Pending reverts are dropped.
    pub fn shutdown(&mut self) {
        for id in self.registered.drain(..) {
            if let Err(e) = self.hotkeys.unregister(id) {
                tracing::warn!("Unable to release hotkey {}: {}", id, e);
            }
        }
        let mut dropped_reverts = 0;
        for scheduled in self.timers.drain() {
            match scheduled.task {
                Task::CloseFeedback(id) => self.notifier.close(id),
                Task::Revert { .. } => dropped_reverts += 1,
            }
        }
        if dropped_reverts > 0 {
            tracing::info!("Dropping {} pending revert(s)", dropped_reverts);
        }
    }

    pub fn handle(&mut self, message: Message, now: Instant) {
        match message {
            Message::Hotkey(id) => self.on_hotkey(id, now),
            Message::Expose(surface) => self.notifier.expose(surface),
            Message::Shutdown => self.shutdown(),
        }
    }

    fn on_hotkey(&mut self, id: u32, now: Instant) {
        let action = match self
            .bindings
            .iter()
            .find(|b| b.id == id && self.registered.contains(&b.id))
        {
            Some(binding) => binding.action,
            None => {
                tracing::debug!("Ignoring unknown hotkey {}", id);
                return;
            }
        };
        if !self.evaluate_guard() {
            tracing::debug!("Hotkey {} ignored, watched process not running", id);
            return;
        }

        let display_index = self.display_index();
        let result = match action {
            Action::RotateTo(orientation) => self.apply_rotation(display_index, orientation, now),
            Action::RotateWithAutoRevert => self.fire_auto_revert_sequence(display_index, now),
        };
        if let Err(e) = result {
            tracing::warn!("Hotkey {}: {}", id, e);
        }
    }

    /// Whether hotkey actions may run right now. Picks up edited settings
    /// first.
    pub fn evaluate_guard(&mut self) -> bool {
        let config = self.config.refresh().guard();
        guard::permits(&config, self.processes.as_mut())
    }

    /// Configured display, or the first one if the configured index no
    /// longer exists.
    fn display_index(&mut self) -> usize {
        match self.display.displays() {
            Ok(displays) => self.config.get().screen_index_within(displays.len()),
            Err(e) => {
                tracing::warn!("Unable to list displays, using display 0: {}", e);
                0
            }
        }
    }

    /// Rotate one display and show the resulting angle.
    pub fn apply_rotation(
        &mut self,
        display_index: usize,
        orientation: Orientation,
        now: Instant,
    ) -> Result<DisplayMode> {
        let mode = transform::apply(self.display.as_mut(), display_index, orientation)?;
        self.show_feedback(mode.orientation, now);
        Ok(mode)
    }

    /// Turn to 90 degrees now and back to 0 after [`REVERT_DELAY`].
    ///
    /// The revert is scheduled even if the first rotation fails, so the
    /// sequence always ends with the display turned back.
    pub fn fire_auto_revert_sequence(
        &mut self,
        display_index: usize,
        now: Instant,
    ) -> Result<DisplayMode> {
        let result = self.apply_rotation(display_index, Orientation::RightUp, now);
        self.schedule(now + REVERT_DELAY, Task::Revert { display_index });
        result
    }

    fn show_feedback(&mut self, orientation: Orientation, now: Instant) {
        match self.notifier.show(orientation) {
            Ok(id) => self.schedule(now + FEEDBACK_LIFETIME, Task::CloseFeedback(id)),
            Err(e) => tracing::warn!("Unable to show feedback: {}", e),
        }
    }

    fn schedule(&mut self, deadline: Instant, task: Task) {
        self.next_seq += 1;
        self.timers.push(Scheduled {
            deadline,
            seq: self.next_seq,
            task,
        });
    }

    /// Earliest pending timer.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.peek().map(|s| s.deadline)
    }

    /// Run every timer due at `now`. Returns how many ran.
    pub fn run_due(&mut self, now: Instant) -> usize {
        let mut ran = 0;
        while self.timers.peek().map_or(false, |s| s.deadline <= now) {
            let scheduled = match self.timers.pop() {
                Some(scheduled) => scheduled,
                None => break,
            };
            ran += 1;
            match scheduled.task {
                Task::CloseFeedback(id) => self.notifier.close(id),
                Task::Revert { display_index } => {
                    if let Err(e) = self.apply_rotation(display_index, Orientation::Normal, now) {
                        tracing::warn!("Auto-revert of display {}: {}", display_index, e);
                    }
                }
            }
        }
        ran
    }

    pub fn pending_reverts(&self) -> usize {
        self.timers
            .iter()
            .filter(|s| matches!(s.task, Task::Revert { .. }))
            .count()
    }
}
