//! Dummy backend.
//!
//! This is purely for testing or debugging.
//! It logs changes and keeps every display's mode in memory. Like a real
//! display driver it refuses a mode whose resolution does not fit the
//! panel in the requested orientation.

use std::cell::RefCell;
use std::rc::Rc;

use super::{DeviceId, DisplayApi, DisplayMode};
use crate::error::{Error, Result};
use crate::orientation::{Axis, Orientation};

struct DummyDisplay {
    mode: DisplayMode,
    native: (u32, u32),
    unsupported: Vec<Orientation>,
}

#[derive(Default)]
struct State {
    displays: Vec<DummyDisplay>,
    applied: Vec<DisplayMode>,
    queries_fail: bool,
}

/// Cloning yields another handle onto the same displays, so a test can keep
/// one while the controller owns the other.
#[derive(Clone, Default)]
pub struct DummyBackend {
    state: Rc<RefCell<State>>,
}

impl DummyBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single 1920x1080 display in its normal orientation.
    pub fn single_1080p() -> Self {
        let backend = Self::new();
        backend.add_display("DUMMY-0", 1920, 1080, Orientation::Normal);
        backend
    }

    /// Add a display whose native (unrotated) resolution is `width`x`height`,
    /// currently running at `orientation`.
    pub fn add_display(&self, name: &str, width: u32, height: u32, orientation: Orientation) {
        let (w, h) = match orientation.axis() {
            Axis::Native => (width, height),
            Axis::Swapped => (height, width),
        };
        self.state.borrow_mut().displays.push(DummyDisplay {
            mode: DisplayMode {
                device: DeviceId(name.to_owned()),
                orientation,
                width: w,
                height: h,
            },
            native: (width, height),
            unsupported: Vec::new(),
        });
    }

    /// Make the display at `index` reject `orientation`.
    pub fn reject(&self, index: usize, orientation: Orientation) {
        if let Some(display) = self.state.borrow_mut().displays.get_mut(index) {
            display.unsupported.push(orientation);
        }
    }

    pub fn fail_queries(&self, fail: bool) {
        self.state.borrow_mut().queries_fail = fail;
    }

    pub fn mode(&self, index: usize) -> Option<DisplayMode> {
        self.state
            .borrow()
            .displays
            .get(index)
            .map(|d| d.mode.clone())
    }

    /// Every mode successfully applied so far, oldest first.
    pub fn applied(&self) -> Vec<DisplayMode> {
        self.state.borrow().applied.clone()
    }
}

impl DisplayApi for DummyBackend {
    fn displays(&mut self) -> Result<Vec<DeviceId>> {
        let state = self.state.borrow();
        if state.queries_fail {
            return Err(Error::QueryFailed("display list: query disabled".into()));
        }
        Ok(state
            .displays
            .iter()
            .map(|d| d.mode.device.clone())
            .collect())
    }

    fn current_mode(&mut self, device: &DeviceId) -> Result<DisplayMode> {
        let state = self.state.borrow();
        if state.queries_fail {
            return Err(Error::QueryFailed(format!("{}: query disabled", device)));
        }
        state
            .displays
            .iter()
            .find(|d| &d.mode.device == device)
            .map(|d| d.mode.clone())
            .ok_or_else(|| Error::QueryFailed(format!("{}: no such display", device)))
    }

    fn apply_mode(&mut self, mode: &DisplayMode, persist: bool) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let display = state
            .displays
            .iter_mut()
            .find(|d| d.mode.device == mode.device)
            .ok_or_else(|| Error::ApplyFailed(format!("{}: no such display", mode.device)))?;

        if display.unsupported.contains(&mode.orientation) {
            return Err(Error::ApplyFailed(format!(
                "{}: orientation {} not supported",
                mode.device, mode.orientation
            )));
        }
        let (w, h) = display.native;
        let expected = match mode.orientation.axis() {
            Axis::Native => (w, h),
            Axis::Swapped => (h, w),
        };
        if (mode.width, mode.height) != expected {
            return Err(Error::ApplyFailed(format!(
                "{}: {}x{} does not fit {} (expected {}x{})",
                mode.device, mode.width, mode.height, mode.orientation, expected.0, expected.1
            )));
        }

        tracing::info!(
            "dummy: {} now {} at {}x{} (persist: {})",
            mode.device,
            mode.orientation,
            mode.width,
            mode.height,
            persist
        );
        display.mode = mode.clone();
        state.applied.push(mode.clone());
        Ok(())
    }
}
