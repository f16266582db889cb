//! Display backends.
//!
//! A backend enumerates the connected displays, reads the mode a display is
//! currently running and applies a new one. The orientation arithmetic lives
//! in [`crate::transform`]; backends only move modes in and out of the
//! display server.

use std::fmt;

use crate::error::Result;
use crate::orientation::Orientation;

pub mod dummy;
pub mod randr;

/// Opaque handle a backend uses to address one monitor.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DeviceId(pub String);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The mode a display is running, as read back from the display server.
///
/// `width` and `height` are the dimensions of the scanned-out area, so they
/// are already swapped relative to the panel's native mode whenever the
/// orientation lies on the swapped axis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayMode {
    pub device: DeviceId,
    pub orientation: Orientation,
    pub width: u32,
    pub height: u32,
}

pub trait DisplayApi {
    /// Connected displays, in a stable order. Indexes into this list are
    /// what the configuration's `screenIndex` refers to.
    fn displays(&mut self) -> Result<Vec<DeviceId>>;

    /// Get the mode the target display is currently running.
    fn current_mode(&mut self, device: &DeviceId) -> Result<DisplayMode>;

    /// Change the mode of the target display.
    ///
    /// Either the whole mode is applied or nothing changes.
    fn apply_mode(&mut self, mode: &DisplayMode, persist: bool) -> Result<()>;
}
