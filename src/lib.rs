//! rotkey turns a display with global hotkeys while a watched program runs.
//!
//! Ctrl+Alt+arrow rotates the configured display so the arrow points up;
//! Ctrl+Alt+0 turns it to 90 degrees and back to normal 30 seconds later.

pub mod autostart;
pub mod backends;
pub mod config;
pub mod controller;
pub mod error;
pub mod event_loop;
pub mod feedback;
pub mod guard;
pub mod hotkeys;
pub mod orientation;
pub mod processes;
pub mod signals;
pub mod transform;
pub mod x11;
