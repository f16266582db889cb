//! Error types for rotkey
//!
//! Rotation failures are swallowed by the hotkey controller and only
//! logged, so most variants carry enough text to be useful in a log line.

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Invalid degree of rotation, multiples of 90 only, got {0}")]
    InvalidDegrees(isize),

    #[error("Display index {index} out of range, {count} display(s) connected")]
    InvalidDisplayIndex { index: usize, count: usize },

    #[error("Failed to query display mode: {0}")]
    QueryFailed(String),

    #[error("Display configuration rejected: {0}")]
    ApplyFailed(String),

    #[error("Failed to register hotkey {id}: {reason}")]
    HotkeyRegistrationFailed { id: u32, reason: String },

    #[error("Malformed configuration")]
    Config(#[from] serde_json::Error),

    #[error("X11 error: {0}")]
    X11(String),

    #[error("Underlying I/O error")]
    IOError(#[from] std::io::Error),
}

impl From<x11rb::errors::ConnectError> for Error {
    fn from(e: x11rb::errors::ConnectError) -> Self {
        Error::X11(e.to_string())
    }
}

impl From<x11rb::errors::ConnectionError> for Error {
    fn from(e: x11rb::errors::ConnectionError) -> Self {
        Error::X11(e.to_string())
    }
}

impl From<x11rb::errors::ReplyError> for Error {
    fn from(e: x11rb::errors::ReplyError) -> Self {
        Error::X11(e.to_string())
    }
}

impl From<x11rb::errors::ReplyOrIdError> for Error {
    fn from(e: x11rb::errors::ReplyOrIdError) -> Self {
        Error::X11(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
