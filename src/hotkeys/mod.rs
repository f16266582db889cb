//! Global hotkeys.
//!
//! The binding table is fixed: Ctrl+Alt with an arrow key turns the display
//! so that the arrow points to the top edge, Ctrl+Alt+0 runs the
//! auto-revert sequence.

use bitflags::bitflags;

use crate::error::{Error, Result};
use crate::orientation::Orientation;

pub mod x11;

/// Id of the first binding; the rest follow consecutively.
pub const HOTKEY_BASE: u32 = 7000;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const CTRL = 0b0001;
        const ALT = 0b0010;
        const SHIFT = 0b0100;
        const SUPER = 0b1000;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Right,
    Down,
    Left,
    Digit0,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    RotateTo(Orientation),
    /// Turn to 90 degrees, wait, turn back to 0.
    RotateWithAutoRevert,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HotkeyBinding {
    pub id: u32,
    pub modifiers: Modifiers,
    pub key: Key,
    pub action: Action,
}

pub fn default_bindings() -> Vec<HotkeyBinding> {
    let modifiers = Modifiers::CTRL | Modifiers::ALT;
    [
        (Key::Up, Action::RotateTo(Orientation::Normal)),
        (Key::Right, Action::RotateTo(Orientation::RightUp)),
        (Key::Down, Action::RotateTo(Orientation::Flipped)),
        (Key::Left, Action::RotateTo(Orientation::LeftUp)),
        (Key::Digit0, Action::RotateWithAutoRevert),
    ]
    .iter()
    .zip(HOTKEY_BASE..)
    .map(|(&(key, action), id)| HotkeyBinding {
        id,
        modifiers,
        key,
        action,
    })
    .collect()
}

pub trait HotkeyHost {
    /// Claim the key combination system wide. Fails with
    /// `HotkeyRegistrationFailed` if someone else holds it.
    fn register(&mut self, binding: &HotkeyBinding) -> Result<()>;

    fn unregister(&mut self, id: u32) -> Result<()>;
}

/// For one-shot commands that never listen for hotkeys.
pub struct NoHotkeys;

impl HotkeyHost for NoHotkeys {
    fn register(&mut self, binding: &HotkeyBinding) -> Result<()> {
        Err(Error::HotkeyRegistrationFailed {
            id: binding.id,
            reason: "hotkeys disabled".into(),
        })
    }

    fn unregister(&mut self, _id: u32) -> Result<()> {
        Ok(())
    }
}
