//! Hotkeys as passive key grabs on the X root window.

use std::sync::{Arc, Mutex};

use x11rb::connection::Connection;
use x11rb::errors::ReplyError;
use x11rb::protocol::xproto::{ConnectionExt as _, GrabMode, Keycode, Keysym, ModMask};
use x11rb::protocol::ErrorKind;

use super::{HotkeyBinding, HotkeyHost, Key, Modifiers};
use crate::error::{Error, Result};
use crate::x11::XSession;

/// Grabs are repeated with CapsLock and NumLock (Mod2) set, otherwise the
/// hotkeys go dead whenever a lock key is on.
const LOCK_VARIANTS: [u16; 4] = [0, 0x02, 0x10, 0x02 | 0x10];

/// Shift, Control, Mod1 (Alt) and Mod4 (Super).
const MODIFIER_BITS: u16 = 0x01 | 0x04 | 0x08 | 0x40;

#[derive(Clone, Copy, Debug)]
struct Grab {
    id: u32,
    keycode: Keycode,
    mask: u16,
}

/// Key grabs currently held, shared with the event pump thread.
#[derive(Clone, Default)]
pub struct KeyTable(Arc<Mutex<Vec<Grab>>>);

impl KeyTable {
    /// Binding id for a key press with the given keycode and modifier state.
    pub fn lookup(&self, keycode: Keycode, state: u16) -> Option<u32> {
        let state = state & MODIFIER_BITS;
        let grabs = self.0.lock().ok()?;
        grabs
            .iter()
            .find(|g| g.keycode == keycode && g.mask == state)
            .map(|g| g.id)
    }

    fn insert(&self, grab: Grab) {
        if let Ok(mut grabs) = self.0.lock() {
            grabs.push(grab);
        }
    }

    fn remove(&self, id: u32) -> Option<Grab> {
        let mut grabs = self.0.lock().ok()?;
        let at = grabs.iter().position(|g| g.id == id)?;
        Some(grabs.remove(at))
    }
}

fn keysym(key: Key) -> Keysym {
    match key {
        Key::Left => 0xff51,
        Key::Up => 0xff52,
        Key::Right => 0xff53,
        Key::Down => 0xff54,
        Key::Digit0 => 0x0030,
    }
}

fn modifier_mask(modifiers: Modifiers) -> u16 {
    let mut mask = 0;
    if modifiers.contains(Modifiers::SHIFT) {
        mask |= 0x01;
    }
    if modifiers.contains(Modifiers::CTRL) {
        mask |= 0x04;
    }
    if modifiers.contains(Modifiers::ALT) {
        mask |= 0x08;
    }
    if modifiers.contains(Modifiers::SUPER) {
        mask |= 0x40;
    }
    mask
}

pub struct XGrabHost {
    session: Arc<XSession>,
    keys: KeyTable,
}

impl XGrabHost {
    pub fn new(session: Arc<XSession>) -> Self {
        XGrabHost {
            session,
            keys: KeyTable::default(),
        }
    }

    pub fn key_table(&self) -> KeyTable {
        self.keys.clone()
    }

    fn keycode_for(&self, key: Key) -> Result<Keycode> {
        let conn = &self.session.conn;
        let min_keycode = conn.setup().min_keycode;
        let max_keycode = conn.setup().max_keycode;
        let mapping = conn
            .get_keyboard_mapping(min_keycode, max_keycode - min_keycode + 1)?
            .reply()?;
        let per_keycode = usize::from(mapping.keysyms_per_keycode.max(1));
        let wanted = keysym(key);

        mapping
            .keysyms
            .chunks(per_keycode)
            .position(|syms| syms.contains(&wanted))
            .map(|i| min_keycode + i as u8)
            .ok_or_else(|| Error::X11(format!("no keycode produces {:?}", key)))
    }
}

impl HotkeyHost for XGrabHost {
    fn register(&mut self, binding: &HotkeyBinding) -> Result<()> {
        let failed = |reason: String| Error::HotkeyRegistrationFailed {
            id: binding.id,
            reason,
        };
        let keycode = self
            .keycode_for(binding.key)
            .map_err(|e| failed(e.to_string()))?;
        let mask = modifier_mask(binding.modifiers);
        let conn = &self.session.conn;
        let root = self.session.root();

        for (i, lock) in LOCK_VARIANTS.iter().enumerate() {
            let grabbed = conn
                .grab_key(
                    false,
                    root,
                    ModMask::from(mask | lock),
                    keycode,
                    GrabMode::ASYNC,
                    GrabMode::ASYNC,
                )
                .map_err(ReplyError::from)
                .and_then(|cookie| cookie.check());
            if let Err(e) = grabbed {
                for lock in &LOCK_VARIANTS[..i] {
                    let _ = conn.ungrab_key(keycode, root, ModMask::from(mask | lock));
                }
                let _ = conn.flush();
                let reason = match e {
                    ReplyError::X11Error(ref x) if x.error_kind == ErrorKind::Access => {
                        "already grabbed by another client".to_owned()
                    }
                    other => other.to_string(),
                };
                return Err(failed(reason));
            }
        }

        self.keys.insert(Grab {
            id: binding.id,
            keycode,
            mask,
        });
        tracing::debug!(
            "Grabbed {:?}+{:?} (keycode {}) as hotkey {}",
            binding.modifiers,
            binding.key,
            keycode,
            binding.id
        );
        Ok(())
    }

    fn unregister(&mut self, id: u32) -> Result<()> {
        let grab = match self.keys.remove(id) {
            Some(grab) => grab,
            None => return Ok(()),
        };
        let conn = &self.session.conn;
        let root = self.session.root();
        for lock in &LOCK_VARIANTS {
            conn.ungrab_key(grab.keycode, root, ModMask::from(grab.mask | lock))?;
        }
        conn.flush()?;
        Ok(())
    }
}
