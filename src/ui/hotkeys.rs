//! Process-wide key bindings with deterministic teardown.
//!
//! The event loop sees every key press; components register the
//! combinations they own while mounted and deregister them on unmount.
//! Release is an explicit call so it never depends on drop timing.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

pub type HotkeyId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyCombo {
    pub modifiers: KeyModifiers,
    pub code: KeyCode,
}

impl KeyCombo {
    pub const fn ctrl(c: char) -> Self {
        Self {
            modifiers: KeyModifiers::CONTROL,
            code: KeyCode::Char(c),
        }
    }

    pub fn matches(&self, key: &KeyEvent) -> bool {
        key.kind == KeyEventKind::Press
            && key.modifiers == self.modifiers
            && key.code == self.code
    }
}

#[derive(Debug, Default)]
pub struct HotkeyRegistry {
    next: HotkeyId,
    bindings: Vec<(HotkeyId, KeyCombo)>,
}

impl HotkeyRegistry {
    pub fn register(&mut self, combo: KeyCombo) -> HotkeyId {
        self.next += 1;
        self.bindings.push((self.next, combo));
        self.next
    }

    /// Returns false if the id was already released.
    pub fn deregister(&mut self, id: HotkeyId) -> bool {
        let before = self.bindings.len();
        self.bindings.retain(|(bid, _)| *bid != id);
        self.bindings.len() != before
    }

    /// First registered binding matching the key press, if any.
    pub fn hit(&self, key: &KeyEvent) -> Option<HotkeyId> {
        self.bindings
            .iter()
            .find(|(_, combo)| combo.matches(key))
            .map(|(id, _)| *id)
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
