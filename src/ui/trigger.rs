//! The trigger surface: a labelled button plus the global Ctrl+K binding.
//!
//! The trigger only ever produces open/toggle intents; it never closes the
//! dialog directly (the shortcut toggles, which is what lets the same key
//! close it again).

use crossterm::event::KeyEvent;
use ratatui::layout::{Position, Rect};

use crate::overlay::DialogEvent;
use crate::ui::hotkeys::{HotkeyId, HotkeyRegistry, KeyCombo};

pub const SHORTCUT: KeyCombo = KeyCombo::ctrl('k');
pub const SHORTCUT_LABEL: &str = "Ctrl+K";

pub struct Trigger {
    label: String,
    hotkey: HotkeyId,
}

impl Trigger {
    /// Register the global shortcut. Pair with [`unmount`](Self::unmount).
    pub fn mount(registry: &mut HotkeyRegistry, label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            hotkey: registry.register(SHORTCUT),
        }
    }

    /// Deterministic release of the key binding, however teardown happens.
    pub fn unmount(self, registry: &mut HotkeyRegistry) {
        let released = registry.deregister(self.hotkey);
        debug_assert!(released, "trigger hotkey released twice");
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Global shortcut observation. A hit consumes the key (the caller must
    /// not forward it to the focused input) and yields a toggle intent.
    pub fn on_key(&self, registry: &HotkeyRegistry, key: &KeyEvent) -> Option<DialogEvent> {
        (registry.hit(key) == Some(self.hotkey)).then_some(DialogEvent::Shortcut)
    }

    /// Pointer activation of the button. `button` is the rect the view
    /// rendered it at, if it has rendered yet; unknown geometry no-ops.
    pub fn on_click(&self, button: Option<Rect>, column: u16, row: u16) -> Option<DialogEvent> {
        button?
            .contains(Position::new(column, row))
            .then_some(DialogEvent::Activate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEventKind, KeyModifiers};

    #[test]
    fn shortcut_yields_toggle_and_unmount_releases() {
        let mut reg = HotkeyRegistry::default();
        let trigger = Trigger::mount(&mut reg, "Search");

        let mut ctrl_k = KeyEvent::new(KeyCode::Char('k'), KeyModifiers::CONTROL);
        ctrl_k.kind = KeyEventKind::Press;
        assert_eq!(trigger.on_key(&reg, &ctrl_k), Some(DialogEvent::Shortcut));

        let other = KeyEvent::new(KeyCode::Char('k'), KeyModifiers::NONE);
        assert_eq!(trigger.on_key(&reg, &other), None);

        trigger.unmount(&mut reg);
        assert!(reg.is_empty(), "no orphaned bindings after unmount");
    }

    #[test]
    fn click_requires_known_button_geometry() {
        let mut reg = HotkeyRegistry::default();
        let trigger = Trigger::mount(&mut reg, "Search");
        let rect = Rect::new(10, 0, 8, 1);

        assert_eq!(
            trigger.on_click(Some(rect), 12, 0),
            Some(DialogEvent::Activate)
        );
        assert_eq!(trigger.on_click(Some(rect), 2, 0), None);
        assert_eq!(trigger.on_click(None, 12, 0), None);
        trigger.unmount(&mut reg);
    }
}
