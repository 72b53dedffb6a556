//! Keyboard shortcut matching.
//!
//! Bindings match on key plus an *exact* modifier set: every modifier a
//! binding leaves `false` must be absent in the input. The one documented
//! exception is `meta`, which is compared only when a binding specifies
//! it — on macOS the primary modifier reports as the meta key, and
//! requiring its absence everywhere would break every Ctrl-style binding
//! there. Modifier-only bindings (no key) drive pointer-modal behaviors
//! such as box-select while a modifier is held.

use crate::env::Environment;
use crate::input::KeyInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortcutBinding {
    /// `None` makes this a modifier-only binding.
    pub key: Option<&'static str>,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    /// `None` = ignore the meta key entirely (the macOS aliasing
    /// exception); `Some(x)` = require it to equal `x`.
    pub meta: Option<bool>,
    /// Input-event name the binding triggers.
    pub action: &'static str,
}

impl ShortcutBinding {
    pub const fn plain(key: &'static str, action: &'static str) -> Self {
        Self { key: Some(key), ctrl: false, shift: false, alt: false, meta: None, action }
    }

    fn matches(&self, input: &KeyInput) -> bool {
        if let Some(key) = self.key
            && !key.eq_ignore_ascii_case(&input.key)
        {
            return false;
        }
        let m = input.modifiers;
        self.ctrl == m.ctrl
            && self.shift == m.shift
            && self.alt == m.alt
            && self.meta.is_none_or(|meta| meta == m.meta)
    }
}

/// Matches normalized keyboard input against a binding table.
pub struct ShortcutMatcher {
    bindings: Vec<ShortcutBinding>,
}

impl ShortcutMatcher {
    pub fn new(bindings: Vec<ShortcutBinding>) -> Self {
        Self { bindings }
    }

    /// The stock table, seeded with the platform's primary modifier.
    pub fn with_defaults(env: &Environment) -> Self {
        let primary = |key: &'static str, shift: bool, action: &'static str| {
            if env.primary_modifier_is_meta() {
                ShortcutBinding { key: Some(key), ctrl: false, shift, alt: false, meta: Some(true), action }
            } else {
                ShortcutBinding { key: Some(key), ctrl: true, shift, alt: false, meta: None, action }
            }
        };

        let mut bindings = vec![
            primary("z", false, "undo"),
            primary("z", true, "redo"),
            primary("y", false, "redo"),
            primary("c", false, "copy"),
            primary("x", false, "cut"),
            primary("v", false, "paste"),
            primary("a", false, "selectAll"),
            primary("=", false, "zoomIn"),
            primary("-", false, "zoomOut"),
            primary("0", false, "zoomToFit"),
            ShortcutBinding::plain("Delete", "deleteSelection"),
            ShortcutBinding::plain("Backspace", "deleteSelection"),
            ShortcutBinding::plain("Escape", "deselectAll"),
        ];
        // Box-select while Shift is held: modifier-only.
        bindings.push(ShortcutBinding {
            key: None,
            ctrl: false,
            shift: true,
            alt: false,
            meta: None,
            action: "boxSelect",
        });
        Self::new(bindings)
    }

    pub fn add(&mut self, binding: ShortcutBinding) {
        self.bindings.push(binding);
    }

    /// Every binding the input satisfies, in table order.
    pub fn match_input(&self, input: &KeyInput) -> Vec<&ShortcutBinding> {
        self.bindings.iter().filter(|b| b.matches(input)).collect()
    }

    /// Convenience: the first matching action name, if any.
    pub fn action_for(&self, input: &KeyInput) -> Option<&'static str> {
        self.match_input(input).first().map(|b| b.action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Platform;
    use crate::input::Modifiers;

    fn key(k: &str, m: Modifiers) -> KeyInput {
        KeyInput { key: k.to_string(), modifiers: m }
    }

    #[test]
    fn exact_modifiers_required() {
        let matcher =
            ShortcutMatcher::with_defaults(&Environment::new(Platform::Linux));

        let ctrl = Modifiers { ctrl: true, ..Modifiers::NONE };
        assert_eq!(matcher.action_for(&key("z", ctrl)), Some("undo"));
        // Extra modifier not mentioned in the binding: no match.
        let ctrl_alt = Modifiers { ctrl: true, alt: true, ..Modifiers::NONE };
        assert_eq!(matcher.action_for(&key("z", ctrl_alt)), None);
        // Missing required modifier: no match.
        assert_eq!(matcher.action_for(&key("z", Modifiers::NONE)), None);
    }

    #[test]
    fn meta_is_ignored_unless_specified() {
        let matcher =
            ShortcutMatcher::with_defaults(&Environment::new(Platform::Linux));
        // On a binding that doesn't mention meta, a pressed meta key must
        // not spoil the match (primary-modifier aliasing).
        let ctrl_meta = Modifiers { ctrl: true, meta: true, ..Modifiers::NONE };
        assert_eq!(matcher.action_for(&key("z", ctrl_meta)), Some("undo"));
    }

    #[test]
    fn mac_uses_meta_as_primary() {
        let matcher =
            ShortcutMatcher::with_defaults(&Environment::new(Platform::MacOs));
        let cmd = Modifiers { meta: true, ..Modifiers::NONE };
        assert_eq!(matcher.action_for(&key("z", cmd)), Some("undo"));
        let cmd_shift = Modifiers { meta: true, shift: true, ..Modifiers::NONE };
        assert_eq!(matcher.action_for(&key("z", cmd_shift)), Some("redo"));
        // Plain Ctrl+Z is nothing on mac.
        let ctrl = Modifiers { ctrl: true, ..Modifiers::NONE };
        assert_eq!(matcher.action_for(&key("z", ctrl)), None);
    }

    #[test]
    fn modifier_only_binding_matches_any_key_state() {
        let matcher =
            ShortcutMatcher::with_defaults(&Environment::new(Platform::Linux));
        let shift = Modifiers { shift: true, ..Modifiers::NONE };
        let hits = matcher.match_input(&key("Shift", shift));
        assert!(hits.iter().any(|b| b.action == "boxSelect"));
    }

    #[test]
    fn all_matches_are_returned_in_table_order() {
        let mut matcher = ShortcutMatcher::new(vec![
            ShortcutBinding::plain("q", "first"),
            ShortcutBinding::plain("q", "second"),
        ]);
        matcher.add(ShortcutBinding::plain("q", "third"));
        let actions: Vec<&str> =
            matcher.match_input(&key("q", Modifiers::NONE)).iter().map(|b| b.action).collect();
        assert_eq!(actions, vec!["first", "second", "third"]);
    }

    #[test]
    fn case_insensitive_keys() {
        let matcher =
            ShortcutMatcher::with_defaults(&Environment::new(Platform::Linux));
        let ctrl = Modifiers { ctrl: true, ..Modifiers::NONE };
        assert_eq!(matcher.action_for(&key("Z", ctrl)), Some("undo"));
    }
}
