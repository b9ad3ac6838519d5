//! Exact-set shortcut matching

use super::registry::Shortcut;
use crate::hotkey::HeldKeys;

/// A shortcut matches when the held keys are exactly its keys: every
/// required key is down and nothing else is.
pub fn matches(shortcut: &Shortcut, held: &HeldKeys) -> bool {
    let Some(required) = shortcut.codes() else {
        return false;
    };
    held.len() == required.len() && required.iter().all(|code| held.contains(*code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::code_of;

    fn held(names: &[&str]) -> HeldKeys {
        let mut held = HeldKeys::new();
        for name in names {
            held.press(code_of(name).unwrap());
        }
        held
    }

    #[test]
    fn test_exact_set_matches_in_any_order() {
        let shortcut = Shortcut::new(["ctrl", "shift", "c"]);
        assert!(matches(&shortcut, &held(&["ctrl", "shift", "c"])));
        assert!(matches(&shortcut, &held(&["c", "shift", "ctrl"])));
    }

    #[test]
    fn test_subset_does_not_match() {
        let shortcut = Shortcut::new(["ctrl", "shift", "c"]);
        assert!(!matches(&shortcut, &held(&["ctrl", "shift"])));
        assert!(!matches(&shortcut, &HeldKeys::new()));
    }

    #[test]
    fn test_superset_does_not_match() {
        let shortcut = Shortcut::new(["ctrl", "shift", "c"]);
        assert!(!matches(&shortcut, &held(&["ctrl", "shift", "c", "d"])));
        assert!(!matches(&shortcut, &held(&["ctrl", "shift", "c", "rctrl"])));
    }

    #[test]
    fn test_same_size_different_keys() {
        let shortcut = Shortcut::new(["ctrl", "c"]);
        assert!(!matches(&shortcut, &held(&["ctrl", "v"])));
        assert!(!matches(&shortcut, &held(&["rctrl", "c"])));
    }

    #[test]
    fn test_unmapped_name_never_matches() {
        let shortcut = Shortcut::new(["ctrl", "hyper"]);
        assert!(!matches(&shortcut, &held(&["ctrl"])));
        assert!(!matches(&shortcut, &held(&["ctrl", "c"])));
        assert!(!matches(&shortcut, &HeldKeys::new()));
    }

    #[test]
    fn test_duplicate_names_collapse() {
        let shortcut = Shortcut::new(["ctrl", "ctrl", "c"]);
        assert!(matches(&shortcut, &held(&["ctrl", "c"])));
    }

    #[test]
    fn test_single_key_shortcut() {
        let shortcut = Shortcut::new(["f9"]);
        assert!(matches(&shortcut, &held(&["f9"])));
        assert!(!matches(&shortcut, &held(&["f9", "shift"])));
    }
}
