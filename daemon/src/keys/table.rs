//! Immutable bidirectional key table

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

/// Raw key identifier as reported by the capture layer (Windows virtual-key code)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyCode(pub u16);

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Keys with irregular codes. Right-hand modifiers get their own `r` name
/// so that every code maps back to itself.
const NAMED_KEYS: &[(u16, &str)] = &[
    (8, "backspace"),
    (9, "tab"),
    (13, "enter"),
    (27, "esc"),
    (32, "space"),
    (37, "left"),
    (38, "up"),
    (39, "right"),
    (40, "down"),
    (91, "win"),
    (92, "rwin"),
    (160, "shift"),
    (161, "rshift"),
    (162, "ctrl"),
    (163, "rctrl"),
    (164, "alt"),
    (165, "ralt"),
];

// Contiguous ranges: digits start at 0x30, letters at 0x41, F1 at 0x70.
const DIGITS: [&str; 10] = ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"];
const LETTERS: [&str; 26] = [
    "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n", "o", "p", "q", "r", "s",
    "t", "u", "v", "w", "x", "y", "z",
];
const FUNCTION_KEYS: [&str; 12] = [
    "f1", "f2", "f3", "f4", "f5", "f6", "f7", "f8", "f9", "f10", "f11", "f12",
];

struct KeyTable {
    by_code: HashMap<KeyCode, &'static str>,
    by_name: HashMap<&'static str, KeyCode>,
}

impl KeyTable {
    fn build() -> Self {
        let ranges = DIGITS
            .iter()
            .zip(0x30u16..)
            .chain(LETTERS.iter().zip(0x41u16..))
            .chain(FUNCTION_KEYS.iter().zip(0x70u16..))
            .map(|(name, code)| (code, *name));

        let mut by_code = HashMap::new();
        let mut by_name = HashMap::new();
        for (code, name) in NAMED_KEYS.iter().copied().chain(ranges) {
            by_code.insert(KeyCode(code), name);
            by_name.insert(name, KeyCode(code));
        }

        Self { by_code, by_name }
    }
}

static TABLE: LazyLock<KeyTable> = LazyLock::new(KeyTable::build);

/// Canonical name for a raw code, if the key is known
pub fn name_of(code: KeyCode) -> Option<&'static str> {
    TABLE.by_code.get(&code).copied()
}

/// Raw code for a canonical name, if the name is known
pub fn code_of(name: &str) -> Option<KeyCode> {
    TABLE.by_name.get(name).copied()
}

/// Every mapped (code, name) pair, in no particular order
#[cfg(test)]
pub fn entries() -> impl Iterator<Item = (KeyCode, &'static str)> {
    TABLE.by_code.iter().map(|(code, name)| (*code, *name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_codes() {
        assert_eq!(name_of(KeyCode(162)), Some("ctrl"));
        assert_eq!(name_of(KeyCode(160)), Some("shift"));
        assert_eq!(name_of(KeyCode(164)), Some("alt"));
        assert_eq!(name_of(KeyCode(91)), Some("win"));
        assert_eq!(name_of(KeyCode(9)), Some("tab"));
        assert_eq!(name_of(KeyCode(67)), Some("c"));
        assert_eq!(name_of(KeyCode(68)), Some("d"));
        assert_eq!(name_of(KeyCode(86)), Some("v"));
        assert_eq!(name_of(KeyCode(37)), Some("left"));
        assert_eq!(name_of(KeyCode(39)), Some("right"));
    }

    #[test]
    fn test_right_modifiers_have_own_names() {
        assert_eq!(name_of(KeyCode(163)), Some("rctrl"));
        assert_eq!(name_of(KeyCode(161)), Some("rshift"));
        assert_eq!(name_of(KeyCode(165)), Some("ralt"));
        assert_eq!(name_of(KeyCode(92)), Some("rwin"));
        assert_eq!(code_of("ctrl"), Some(KeyCode(162)));
    }

    #[test]
    fn test_ranges() {
        assert_eq!(code_of("a"), Some(KeyCode(65)));
        assert_eq!(code_of("z"), Some(KeyCode(90)));
        assert_eq!(code_of("0"), Some(KeyCode(48)));
        assert_eq!(code_of("9"), Some(KeyCode(57)));
        assert_eq!(code_of("f1"), Some(KeyCode(112)));
        assert_eq!(code_of("f12"), Some(KeyCode(123)));
    }

    #[test]
    fn test_unknown_has_no_mapping() {
        assert_eq!(name_of(KeyCode(0)), None);
        assert_eq!(name_of(KeyCode(255)), None);
        assert_eq!(code_of(""), None);
        assert_eq!(code_of("hyper"), None);
        assert_eq!(code_of("CTRL"), None);
    }

    #[test]
    fn test_table_is_bijective() {
        let all: Vec<_> = entries().collect();
        assert_eq!(
            all.len(),
            NAMED_KEYS.len() + DIGITS.len() + LETTERS.len() + FUNCTION_KEYS.len()
        );

        for (code, name) in all {
            assert_eq!(code_of(name), Some(code), "name {name} does not map back");
            assert_eq!(name_of(code), Some(name), "code {code} does not map back");
        }
    }
}
