//! Held-key tracking

use std::collections::HashSet;

use crate::keys::{name_of, KeyCode};

/// Set of raw key codes currently held down
///
/// Best-effort: a dropped or out-of-order OS event can leave this out of
/// sync with the physical keyboard until the key is pressed again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeldKeys {
    codes: HashSet<KeyCode>,
}

impl HeldKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key-down. Returns `false` for an auto-repeat of a key
    /// that is already held.
    pub fn press(&mut self, code: KeyCode) -> bool {
        self.codes.insert(code)
    }

    /// Record a key-up. Returns whether the key was held.
    pub fn release(&mut self, code: KeyCode) -> bool {
        self.codes.remove(&code)
    }

    pub fn contains(&self, code: KeyCode) -> bool {
        self.codes.contains(&code)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Names of the held keys, ordered by code
    #[cfg(test)]
    pub fn names(&self) -> Vec<&'static str> {
        let mut codes: Vec<_> = self.codes.iter().copied().collect();
        codes.sort_unstable();
        codes.into_iter().filter_map(name_of).collect()
    }
}
