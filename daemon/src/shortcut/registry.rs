//! Configured shortcuts, loaded once at startup

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::matcher::matches;
use crate::hotkey::HeldKeys;
use crate::keys::{code_of, KeyCode};

/// One trigger combination
///
/// Key order only matters for the notification payload, not for the
/// order in which keys must be pressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortcut {
    keys: Vec<String>,
    /// Resolved codes; `None` when any name has no mapping or the list is empty
    codes: Option<HashSet<KeyCode>>,
}

impl Shortcut {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        let codes = if keys.is_empty() {
            None
        } else {
            keys.iter().map(|name| code_of(name)).collect()
        };
        Self { keys, codes }
    }

    /// Key names as configured
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// The exact set of codes that must be held, if every name resolved
    pub fn codes(&self) -> Option<&HashSet<KeyCode>> {
        self.codes.as_ref()
    }

    /// Whether any held-set can ever match this shortcut
    pub fn is_satisfiable(&self) -> bool {
        self.codes.is_some()
    }

    /// Names joined for display or payloads, e.g. `ctrl+shift+c`
    pub fn joined(&self, separator: &str) -> String {
        self.keys.join(separator)
    }
}

/// Errors raised while loading the shortcut registry
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid shortcut list: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("shortcut #{index} has no keys")]
    EmptyShortcut { index: usize },
}

/// Ordered list of shortcuts; earlier entries win ties
#[derive(Debug, Clone, Default)]
pub struct Registry {
    shortcuts: Vec<Shortcut>,
}

impl Registry {
    pub fn new(shortcuts: Vec<Shortcut>) -> Self {
        Self { shortcuts }
    }

    /// Parse a JSON list of key-name lists, e.g. `[["ctrl","shift","c"]]`
    pub fn from_json(text: &str) -> Result<Self, RegistryError> {
        let lists: Vec<Vec<String>> = serde_json::from_str(text)?;
        if let Some(index) = lists.iter().position(Vec::is_empty) {
            return Err(RegistryError::EmptyShortcut { index: index + 1 });
        }
        Ok(Self::new(lists.into_iter().map(Shortcut::new).collect()))
    }

    /// Load the registry from a JSON file
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let text = std::fs::read_to_string(path).map_err(|source| RegistryError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// First shortcut whose key set equals the held set exactly
    pub fn find_match(&self, held: &HeldKeys) -> Option<&Shortcut> {
        self.shortcuts.iter().find(|shortcut| matches(shortcut, held))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Shortcut> {
        self.shortcuts.iter()
    }

    pub fn len(&self) -> usize {
        self.shortcuts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shortcuts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn held(names: &[&str]) -> HeldKeys {
        let mut held = HeldKeys::new();
        for name in names {
            held.press(code_of(name).unwrap());
        }
        held
    }

    #[test]
    fn test_from_json() {
        let registry = Registry::from_json(r#"[["ctrl","shift","c"], ["alt","tab"]]"#).unwrap();
        assert_eq!(registry.len(), 2);
        let first = registry.iter().next().unwrap();
        assert_eq!(first.keys(), ["ctrl", "shift", "c"]);
        assert_eq!(first.joined("-"), "ctrl-shift-c");
    }

    #[test]
    fn test_from_json_rejects_bad_input() {
        assert!(matches!(
            Registry::from_json(r#"{"ctrl": 1}"#),
            Err(RegistryError::Parse(_))
        ));
        assert!(matches!(
            Registry::from_json(r#"[["ctrl"], []]"#),
            Err(RegistryError::EmptyShortcut { index: 2 })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Registry::load(Path::new("/nonexistent/keys.json")).unwrap_err();
        assert!(matches!(err, RegistryError::Read { .. }));
        assert!(err.to_string().contains("/nonexistent/keys.json"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[["win","d"]]"#).unwrap();

        let registry = Registry::load(file.path()).unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unmapped_name_is_unsatisfiable() {
        let shortcut = Shortcut::new(["ctrl", "hyper"]);
        assert!(!shortcut.is_satisfiable());
        assert!(Shortcut::new(["ctrl", "c"]).is_satisfiable());
        assert!(!Shortcut::new(Vec::<String>::new()).is_satisfiable());
    }

    #[test]
    fn test_find_match_first_wins() {
        let registry = Registry::new(vec![
            Shortcut::new(["alt", "tab"]),
            Shortcut::new(["ctrl", "c"]),
            Shortcut::new(["c", "ctrl"]),
        ]);

        let found = registry.find_match(&held(&["ctrl", "c"])).unwrap();
        assert_eq!(found.keys(), ["ctrl", "c"]);
        assert!(std::ptr::eq(found, registry.iter().nth(1).unwrap()));
    }

    #[test]
    fn test_find_match_none() {
        let registry = Registry::new(vec![Shortcut::new(["ctrl", "shift", "c"])]);
        assert!(registry.find_match(&held(&["ctrl", "shift"])).is_none());
        assert!(registry.find_match(&held(&["ctrl", "shift", "c", "d"])).is_none());
        assert!(registry.find_match(&HeldKeys::new()).is_none());
    }
}
