//! Events module for detector transitions
//!
//! Structured events broadcast by the detector to read-only observers
//! such as the status server.

use serde::{Deserialize, Serialize};

/// Events emitted by the detector while processing key input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DetectorEvent {
    /// A known key went down (repeats are not reported)
    KeyPressed { key: String },

    /// A held key was released
    KeyReleased { key: String },

    /// A shortcut matched and a notification was dispatched
    ShortcutFired { keys: Vec<String> },

    /// A shortcut matched during the cooldown and was dropped
    ShortcutSuppressed {
        keys: Vec<String>,
        /// Time left on the cooldown, in milliseconds
        remaining_ms: u64,
    },
}

impl std::fmt::Display for DetectorEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectorEvent::KeyPressed { key } => write!(f, "KEY_PRESSED ({})", key),
            DetectorEvent::KeyReleased { key } => write!(f, "KEY_RELEASED ({})", key),
            DetectorEvent::ShortcutFired { keys } => {
                write!(f, "SHORTCUT_FIRED ({})", keys.join("+"))
            }
            DetectorEvent::ShortcutSuppressed { keys, remaining_ms } => {
                write!(f, "SHORTCUT_SUPPRESSED ({}, {}ms left)", keys.join("+"), remaining_ms)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = DetectorEvent::ShortcutSuppressed {
            keys: vec!["ctrl".into(), "c".into()],
            remaining_ms: 250,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("shortcut_suppressed"));
        assert!(json.contains("250"));
    }

    #[test]
    fn test_event_deserialization() {
        let json = r#"{"type":"key_pressed","key":"shift"}"#;
        let event: DetectorEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event, DetectorEvent::KeyPressed { key: "shift".into() });
    }

    #[test]
    fn test_display() {
        let event = DetectorEvent::ShortcutFired {
            keys: vec!["alt".into(), "tab".into()],
        };
        assert_eq!(event.to_string(), "SHORTCUT_FIRED (alt+tab)");
    }
}
