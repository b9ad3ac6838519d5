//! Hotkey module for global keyboard event capture
//!
//! Tracks which keys are held and runs capture sources on a dedicated
//! thread, forwarding raw key events to the detector in arrival order.

#[cfg(feature = "global-capture")]
mod global;
mod listener;
mod script;
mod tracker;

#[cfg(feature = "global-capture")]
pub use global::GlobalCapture;
pub use listener::{CaptureSource, HotkeyListener, KeyEvent};
pub use script::ScriptSource;
pub use tracker::HeldKeys;
