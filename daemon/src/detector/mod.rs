//! Shortcut detector
//!
//! Owns the held-key set, the shortcut registry and the dispatch
//! governor, and processes raw key events one at a time:
//! resolve → track → match (key-down only) → dispatch.

mod machine;

pub use machine::{Detector, Outcome};
