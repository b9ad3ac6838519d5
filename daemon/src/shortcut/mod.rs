//! Shortcut registry and exact-set matching

mod matcher;
mod registry;

pub use matcher::matches;
pub use registry::{Registry, Shortcut};
