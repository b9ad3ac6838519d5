//! Key identity resolution
//!
//! Maps the raw virtual-key codes reported by the capture layer to
//! canonical lowercase key names and back. Unknown codes and names have
//! no mapping; callers treat them as a no-op.

mod table;

pub use table::{code_of, name_of, KeyCode};
