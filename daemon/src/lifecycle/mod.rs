//! Process lifecycle: shutdown requests

mod shutdown;

pub use shutdown::ShutdownSignal;
