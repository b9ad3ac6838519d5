//! IPC message protocol definitions
//!
//! All messages are JSON-encoded, prefixed with a 4-byte little-endian length.

use serde::{Deserialize, Serialize};

use crate::events::DetectorEvent;

/// Largest frame either side will accept
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Requests from a status client to the daemon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Request current daemon status
    GetStatus,

    /// Ping to check connectivity
    Ping,

    /// Subscribe to detector event notifications
    Subscribe,

    /// Stop the daemon
    Quit,
}

/// Responses from daemon to client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Current daemon status
    Status(DaemonStatus),

    /// Pong response to ping
    Pong,

    /// Subscription confirmed
    Subscribed,

    /// Quit accepted; the daemon is stopping
    ShuttingDown,

    /// Error response
    Error { code: String, message: String },
}

/// Push notification from daemon to subscribed clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// The detector emitted an event
    Event { event: DetectorEvent },
}

/// Full daemon status snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonStatus {
    /// Daemon version
    pub version: String,

    /// False once shutdown has been requested
    pub running: bool,

    /// Uptime in seconds
    pub uptime_secs: u64,

    /// Names of keys currently held, as last observed
    pub held_keys: Vec<String>,

    /// Number of configured shortcuts
    pub shortcut_count: usize,

    /// Notifications dispatched so far
    pub fired_count: u64,

    /// Matches dropped by the cooldown
    pub suppressed_count: u64,

    /// Keys of the most recently fired shortcut
    pub last_fired: Option<Vec<String>>,
}

impl Default for DaemonStatus {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            running: true,
            uptime_secs: 0,
            held_keys: Vec::new(),
            shortcut_count: 0,
            fired_count: 0,
            suppressed_count: 0,
            last_fired: None,
        }
    }
}
