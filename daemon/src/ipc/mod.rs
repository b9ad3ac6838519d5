//! IPC module for the status/control surface
//!
//! Lets a tray icon or CLI client query running state, follow detector
//! events and request shutdown.

mod protocol;
mod server;

pub use server::Server;
