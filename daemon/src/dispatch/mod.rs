//! Rate-limited webhook dispatch
//!
//! The governor decides whether a matched shortcut may notify, the
//! target builds the notification URL, and the notifier delivers it
//! without blocking the key-event path.

mod governor;
mod notifier;
mod target;

pub use governor::{Decision, DispatchGovernor};
pub use notifier::{HttpNotifier, Notifier};
pub use target::NotificationTarget;

#[cfg(test)]
pub(crate) use notifier::testing;

/// Errors raised while setting up dispatch
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("invalid notification URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("notification URL must use http or https, got `{0}`")]
    UnsupportedScheme(String),

    #[error("user id must not be empty")]
    EmptyUserId,

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
