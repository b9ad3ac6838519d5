//! Cooldown-gated dispatch

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::info;

use super::notifier::Notifier;
use super::target::NotificationTarget;
use crate::shortcut::Shortcut;

/// Result of a dispatch attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Notification handed to the notifier
    Fired,
    /// Cooldown still active; nothing sent
    Suppressed { remaining: Duration },
}

impl Decision {
    #[cfg(test)]
    pub fn fired(&self) -> bool {
        matches!(self, Decision::Fired)
    }
}

/// Rate-limits notifications for matched shortcuts
///
/// The cooldown gates the intent to notify: the timestamp is recorded as
/// soon as a dispatch is accepted, before the request is even started, so
/// a failed request still holds off the next one until the cooldown ends.
pub struct DispatchGovernor {
    notifier: Arc<dyn Notifier>,
    target: NotificationTarget,
    cooldown: Duration,
    last_dispatch: Option<Instant>,
    fired: u64,
    suppressed: u64,
}

impl DispatchGovernor {
    pub fn new(
        notifier: Arc<dyn Notifier>,
        target: NotificationTarget,
        cooldown: Duration,
    ) -> Self {
        Self {
            notifier,
            target,
            cooldown,
            last_dispatch: None,
            fired: 0,
            suppressed: 0,
        }
    }

    /// Notify for `shortcut` unless the previous dispatch was less than one
    /// cooldown before `now`
    pub fn try_dispatch(&mut self, shortcut: &Shortcut, now: Instant) -> Decision {
        if let Some(last) = self.last_dispatch {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < self.cooldown {
                let remaining = self.cooldown - elapsed;
                self.suppressed += 1;
                return Decision::Suppressed { remaining };
            }
        }

        self.last_dispatch = Some(now);
        self.fired += 1;

        let url = self.target.url_for(shortcut);
        info!(keys = %shortcut.joined("+"), "shortcut fired");
        self.notifier.notify(url);

        Decision::Fired
    }

    #[cfg(test)]
    pub fn last_dispatch(&self) -> Option<Instant> {
        self.last_dispatch
    }

    pub fn fired_count(&self) -> u64 {
        self.fired
    }

    pub fn suppressed_count(&self) -> u64 {
        self.suppressed
    }
}
