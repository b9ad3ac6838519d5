//! Core detector implementation
//!
//! Events are handled strictly in arrival order on a single task; the
//! only asynchronous work (the notification request) is handed off to
//! the notifier and never awaited here.

use std::time::{Duration, Instant};

use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::dispatch::{Decision, DispatchGovernor};
use crate::events::DetectorEvent;
use crate::hotkey::{HeldKeys, KeyEvent};
use crate::keys::{name_of, KeyCode};
use crate::shortcut::Registry;

/// What a key-down led to, when it completed a shortcut
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The shortcut was dispatched
    Fired { keys: Vec<String> },
    /// The shortcut matched inside the cooldown window
    Suppressed { keys: Vec<String>, remaining: Duration },
}

/// The detector that turns key events into notifications
pub struct Detector {
    registry: Registry,
    held: HeldKeys,
    governor: DispatchGovernor,
    /// Channel for emitting detector events
    event_tx: broadcast::Sender<DetectorEvent>,
}

impl Detector {
    /// Create a new detector
    pub fn new(
        registry: Registry,
        governor: DispatchGovernor,
        event_tx: broadcast::Sender<DetectorEvent>,
    ) -> Self {
        Self {
            registry,
            held: HeldKeys::new(),
            governor,
            event_tx,
        }
    }

    /// Keys currently held
    #[cfg(test)]
    pub fn held(&self) -> &HeldKeys {
        &self.held
    }

    pub fn governor(&self) -> &DispatchGovernor {
        &self.governor
    }

    /// Run the detector until the capture channel closes or `cancel` fires
    pub async fn run(&mut self, mut key_rx: mpsc::Receiver<KeyEvent>, cancel: CancellationToken) {
        info!(shortcuts = self.registry.len(), "detector started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                event = key_rx.recv() => match event {
                    Some(event) => match self.handle(event, Instant::now()) {
                        Some(Outcome::Fired { keys }) => {
                            debug!(keys = %keys.join("+"), "notification handed off");
                        }
                        Some(Outcome::Suppressed { keys, remaining }) => {
                            debug!(
                                keys = %keys.join("+"),
                                remaining_ms = remaining.as_millis() as u64,
                                "match dropped by cooldown"
                            );
                        }
                        None => {}
                    },
                    None => {
                        debug!("capture channel closed");
                        break;
                    }
                },
            }
        }

        info!(
            fired = self.governor.fired_count(),
            suppressed = self.governor.suppressed_count(),
            "detector stopped"
        );
    }

    /// Process a single raw key event observed at `now`
    pub fn handle(&mut self, event: KeyEvent, now: Instant) -> Option<Outcome> {
        match event {
            KeyEvent::Down(code) => self.on_key_down(code, now),
            KeyEvent::Up(code) => {
                self.on_key_up(code);
                None
            }
        }
    }

    fn on_key_down(&mut self, code: KeyCode, now: Instant) -> Option<Outcome> {
        let name = name_of(code)?;

        // Held-key auto-repeat: never re-evaluated, so it can never re-fire.
        if !self.held.press(code) {
            return None;
        }

        debug!(key = name, %code, held = self.held.len(), "key down");
        self.emit(DetectorEvent::KeyPressed {
            key: name.to_string(),
        });

        let shortcut = self.registry.find_match(&self.held)?;
        let keys = shortcut.keys().to_vec();

        let outcome = match self.governor.try_dispatch(shortcut, now) {
            Decision::Fired => {
                self.emit(DetectorEvent::ShortcutFired { keys: keys.clone() });
                Outcome::Fired { keys }
            }
            Decision::Suppressed { remaining } => {
                self.emit(DetectorEvent::ShortcutSuppressed {
                    keys: keys.clone(),
                    remaining_ms: remaining.as_millis() as u64,
                });
                Outcome::Suppressed { keys, remaining }
            }
        };
        Some(outcome)
    }

    fn on_key_up(&mut self, code: KeyCode) {
        let Some(name) = name_of(code) else {
            return;
        };

        if self.held.release(code) {
            debug!(key = name, %code, held = self.held.len(), "key up");
            self.emit(DetectorEvent::KeyReleased {
                key: name.to_string(),
            });
            if self.held.is_empty() {
                debug!("all keys released");
            }
        }
    }

    fn emit(&self, event: DetectorEvent) {
        // No subscribers is fine; observers are optional.
        let _ = self.event_tx.send(event);
    }
}
