//! Capture thread management
//!
//! A capture source produces raw key events from a synchronous callback
//! or loop. The listener runs it on a dedicated thread and forwards every
//! event, in order, to the detector's channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::keys::KeyCode;

/// Raw key transition reported by a capture source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    /// Key pressed (also sent for OS auto-repeat)
    Down(KeyCode),
    /// Key released
    Up(KeyCode),
}

/// A producer of raw key events
///
/// `run` blocks the capture thread until the source is exhausted, the
/// sink is closed, or the source fails.
pub trait CaptureSource: Send + 'static {
    /// Short label for logs
    fn name(&self) -> &'static str;

    /// Produce events into `sink` until done
    fn run(self: Box<Self>, sink: EventSink) -> Result<(), CaptureError>;
}

/// Write side of the capture channel, handed to a running source
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::Sender<KeyEvent>,
    cancel: CancellationToken,
}

impl EventSink {
    pub fn new(tx: mpsc::Sender<KeyEvent>, cancel: CancellationToken) -> Self {
        Self { tx, cancel }
    }

    /// Forward an event. Returns `false` once the daemon is shutting down
    /// or the detector has gone away; sources should stop producing then.
    pub fn send(&self, event: KeyEvent) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        // The capture thread is not an async context, so block on the bounded channel.
        self.tx.blocking_send(event).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled() || self.tx.is_closed()
    }

    /// Sleep for `duration`, waking early if the sink closes.
    /// Returns `false` if it woke because of closure.
    pub fn pause(&self, duration: Duration) -> bool {
        const SLICE: Duration = Duration::from_millis(20);

        let mut remaining = duration;
        while !remaining.is_zero() {
            if self.is_closed() {
                return false;
            }
            let step = remaining.min(SLICE);
            thread::sleep(step);
            remaining -= step;
        }
        !self.is_closed()
    }
}

/// Runs a capture source on its own thread
pub struct HotkeyListener {
    event_tx: mpsc::Sender<KeyEvent>,
    cancel: CancellationToken,
    running: Arc<AtomicBool>,
}

impl HotkeyListener {
    /// Create a new listener feeding `event_tx`, stopped by `cancel`
    pub fn new(event_tx: mpsc::Sender<KeyEvent>, cancel: CancellationToken) -> Self {
        Self {
            event_tx,
            cancel,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start the listener thread for `source`
    ///
    /// The listener's own sender is handed to the thread, so the detector's
    /// channel closes as soon as the source finishes.
    pub fn start(&mut self, source: Box<dyn CaptureSource>) -> Result<(), CaptureError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(CaptureError::AlreadyRunning);
        }

        let (placeholder, _) = mpsc::channel(1);
        let sink = EventSink::new(
            std::mem::replace(&mut self.event_tx, placeholder),
            self.cancel.clone(),
        );
        let running = Arc::clone(&self.running);
        let name = source.name();

        thread::Builder::new()
            .name("hotkey-listener".to_string())
            .spawn(move || {
                info!(source = name, "capture thread started");

                match source.run(sink) {
                    Ok(()) => debug!(source = name, "capture source finished"),
                    Err(e) => error!(source = name, error = %e, "capture source failed"),
                }

                running.store(false, Ordering::SeqCst);
                info!(source = name, "capture thread stopped");
            })
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                CaptureError::ThreadSpawn(e.to_string())
            })?;

        Ok(())
    }

    /// Ask the capture source to stop forwarding events
    pub fn stop(&self) {
        if self.is_running() {
            debug!("signalling capture source to stop");
        }
        self.cancel.cancel();
    }

    /// Check if the capture thread is currently running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Errors that can occur while capturing key events
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("hotkey listener is already running")]
    AlreadyRunning,

    #[error("failed to spawn listener thread: {0}")]
    ThreadSpawn(String),

    #[cfg(feature = "global-capture")]
    #[error("global keyboard capture failed: {0}")]
    Listen(String),

    #[error("failed to read replay script: {0}")]
    Io(#[from] std::io::Error),

    #[error("replay script line {line}: {message}")]
    Script { line: usize, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSource(Vec<KeyEvent>);

    impl CaptureSource for FixedSource {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn run(self: Box<Self>, sink: EventSink) -> Result<(), CaptureError> {
            for event in self.0 {
                if !sink.send(event) {
                    break;
                }
            }
            Ok(())
        }
    }

    #[test]
    fn test_listener_creation() {
        let (tx, _rx) = mpsc::channel(32);
        let listener = HotkeyListener::new(tx, CancellationToken::new());
        assert!(!listener.is_running());
    }

    #[tokio::test]
    async fn test_events_forwarded_in_order_then_channel_closes() {
        let (tx, mut rx) = mpsc::channel(32);
        let mut listener = HotkeyListener::new(tx, CancellationToken::new());
        let events = vec![
            KeyEvent::Down(KeyCode(162)),
            KeyEvent::Down(KeyCode(67)),
            KeyEvent::Up(KeyCode(67)),
            KeyEvent::Up(KeyCode(162)),
        ];

        listener.start(Box::new(FixedSource(events.clone()))).unwrap();

        let mut received = Vec::new();
        while let Some(event) = rx.recv().await {
            received.push(event);
        }
        assert_eq!(received, events);
    }

    /// Idles until the sink closes
    struct IdleSource;

    impl CaptureSource for IdleSource {
        fn name(&self) -> &'static str {
            "idle"
        }

        fn run(self: Box<Self>, sink: EventSink) -> Result<(), CaptureError> {
            while sink.pause(Duration::from_millis(10)) {}
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_second_start_rejected_then_stop() {
        let (tx, mut rx) = mpsc::channel(32);
        let mut listener = HotkeyListener::new(tx, CancellationToken::new());
        listener.start(Box::new(IdleSource)).unwrap();
        assert!(listener.is_running());

        let result = listener.start(Box::new(FixedSource(Vec::new())));
        assert!(matches!(result, Err(CaptureError::AlreadyRunning)));

        listener.stop();
        assert_eq!(rx.recv().await, None);
    }

    #[test]
    fn test_sink_refuses_after_cancel() {
        let (tx, _rx) = mpsc::channel(4);
        let cancel = CancellationToken::new();
        let sink = EventSink::new(tx, cancel.clone());

        assert!(sink.send(KeyEvent::Down(KeyCode(9))));
        cancel.cancel();
        assert!(!sink.send(KeyEvent::Up(KeyCode(9))));
        assert!(!sink.pause(Duration::from_secs(5)));
    }
}
