//! Signal handling for graceful shutdown
//!
//! OS signals are one of several ways to request shutdown (the status
//! socket's `quit` is another). All of them end in the same cancellation
//! token, which is what the capture loop and detector watch.

use tokio::signal::unix::{signal, Signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Turns SIGTERM / SIGINT into a cancelled token
pub struct ShutdownSignal {
    cancel: CancellationToken,
    sigterm: Signal,
    sigint: Signal,
}

impl ShutdownSignal {
    /// Install the SIGTERM / SIGINT handlers; they cancel `cancel` once
    /// [`wait`](Self::wait) observes them
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(cancel: CancellationToken) -> std::io::Result<Self> {
        Ok(Self {
            cancel,
            sigterm: signal(SignalKind::terminate())?,
            sigint: signal(SignalKind::interrupt())?,
        })
    }

    /// Wait until a signal arrives or shutdown is requested elsewhere,
    /// then make sure the token is cancelled
    pub async fn wait(&mut self) {
        tokio::select! {
            _ = self.sigterm.recv() => {
                debug!("received SIGTERM");
            }
            _ = self.sigint.recv() => {
                debug!("received SIGINT");
            }
            _ = self.cancel.cancelled() => {
                debug!("shutdown requested");
            }
        }

        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_returns_when_already_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        tokio_test::block_on(async {
            let mut shutdown = ShutdownSignal::new(cancel).unwrap();
            shutdown.wait().await;
        });
    }

    #[tokio::test]
    async fn test_cancel_from_elsewhere_wakes_waiter() {
        let cancel = CancellationToken::new();
        let mut shutdown = ShutdownSignal::new(cancel.clone()).unwrap();

        let waiter = tokio::spawn(async move { shutdown.wait().await });
        cancel.cancel();

        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn test_sigterm_after_install_cancels_token() {
        let cancel = CancellationToken::new();
        // Handlers are live from here on, so the signal below cannot
        // terminate the test process.
        let mut shutdown = ShutdownSignal::new(cancel.clone()).unwrap();

        let status = std::process::Command::new("kill")
            .args(["-TERM", &std::process::id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());

        tokio::time::timeout(Duration::from_secs(5), shutdown.wait())
            .await
            .unwrap();
        assert!(cancel.is_cancelled());
    }
}
