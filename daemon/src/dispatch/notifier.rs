//! Fire-and-forget webhook delivery

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};
use url::Url;

use super::DispatchError;

/// Delivers a notification without making the caller wait
///
/// Implementations must return immediately; delivery outcome is the
/// notifier's own concern and is never reported back.
pub trait Notifier: Send + Sync {
    fn notify(&self, url: Url);
}

/// POSTs each notification from a detached tokio task
pub struct HttpNotifier {
    client: reqwest::Client,
    tasks: TaskTracker,
}

impl HttpNotifier {
    /// Build a notifier whose requests are bounded by `timeout`
    pub fn new(timeout: Duration) -> Result<Self, DispatchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("keyhook-daemon/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            tasks: TaskTracker::new(),
        })
    }

    /// Number of requests still in flight
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Wait up to `grace` for in-flight requests. Returns `false` if some
    /// were still running and have been abandoned.
    pub async fn drain(&self, grace: Duration) -> bool {
        self.tasks.close();
        tokio::time::timeout(grace, self.tasks.wait()).await.is_ok()
    }
}

impl Notifier for HttpNotifier {
    fn notify(&self, url: Url) {
        let client = self.client.clone();
        debug!(%url, "queueing notification");

        self.tasks.spawn(async move {
            let result = client
                .post(url.clone())
                .header(CONTENT_TYPE, "application/json")
                .send()
                .await;

            match result {
                Ok(response) if response.status().is_success() => {
                    info!(%url, status = %response.status(), "notification sent");
                }
                Ok(response) => {
                    warn!(%url, status = %response.status(), "notification rejected");
                }
                Err(e) => {
                    warn!(%url, error = %e, timeout = e.is_timeout(), "notification failed");
                }
            }
        });
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Records URLs instead of sending them
    #[derive(Default)]
    pub struct RecordingNotifier {
        urls: Mutex<Vec<Url>>,
    }

    impl RecordingNotifier {
        pub fn urls(&self) -> Vec<String> {
            self.urls
                .lock()
                .unwrap()
                .iter()
                .map(|url| url.to_string())
                .collect()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, url: Url) {
            self.urls.lock().unwrap().push(url);
        }
    }
}
