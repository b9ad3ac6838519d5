//! Unix domain socket server for IPC
//!
//! Provides request-response communication and push notifications of
//! detector events to subscribed clients. The server never touches the
//! detector directly: its status view is rebuilt from broadcast events.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::events::DetectorEvent;

use super::protocol::{DaemonStatus, Notification, Request, Response, MAX_FRAME_LEN};

/// IPC Server handling client connections
pub struct Server {
    socket_path: PathBuf,
    listener: UnixListener,
    state: Arc<RwLock<ServerState>>,
    events: broadcast::Sender<DetectorEvent>,
    cancel: CancellationToken,
}

/// Shared server state
struct ServerState {
    status: DaemonStatus,
    start_time: Instant,
    held: BTreeSet<String>,
}

impl ServerState {
    fn apply(&mut self, event: &DetectorEvent) {
        match event {
            DetectorEvent::KeyPressed { key } => {
                self.held.insert(key.clone());
            }
            DetectorEvent::KeyReleased { key } => {
                self.held.remove(key);
            }
            DetectorEvent::ShortcutFired { keys } => {
                self.status.fired_count += 1;
                self.status.last_fired = Some(keys.clone());
            }
            DetectorEvent::ShortcutSuppressed { .. } => {
                self.status.suppressed_count += 1;
            }
        }
    }

    fn snapshot(&self, running: bool) -> DaemonStatus {
        DaemonStatus {
            running,
            uptime_secs: self.start_time.elapsed().as_secs(),
            held_keys: self.held.iter().cloned().collect(),
            ..self.status.clone()
        }
    }
}

impl Server {
    /// Create a new IPC server bound to `socket_path`
    pub fn new(
        socket_path: &Path,
        shortcut_count: usize,
        events: broadcast::Sender<DetectorEvent>,
        cancel: CancellationToken,
    ) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent).context("failed to create socket directory")?;
        }

        // Remove stale socket if it exists
        if socket_path.exists() {
            std::fs::remove_file(socket_path).context("failed to remove stale socket")?;
        }

        let listener = UnixListener::bind(socket_path).context("failed to bind Unix socket")?;

        // Set socket permissions to owner-only (0600)
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;
        }

        let state = Arc::new(RwLock::new(ServerState {
            status: DaemonStatus {
                shortcut_count,
                ..DaemonStatus::default()
            },
            start_time: Instant::now(),
            held: BTreeSet::new(),
        }));

        info!(?socket_path, "IPC server listening");

        Ok(Self {
            socket_path: socket_path.to_owned(),
            listener,
            state,
            events,
            cancel,
        })
    }

    /// Keep the status view in sync with the detector
    ///
    /// `event_rx` should be subscribed before the detector starts so no
    /// early key events are missed.
    pub async fn track(&self, mut event_rx: broadcast::Receiver<DetectorEvent>) {
        loop {
            match event_rx.recv().await {
                Ok(event) => {
                    debug!(%event, "detector event");
                    self.state.write().await.apply(&event);
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "status view lagged behind detector");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    /// Current status snapshot
    #[cfg(test)]
    pub async fn status(&self) -> DaemonStatus {
        self.state
            .read()
            .await
            .snapshot(!self.cancel.is_cancelled())
    }

    /// Run the server, accepting connections until shutdown
    pub async fn run(&self) -> Result<()> {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return Ok(()),
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, _addr)) => {
                        debug!("client connected");
                        let client = Client {
                            state: Arc::clone(&self.state),
                            events: self.events.clone(),
                            cancel: self.cancel.clone(),
                        };

                        tokio::spawn(async move {
                            if let Err(e) = client.serve(stream).await {
                                warn!(?e, "client handler error");
                            }
                        });
                    }
                    Err(e) => {
                        error!(?e, "accept error");
                    }
                },
            }
        }
    }

    /// Gracefully shutdown the server
    pub async fn shutdown(&self) {
        self.cancel.cancel();

        // Remove socket file
        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                warn!(?e, "failed to remove socket file");
            }
        }

        info!("IPC server shutdown complete");
    }
}

/// Per-connection handler
struct Client {
    state: Arc<RwLock<ServerState>>,
    events: broadcast::Sender<DetectorEvent>,
    cancel: CancellationToken,
}

impl Client {
    async fn serve(self, stream: UnixStream) -> Result<()> {
        let (reader, mut writer) = stream.into_split();

        // Frames are read on their own task so a push notification can
        // never interrupt a half-read request.
        let (request_tx, mut request_rx) = mpsc::channel(8);
        let reader_task = tokio::spawn(read_requests(reader, request_tx));

        let mut subscription: Option<broadcast::Receiver<DetectorEvent>> = None;

        let result = loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    debug!("client handler shutting down");
                    break Ok(());
                }
                request = request_rx.recv() => {
                    let response = match request {
                        Some(Ok(request)) => {
                            debug!(?request, "received request");
                            self.process_request(request, &mut subscription).await
                        }
                        Some(Err(message)) => Response::Error {
                            code: "invalid_request".to_string(),
                            message,
                        },
                        None => {
                            debug!("client disconnected");
                            break Ok(());
                        }
                    };
                    if let Err(e) = write_frame(&mut writer, &response).await {
                        break Err(e);
                    }
                }
                event = next_event(&mut subscription) => match event {
                    Ok(event) => {
                        let note = Notification::Event { event };
                        if let Err(e) = write_frame(&mut writer, &note).await {
                            break Err(e);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        subscription = None;
                    }
                },
            }
        };

        reader_task.abort();
        result
    }

    /// Process a request and return a response
    async fn process_request(
        &self,
        request: Request,
        subscription: &mut Option<broadcast::Receiver<DetectorEvent>>,
    ) -> Response {
        match request {
            Request::Ping => Response::Pong,

            Request::GetStatus => {
                let status = self.state.read().await.snapshot(!self.cancel.is_cancelled());
                Response::Status(status)
            }

            Request::Subscribe => {
                if subscription.is_none() {
                    *subscription = Some(self.events.subscribe());
                    debug!("client subscribed to notifications");
                }
                Response::Subscribed
            }

            Request::Quit => {
                info!("quit requested via IPC");
                self.cancel.cancel();
                Response::ShuttingDown
            }
        }
    }
}

/// Wait for the next event, or forever when not subscribed
async fn next_event(
    subscription: &mut Option<broadcast::Receiver<DetectorEvent>>,
) -> Result<DetectorEvent, broadcast::error::RecvError> {
    match subscription {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Decode requests until EOF; malformed JSON is reported, not fatal
async fn read_requests<R>(mut reader: R, tx: mpsc::Sender<Result<Request, String>>) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    while let Some(frame) = read_frame(&mut reader).await? {
        let request = serde_json::from_slice::<Request>(&frame).map_err(|e| e.to_string());
        if tx.send(request).await.is_err() {
            break;
        }
    }
    Ok(())
}

/// Read one length-prefixed frame; `None` on a clean disconnect
pub(crate) async fn read_frame<R>(reader: &mut R) -> Result<Option<Vec<u8>>>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_FRAME_LEN {
        bail!("frame of {len} bytes exceeds limit");
    }

    let mut frame = vec![0u8; len];
    reader.read_exact(&mut frame).await?;
    Ok(Some(frame))
}

/// Send a length-prefixed JSON message
pub(crate) async fn write_frame<W, T>(writer: &mut W, msg: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let msg_bytes = serde_json::to_vec(msg)?;
    let msg_len = (msg_bytes.len() as u32).to_le_bytes();

    writer.write_all(&msg_len).await?;
    writer.write_all(&msg_bytes).await?;

    Ok(())
}
