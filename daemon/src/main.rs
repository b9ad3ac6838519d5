//! keyhook-daemon: watches global shortcuts and sends webhook notifications
//!
//! The daemon provides:
//! - Global key capture (or scripted replay) on a dedicated thread
//! - Exact-set shortcut detection over the currently held keys
//! - Cooldown-limited, fire-and-forget HTTP notifications
//! - IPC server for status queries, event subscription and quit

mod cli;
mod config;
mod detector;
mod dispatch;
mod events;
mod hotkey;
mod ipc;
mod keys;
mod lifecycle;
mod shortcut;

use std::fs::File;
use std::io::{self, BufReader};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::Config;
use crate::detector::Detector;
use crate::dispatch::{DispatchGovernor, HttpNotifier, NotificationTarget};
use crate::events::DetectorEvent;
use crate::hotkey::{CaptureSource, HotkeyListener, ScriptSource};
use crate::ipc::Server;
use crate::lifecycle::ShutdownSignal;
use crate::shortcut::Registry;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "keyhook-daemon starting");

    let cli = Cli::parse();

    // Load configuration; any failure here is fatal
    let mut config = Config::load(&cli.settings)
        .with_context(|| format!("failed to load settings from {}", cli.settings.display()))?;
    if let Some(socket) = &cli.socket {
        config.socket_path = socket.clone();
    }

    let registry = Registry::load(&cli.keys)
        .with_context(|| format!("failed to load shortcuts from {}", cli.keys.display()))?;
    if registry.is_empty() {
        warn!("no shortcuts configured; nothing will ever fire");
    }
    for (index, shortcut) in registry.iter().enumerate() {
        if shortcut.is_satisfiable() {
            info!(index = index + 1, keys = %shortcut.joined("+"), "monitoring shortcut");
        } else {
            warn!(
                index = index + 1,
                keys = %shortcut.joined("+"),
                "shortcut names an unknown key and can never fire"
            );
        }
    }

    let target = NotificationTarget::new(&config.url, &config.user_uid)
        .context("invalid notification target")?;
    info!(
        url = %target.base(),
        cooldown_ms = config.cooldown.as_millis() as u64,
        "configuration loaded"
    );

    let notifier = Arc::new(HttpNotifier::new(config.request_timeout)?);
    let governor = DispatchGovernor::new(notifier.clone(), target, config.cooldown);

    // Shared shutdown token: signals, IPC quit and end of capture all end here
    let cancel = CancellationToken::new();
    let mut shutdown =
        ShutdownSignal::new(cancel.clone()).context("failed to install signal handlers")?;

    // Capture thread -> detector
    let (key_tx, key_rx) = mpsc::channel(64);
    // Detector -> IPC server (status view and subscribers)
    let (event_tx, _event_rx) = broadcast::channel::<DetectorEvent>(64);

    let source = capture_source(&cli)?;
    let mut listener = HotkeyListener::new(key_tx, cancel.clone());
    listener.start(source).context("failed to start key capture")?;

    let shortcut_count = registry.len();
    let mut detector = Detector::new(registry, governor, event_tx.clone());

    let server = if cli.no_ipc {
        None
    } else {
        Some(Server::new(
            &config.socket_path,
            shortcut_count,
            event_tx.clone(),
            cancel.clone(),
        )?)
    };
    let status_rx = event_tx.subscribe();

    info!("daemon initialized, entering main loop");

    // Main event loop
    tokio::select! {
        // Run the detector (processes key events)
        _ = detector.run(key_rx, cancel.clone()) => {
            info!("detector exited");
        }

        // Run the IPC server (accepts client connections, tracks status)
        result = serve_status(server.as_ref(), status_rx) => {
            if let Err(e) = result {
                error!(?e, "IPC server error");
            }
        }

        // Wait for shutdown signal
        _ = shutdown.wait() => {
            info!("shutdown requested");
        }
    }

    // Cleanup
    info!(
        fired = detector.governor().fired_count(),
        suppressed = detector.governor().suppressed_count(),
        "shutting down..."
    );

    listener.stop();
    if let Some(server) = &server {
        server.shutdown().await;
    }

    if !notifier.drain(config.request_timeout).await {
        warn!(in_flight = notifier.in_flight(), "abandoning in-flight notifications");
    }

    info!("keyhook-daemon stopped");

    Ok(())
}

/// Pick the key event source: a replay script when given, else the OS hook
fn capture_source(cli: &Cli) -> Result<Box<dyn CaptureSource>> {
    if let Some(path) = &cli.replay {
        let parsed = if path.as_os_str() == "-" {
            ScriptSource::from_reader(io::stdin().lock())
        } else {
            let file = File::open(path)
                .with_context(|| format!("failed to open replay script {}", path.display()))?;
            ScriptSource::from_reader(BufReader::new(file))
        };
        let source = parsed.context("invalid replay script")?;

        info!(steps = source.len(), "replaying key events");
        return Ok(Box::new(source));
    }

    global_capture()
}

#[cfg(feature = "global-capture")]
fn global_capture() -> Result<Box<dyn CaptureSource>> {
    Ok(Box::new(crate::hotkey::GlobalCapture))
}

#[cfg(not(feature = "global-capture"))]
fn global_capture() -> Result<Box<dyn CaptureSource>> {
    anyhow::bail!(
        "built without global keyboard capture; \
         rebuild with `--features global-capture` or pass --replay"
    )
}

/// Run the status server, or idle forever when it is disabled
async fn serve_status(
    server: Option<&Server>,
    status_rx: broadcast::Receiver<DetectorEvent>,
) -> Result<()> {
    let Some(server) = server else {
        std::future::pending::<()>().await;
        return Ok(());
    };

    tokio::select! {
        result = server.run() => result,
        _ = server.track(status_rx) => Ok(()),
    }
}
