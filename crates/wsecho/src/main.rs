//! # wsecho
//!
//! WebSocket echo server binary: loads settings, builds the runtime, binds
//! the listener and serves until Ctrl-C.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use wsecho_server::{EchoServer, ServerConfig};
use wsecho_settings::EchoSettings;

/// WebSocket echo server.
#[derive(Parser, Debug)]
#[command(name = "wsecho", version, about = "WebSocket echo server")]
struct Cli {
    /// Settings file (defaults to `~/.wsecho/settings.json`).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Host to bind (overrides settings).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides settings).
    #[arg(long)]
    port: Option<u16>,

    /// Number of I/O worker threads (overrides settings).
    #[arg(long)]
    worker_threads: Option<usize>,

    /// Log level or `EnvFilter` directive (overrides settings).
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    /// Settings from file and environment, with command-line flags on top.
    fn load_settings(&self) -> Result<EchoSettings> {
        let path = self
            .config
            .clone()
            .unwrap_or_else(wsecho_settings::settings_path);
        let mut settings = wsecho_settings::load_settings_from_path(&path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?;
        self.apply(&mut settings);
        settings.validate().context("Invalid command-line override")?;
        Ok(settings)
    }

    fn apply(&self, settings: &mut EchoSettings) {
        if let Some(ref host) = self.host {
            settings.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(threads) = self.worker_threads {
            settings.server.worker_threads = threads;
        }
        if let Some(ref level) = self.log_level {
            settings.logging.level.clone_from(level);
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = cli.load_settings()?;

    wsecho_core::init_subscriber(&settings.logging.level, settings.logging.format);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(settings.server.worker_threads)
        .thread_name("wsecho-worker")
        .enable_all()
        .build()
        .context("Failed to build Tokio runtime")?;

    runtime.block_on(run(settings))
}

async fn run(settings: EchoSettings) -> Result<()> {
    let metrics = match wsecho_server::metrics::install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!(error = %e, "metrics recorder unavailable");
            None
        }
    };

    let config = ServerConfig::from_settings(&settings).context("Invalid server settings")?;
    let server = EchoServer::bind(config).context("Failed to open listening socket")?;
    info!(
        addr = %server.local_addr(),
        worker_threads = settings.server.worker_threads,
        "wsecho listening"
    );

    let shutdown = Arc::clone(server.shutdown());
    let mut accept = server.spawn();

    let accept_finished = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl-C")?;
            info!("received Ctrl-C, shutting down");
            false
        }
        result = &mut accept => {
            if let Err(e) = result {
                error!(error = %e, "accept loop panicked");
            } else {
                warn!("accept loop stopped");
            }
            true
        }
    };

    let drained = shutdown
        .graceful_shutdown(Some(settings.server.shutdown_timeout()))
        .await;
    if !accept_finished {
        accept.await.context("Accept loop panicked")?;
    }

    if let Some(handle) = metrics {
        info!(snapshot = %handle.render(), "final metrics");
    }
    info!(drained, "shutdown complete");
    Ok(())
}
