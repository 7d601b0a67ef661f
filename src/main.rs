//! HAR replay server.
//!
//! Answers rewritten browser requests from a recorded HTTP Archive without
//! contacting the original servers.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────────┐
//!                        │                   HAR REPLAY                     │
//!                        │                                                  │
//!   Rewritten request    │  ┌─────────┐   ┌──────────┐   ┌──────────────┐   │
//!   ─────────────────────┼─▶│  http   │──▶│  origin  │──▶│   matcher    │   │
//!   /x?rewritten_from=…  │  │ server  │   │ resolver │   │ (index walk) │   │
//!                        │  └─────────┘   └────┬─────┘   └──────┬───────┘   │
//!                        │                     │ 301            │           │
//!   Replayed response    │  ┌─────────┐        ▼                ▼           │
//!   ◀────────────────────┼──│response │◀──────────────────┌──────────────┐   │
//!                        │  │         │                   │  replayer    │   │
//!                        │  └─────────┘                   └──────────────┘   │
//!                        │                                                  │
//!                        │  ┌────────────────────────────────────────────┐  │
//!                        │  │ archive store (atomic swap) ◀─ /loadHAR,   │  │
//!                        │  │                                admin, watch│  │
//!                        │  └────────────────────────────────────────────┘  │
//!                        └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use har_replay::admin::{setup_admin_router, AdminState};
use har_replay::archive::{ArchiveStore, ArchiveWatcher};
use har_replay::config::{load_config, validate_config, ConfigError, ReplayConfig};
use har_replay::http::HttpServer;
use har_replay::lifecycle::{shutdown::stopped, wait_for_shutdown_signal, Shutdown};
use har_replay::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "har-replay")]
#[command(about = "Replay recorded HTTP traffic from a HAR archive", long_about = None)]
struct Args {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listener bind address, overrides the config file.
    #[arg(short, long)]
    bind: Option<String>,

    /// Archive file name to load at startup.
    #[arg(short, long)]
    archive: Option<String>,

    /// Directory archive file names are resolved against.
    #[arg(long)]
    archive_dir: Option<String>,

    /// Reload the active archive when its file changes.
    #[arg(long)]
    watch: bool,
}

impl Args {
    fn apply(self, config: &mut ReplayConfig) {
        if let Some(bind) = self.bind {
            config.listener.bind_address = bind;
        }
        if let Some(archive) = self.archive {
            config.archive.initial = Some(archive);
        }
        if let Some(dir) = self.archive_dir {
            config.archive.directory = dir;
        }
        if self.watch {
            config.archive.watch = true;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ReplayConfig::default(),
    };
    args.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init(&config.observability);
    tracing::info!("har-replay v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        archive_directory = %config.archive.directory,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Validated above.
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let store = Arc::new(ArchiveStore::new(&config.archive.directory));
    if let Some(initial) = &config.archive.initial {
        store.load_file(initial)?;
    }

    let _watcher = if config.archive.watch {
        match ArchiveWatcher::new(store.clone()).run() {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                tracing::warn!(error = %e, "Archive watcher unavailable; reload via /loadHAR instead");
                None
            }
        }
    } else {
        None
    };

    let shutdown = Shutdown::new();

    if config.admin.enabled {
        let listener = TcpListener::bind(&config.admin.bind_address).await?;
        tracing::info!(address = %listener.local_addr()?, "Admin API listening");

        let app = setup_admin_router(AdminState::new(store.clone(), &config.admin.api_key));
        let admin_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(stopped(admin_shutdown))
                .await
            {
                tracing::error!(error = %e, "Admin API failed");
            }
        });
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config, store);
    let mut server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    tokio::select! {
        result = &mut server_task => result??,
        _ = wait_for_shutdown_signal() => {
            shutdown.trigger();
            server_task.await??;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
