use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::{net::TcpListener, sync::oneshot};
use tracing::{debug, info, warn};

use tax_export::{Spreadsheet, TaxSheetExporter};
use tax_web::{AppConfig, AppState, app, logging, shutdown};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Income tax calculator web service.
///
/// Serves the input form, computes and stores each submission, and renders
/// the stored result. Flags override values from the config file.
#[derive(Debug, Parser)]
#[command(name = "tax-calculator", version, about)]
struct Cli {
    /// TOML config file; SIGHUP re-reads its log level.
    #[arg(short, long, env = "TAX_CALCULATOR_CONFIG")]
    config: Option<PathBuf>,

    /// Host to bind to.
    #[arg(long, env = "TAX_CALCULATOR_HOST")]
    host: Option<String>,

    /// Port to listen on.
    #[arg(short, long, env = "TAX_CALCULATOR_PORT")]
    port: Option<u16>,

    /// Directory served under /static.
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Export every record to CSV sheets in this directory.
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Log level or EnvFilter directive.
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn apply(
        &self,
        config: &mut AppConfig,
    ) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(dir) = &self.static_dir {
            config.server.static_dir = dir.clone();
        }
        if let Some(dir) = &self.export_dir {
            config.export.enabled = true;
            config.export.dir = dir.clone();
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}

// ─── reload ──────────────────────────────────────────────────────────────────

/// Re-reads the log level from the config file.
fn reload_log_level(config_path: Option<&Path>) {
    let Some(path) = config_path else {
        info!("no config file given; nothing to reload");
        return;
    };

    match AppConfig::load(path) {
        Ok(config) => match logging::set_log_level(&config.logging.level) {
            Ok(()) => info!(level = %config.logging.level, "log level reloaded"),
            Err(error) => warn!(%error, "log level reload failed"),
        },
        Err(error) => warn!(%error, "config reload failed"),
    }
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    cli.apply(&mut config);

    logging::init_logging(&config.logging.level);
    if let Some(file) = &config.logging.file {
        logging::enable_file_logging(file)?;
    }

    debug!("opening {} record store", config.storage.backend);
    let repo = app::build_registry()
        .create(&config.storage)
        .await
        .context("Failed to open record store")?;

    let mut state = AppState::new(repo);
    if config.export.enabled {
        info!(dir = %config.export.dir.display(), sheet = %config.export.sheet, "spreadsheet export enabled");
        state = state.with_exporter(TaxSheetExporter::new(
            Spreadsheet::new(&config.export.dir),
            &config.export.sheet,
        ));
    }

    let router = app::create_router(Arc::new(state), &config.server.static_dir);

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "Server running");

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = stop_rx.await;
            })
            .await
    });

    let config_path = cli.config.clone();
    tokio::select! {
        result = &mut server => {
            result.context("server task failed")?.context("server error")?;
            return Ok(());
        }
        signal = shutdown::wait_for_shutdown(|| reload_log_level(config_path.as_deref())) => {
            let signal = signal.context("cannot install signal handlers")?;
            info!(%signal, "shutting down...");
        }
    }

    let _ = stop_tx.send(());
    let timeout = config.server.shutdown_timeout();
    match tokio::time::timeout(timeout, server).await {
        Ok(joined) => {
            joined.context("server task failed")?.context("server error")?;
            info!("Server stopped cleanly.");
        }
        Err(_) => warn!(
            timeout_secs = timeout.as_secs(),
            "graceful shutdown timed out; dropping open connections"
        ),
    }

    Ok(())
}
