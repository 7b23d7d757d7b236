//! Process signal handling.
//!
//! SIGINT and SIGTERM end the wait so the server can drain; SIGHUP runs a
//! reload callback and keeps waiting.

use std::fmt;

use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Interrupt,
    Terminate,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Interrupt => f.write_str("SIGINT"),
            Self::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// Waits for a shutdown signal, calling `on_hangup` for every SIGHUP
/// received meanwhile.
#[cfg(unix)]
pub async fn wait_for_shutdown<F>(mut on_hangup: F) -> std::io::Result<ShutdownSignal>
where
    F: FnMut(),
{
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut hangup = signal(SignalKind::hangup())?;

    let mut hangup_open = true;
    loop {
        tokio::select! {
            _ = interrupt.recv() => break Ok(ShutdownSignal::Interrupt),
            _ = terminate.recv() => break Ok(ShutdownSignal::Terminate),
            received = hangup.recv(), if hangup_open => match received {
                Some(()) => {
                    info!("Received SIGHUP (reload requested)");
                    on_hangup();
                }
                None => {
                    warn!("SIGHUP stream closed; reload disabled");
                    hangup_open = false;
                }
            },
        }
    }
}

/// Waits for Ctrl+C. There is no hangup signal on this platform.
#[cfg(not(unix))]
pub async fn wait_for_shutdown<F>(_on_hangup: F) -> std::io::Result<ShutdownSignal>
where
    F: FnMut(),
{
    tokio::signal::ctrl_c().await?;
    Ok(ShutdownSignal::Interrupt)
}
