//! Logging for the tax calculator service.
//!
//! Events go to stdout and, once [`enable_file_logging`] has been called, to
//! an append-mode log file. Both sinks share one [`EnvFilter`] that sits
//! behind a reload layer, so [`set_log_level`] (driven by SIGHUP) can change
//! verbosity without a restart.
//!
//! Line format:
//!
//! ```text
//! 2026-10-19T14:02:11.482913+02:00  INFO handlers.rs:78 request{method=POST uri=/tax-calculator}: tax amount calculated id=… tax_amount=1750000
//! ```

use std::{
    fs::File,
    io::{self, IsTerminal, Write},
    path::Path,
    sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError},
};

use anyhow::Result;
use chrono::Local;
use tracing::{Event, Level, Subscriber, warn};
use tracing_subscriber::{
    EnvFilter,
    fmt::{
        FmtContext, FormattedFields, MakeWriter,
        format::{FormatEvent, FormatFields, Writer},
    },
    layer::SubscriberExt,
    registry::LookupSpan,
    reload,
    util::SubscriberInitExt,
};

const RESET: &str = "\x1b[0m";

/// Used when neither `RUST_LOG` nor the configured level parses.
const FALLBACK_LEVEL: &str = "info";

// ─── Formatter ───────────────────────────────────────────────────────────────

/// Formats one event as
/// `<local time> <LEVEL> <file:line> <span{fields}>: ... <fields>`.
///
/// The span chain comes from the current scope, so every event logged while
/// handling a request carries the method and URI recorded by `TraceLayer`.
/// ANSI colors are emitted only when the writer supports them.
struct LocalFmt;

/// Bold color for each level.
fn level_style(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "\x1b[1;31m",
        Level::WARN => "\x1b[1;33m",
        Level::INFO => "\x1b[1;32m",
        Level::DEBUG => "\x1b[1;34m",
        Level::TRACE => "\x1b[1;35m",
    }
}

impl<S, N> FormatEvent<S, N> for LocalFmt
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        let ansi = writer.has_ansi_escapes();
        let paint = |style: &'static str| if ansi { (style, RESET) } else { ("", "") };

        let timestamp = Local::now().format("%Y-%m-%dT%H:%M:%S%.6f%:z");
        let (dim, end) = paint("\x1b[2m");
        write!(writer, "{dim}{timestamp}{end} ")?;

        let (pre, post) = paint(level_style(meta.level()));
        write!(writer, "{pre}{:>5}{post} ", meta.level())?;

        if let (Some(file), Some(line)) = (meta.file(), meta.line()) {
            let file = file
                .strip_prefix("src/")
                .or_else(|| file.strip_prefix("src\\"))
                .unwrap_or(file);
            let (pre, post) = paint("\x1b[36m");
            write!(writer, "{pre}{file}:{line}{post} ")?;
        }

        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                write!(writer, "{}", span.name())?;
                let extensions = span.extensions();
                if let Some(fields) = extensions.get::<FormattedFields<N>>() {
                    if !fields.is_empty() {
                        write!(writer, "{{{fields}}}")?;
                    }
                }
                write!(writer, ": ")?;
            }
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

// ─── Log file sink ───────────────────────────────────────────────────────────

/// Shared handle to the optional log file.
///
/// The file layer is installed at startup with an empty sink; the config is
/// read afterwards and [`LogFile::replace`] opens the real file. Writes made
/// while the sink is empty are dropped.
#[derive(Clone, Default)]
struct LogFile(Arc<Mutex<Option<File>>>);

impl LogFile {
    fn replace(
        &self,
        file: File,
    ) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = Some(file);
    }
}

/// Holds the sink lock for the duration of one formatted event, so lines
/// from concurrent requests never interleave in the file.
struct LogFileWriter<'a>(MutexGuard<'a, Option<File>>);

impl Write for LogFileWriter<'_> {
    fn write(
        &mut self,
        buf: &[u8],
    ) -> io::Result<usize> {
        match self.0.as_mut() {
            Some(file) => file.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.as_mut().map_or(Ok(()), Write::flush)
    }
}

impl<'a> MakeWriter<'a> for LogFile {
    type Writer = LogFileWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        LogFileWriter(self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

// ─── Runtime handles ─────────────────────────────────────────────────────────

type ReloadFn = Box<dyn Fn(EnvFilter) -> Result<()> + Send + Sync>;

static RELOAD_FILTER: OnceLock<ReloadFn> = OnceLock::new();
static LOG_FILE: OnceLock<LogFile> = OnceLock::new();

/// Parses a bare level or a full `EnvFilter` directive.
fn parse_filter(directive: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(directive)
        .map_err(|e| anyhow::anyhow!("invalid log level '{directive}': {e}"))
}

/// Startup filter: `RUST_LOG` if it parses, else `default_level`, else
/// [`FALLBACK_LEVEL`]. Returns the reason when `default_level` was rejected.
fn make_filter(default_level: &str) -> (EnvFilter, Option<anyhow::Error>) {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return (filter, None);
    }
    match parse_filter(default_level) {
        Ok(filter) => (filter, None),
        Err(error) => (EnvFilter::new(FALLBACK_LEVEL), Some(error)),
    }
}

// ─── Public API ──────────────────────────────────────────────────────────────

/// Changes the active log filter at runtime.
///
/// Accepts a bare level ("error", "warn", "info", "debug", "trace") or any
/// full `EnvFilter` directive such as `"info,tax_web=debug"`.
///
/// # Errors
///
/// Fails if `level` does not parse or logging has not been initialized. The
/// current filter stays in effect in both cases.
pub fn set_log_level(level: &str) -> Result<()> {
    let apply = RELOAD_FILTER
        .get()
        .ok_or_else(|| anyhow::anyhow!("logging not yet initialized"))?;
    apply(parse_filter(level)?)
}

/// Starts appending log output to `path`, replacing any file opened earlier.
/// The parent directory must already exist.
pub fn enable_file_logging(path: &Path) -> Result<()> {
    let sink = LOG_FILE
        .get()
        .ok_or_else(|| anyhow::anyhow!("logging not yet initialized"))?;
    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| anyhow::anyhow!("cannot open log file '{}': {e}", path.display()))?;
    sink.replace(file);
    Ok(())
}

/// Installs the global subscriber. Call once at startup; later calls are
/// ignored.
///
/// - Stdout: colored when attached to a terminal, plain when piped.
/// - File: inactive until [`enable_file_logging`] is called.
/// - Level: `RUST_LOG` when set, otherwise `default_level`. An invalid
///   `default_level` falls back to `info` and is reported as a warning once
///   the subscriber is live.
pub fn init_logging(default_level: &str) {
    let sink = LOG_FILE.get_or_init(LogFile::default).clone();
    let (filter, rejected) = make_filter(default_level);
    let (level_filter, level_handle) = reload::Layer::new(filter);

    let stdout_layer = tracing_subscriber::fmt::layer()
        .event_format(LocalFmt)
        .with_ansi(io::stdout().is_terminal());

    let file_layer = tracing_subscriber::fmt::layer()
        .event_format(LocalFmt)
        .with_ansi(false)
        .with_writer(sink);

    let installed = tracing_subscriber::registry()
        .with(level_filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .is_ok();
    if !installed {
        return;
    }

    let _ = RELOAD_FILTER.set(Box::new(move |filter: EnvFilter| {
        level_handle
            .reload(filter)
            .map_err(|e| anyhow::anyhow!("filter reload failed: {e}"))
    }));

    if let Some(error) = rejected {
        warn!(%error, fallback = FALLBACK_LEVEL, "configured log level ignored");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Nothing in this test binary installs the subscriber.
    #[test]
    fn set_log_level_before_init_fails() {
        let err = set_log_level("debug").unwrap_err();

        assert_eq!(err.to_string(), "logging not yet initialized");
    }

    #[test]
    fn parse_filter_names_the_bad_directive() {
        assert!(parse_filter("debug").is_ok());
        assert!(parse_filter("info,tax_web=trace").is_ok());

        let err = parse_filter("tax_web=loud").unwrap_err();

        assert!(
            err.to_string().starts_with("invalid log level 'tax_web=loud'"),
            "got {err}"
        );
    }

    #[test]
    fn make_filter_reports_rejected_level() {
        // RUST_LOG takes precedence when it parses, and then nothing is rejected.
        let env_filter_active = EnvFilter::try_from_default_env().is_ok();

        let (_, rejected) = make_filter("tax_web=loud");

        assert_eq!(rejected.is_some(), !env_filter_active);
        assert!(make_filter("warn").1.is_none());
    }

    #[test]
    fn file_sink_drops_writes_until_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("service.log");
        let sink = LogFile::default();

        sink.make_writer().write_all(b"dropped\n").unwrap();
        sink.replace(File::create(&path).unwrap());
        sink.make_writer().write_all(b"kept\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "kept\n");
    }
}
