//! Logging setup.
//!
//! Events go to stderr and are appended to a log file in the indexed root,
//! one line per event:
//!
//! ```text
//! 2024-05-01 09:30:00 - INFO - Indexed file file=ProjectA/plan.txt kind=text
//! ```
//!
//! `RUST_LOG` takes precedence over the configured level.

use crate::{CoreError, LoggingConfig};
use std::fmt;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Local wall-clock time, second precision.
struct LocalTime;

impl FormatTime for LocalTime {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{}", chrono::Local::now().format(TIME_FORMAT))
    }
}

/// `<time> - <LEVEL> - <message and fields>`
struct LogFileFormat;

impl<S, N> FormatEvent<S, N> for LogFileFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(
            writer,
            "{} - {} - ",
            chrono::Local::now().format(TIME_FORMAT),
            event.metadata().level()
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Build the level filter: `RUST_LOG` if set, else the configured level.
pub fn filter(config: &LoggingConfig) -> Result<EnvFilter, CoreError> {
    EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(&config.level)
            .map_err(|e| CoreError::Config(format!("invalid log level {}: {}", config.level, e)))
    })
}

/// Path of the log file for a run over `root`.
pub fn log_file_path(root: &Path, config: &LoggingConfig) -> PathBuf {
    root.join(&config.file_name)
}

/// Install the global subscriber for a run over `root`.
///
/// Returns the log file path. If a subscriber is already installed the
/// existing one is kept.
pub fn init(root: &Path, config: &LoggingConfig) -> Result<PathBuf, CoreError> {
    let filter = filter(config)?;
    let path = log_file_path(root, config);
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_timer(LocalTime)
        .with_target(false);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .event_format(LogFileFormat);

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init();

    if installed.is_err() {
        tracing::debug!("Global subscriber already installed");
    }

    Ok(path)
}

/// Stderr-only logging for failures that happen before the root is known.
pub fn init_stderr(level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .with_timer(LocalTime)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_log_file_path() {
        let config = LoggingConfig::default();
        assert_eq!(
            log_file_path(Path::new("/docs"), &config),
            PathBuf::from("/docs/search_builder_processing_log.txt")
        );
    }

    #[test]
    fn test_file_format_writes_level_and_message() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("log.txt");
        let file = OpenOptions::new().create(true).append(true).open(&path).unwrap();

        let subscriber = tracing_subscriber::registry().with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .event_format(LogFileFormat),
        );
        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(file = "a.txt", "Extraction failed");
        });

        let written = std::fs::read_to_string(&path).unwrap();
        let line = written.lines().next().unwrap();
        let (time, rest) = line.split_once(" - ").unwrap();
        assert_eq!(time.len(), "2024-01-01 00:00:00".len());
        assert_eq!(rest, "WARN - Extraction failed file=\"a.txt\"");
    }
}
