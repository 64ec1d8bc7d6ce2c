//! Subscriber setup.
//!
//! Level comes from `RUST_LOG` when set, else the configured level. The file
//! layer writes NDJSON to `<dir>/reelforge.log.YYYY-MM-DD`.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "reelforge.log";

/// Where log lines go besides the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    /// File plus stderr. CLI commands.
    FileAndConsole,
    /// File only; the terminal belongs to the TUI.
    FileOnly,
}

/// Install the global subscriber. A second call is a no-op.
pub fn init_logger<P: AsRef<Path>>(log_dir: P, level: &str, output: LogOutput) -> Result<()> {
    let log_dir = log_dir.as_ref();
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, LOG_FILE_PREFIX);
    let file_layer = fmt::layer().json().with_writer(file_appender).with_ansi(false);

    let console_layer = (output == LogOutput::FileAndConsole).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_ansi(true)
            .compact()
    });

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init();
    Ok(())
}
