//! Logging setup for the service.
//!
//! Installs a global tracing subscriber writing to stdout and to the event
//! log file. Event log lines carry a local timestamp and only ASCII bytes.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    fmt::{self, time::ChronoLocal, MakeWriter},
    prelude::*,
    util::TryInitError,
    EnvFilter, Registry,
};

use crate::config::LoggingConfig;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to prepare log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to install global tracing subscriber: {0}")]
    SetGlobal(#[from] TryInitError),
}

/// Writer that drops every non-ASCII byte before passing output on
#[derive(Clone, Debug)]
pub struct AsciiOnly<W> {
    inner: W,
}

impl<W> AsciiOnly<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }
}

impl<W: Write> Write for AsciiOnly<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let ascii: Vec<u8> = buf.iter().copied().filter(|b| b.is_ascii()).collect();
        self.inner.write_all(&ascii)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<'a, W> MakeWriter<'a> for AsciiOnly<W>
where
    W: Write + Clone + 'a,
{
    type Writer = AsciiOnly<W>;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Initialize tracing. Keep the returned guard alive so buffered event log
/// lines are flushed on shutdown.
pub fn init(config: &LoggingConfig) -> Result<WorkerGuard, LoggingError> {
    let (dir, file_name) = split_log_path(&config.event_log_path);
    std::fs::create_dir_all(&dir).map_err(|source| LoggingError::CreateDir {
        path: dir.clone(),
        source,
    })?;

    let file_appender = rolling::never(&dir, file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));
    let stdout_layer = fmt::layer()
        .with_timer(ChronoLocal::new(TIMESTAMP_FORMAT.to_string()))
        .with_writer(io::stdout);
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_timer(ChronoLocal::new(TIMESTAMP_FORMAT.to_string()))
        .with_writer(AsciiOnly::new(file_writer));

    Registry::default()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()?;

    tracing::info!("Logging initialized; event log at {}", config.event_log_path.display());
    Ok(guard)
}

fn split_log_path(path: &Path) -> (PathBuf, PathBuf) {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let file_name = path
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("system_log.txt"));
    (dir, file_name)
}
