//! Logging setup.
//!
//! A [`Logger`] installs the global `tracing` subscriber: an env filter plus a
//! console fmt layer, and optionally a non-blocking file layer. The file
//! writer flushes when the logger is dropped, so keep it alive for the whole
//! program.
//!
//! Only one subscriber can be installed per process. Installing again is not
//! an error: the new logger reports [`Logger::is_installed`] as `false` and
//! logging keeps going to the first one.

use crate::error::{NavFlowError, Result};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter directive
pub const DEFAULT_LEVEL: &str = "info";

pub struct Logger {
    file: Option<PathBuf>,
    installed: bool,
    _guard: Option<WorkerGuard>,
}

impl Logger {
    /// Log to the console only.
    ///
    /// `level` is an env-filter directive such as `"info"` or
    /// `"warn,navflow=debug"`.
    pub fn console(level: &str) -> Result<Self> {
        let filter = parse_filter(level)?;
        let installed = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .is_ok();
        Ok(Self::finish(None, installed, None))
    }

    /// Log to the console and append to `path`.
    pub fn console_and_file(level: &str, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let filter = parse_filter(level)?;

        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let file_name = path.file_name().ok_or_else(|| {
            NavFlowError::Logging(format!("log path {} has no file name", path.display()))
        })?;
        std::fs::create_dir_all(dir).map_err(|e| {
            NavFlowError::Logging(format!("cannot create log directory {}: {}", dir.display(), e))
        })?;

        let file_appender = tracing_appender::rolling::never(dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false);

        let installed = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .with(file_layer)
            .try_init()
            .is_ok();
        Ok(Self::finish(Some(path.to_path_buf()), installed, Some(guard)))
    }

    fn finish(file: Option<PathBuf>, installed: bool, guard: Option<WorkerGuard>) -> Self {
        if installed {
            match &file {
                Some(path) => tracing::info!("Logging to console and {}", path.display()),
                None => tracing::debug!("Logging to console"),
            }
        } else {
            tracing::debug!("A logger is already installed, keeping it");
        }
        Self {
            file,
            installed,
            // A guard without an installed subscriber has nothing to flush.
            _guard: guard.filter(|_| installed),
        }
    }

    /// Whether this logger installed the global subscriber.
    pub fn is_installed(&self) -> bool {
        self.installed
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file.as_deref()
    }
}

fn parse_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(level)
        .map_err(|e| NavFlowError::Logging(format!("invalid log level '{}': {}", level, e)))
}
