//! # Logger
//!
//! Tracing setup shared by the Lattice tools.
//!
//! Console output goes to stderr in one of the [`LogFormat`] styles, so commands that print
//! setting values on stdout can be piped safely. A [`FileOutput`] adds rolling log files
//! behind a non-blocking writer.
//!
//! The level given to [`LoggerBuilder::level`] is only a default: `RUST_LOG` directives win
//! unless an explicit filter is set with [`LoggerBuilder::env_filter`]
//! (e.g. `"lattice_settings=debug,lattice_storage=info"`).
//!
//! ## Example
//!
//! ```rust
//! use lattice_logger::{LevelFilter, LogFormat, Logger};
//!
//! let _logger = Logger::builder("lattice-cfg")
//!     .format(LogFormat::Compact)
//!     .level(LevelFilter::DEBUG)
//!     .init()
//!     .unwrap();
//! ```

mod error;
mod format;

pub use crate::error::{LoggerError, LoggerErrorExt};
pub use crate::format::LogFormat;
pub use tracing::level_filters::LevelFilter;
pub use tracing_appender::rolling::Rotation;

use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Rolling log files written next to the console output.
#[derive(Debug, Clone)]
pub struct FileOutput {
    dir: PathBuf,
    rotation: Rotation,
    max_files: usize,
    json: bool,
}

impl FileOutput {
    /// Files named `<logger name>.<date>.log` inside `dir`, rotated daily, ten kept.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), rotation: Rotation::DAILY, max_files: 10, json: false }
    }

    #[must_use = "FileOutput is a value; pass it to LoggerBuilder::file"]
    pub fn rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    #[must_use = "FileOutput is a value; pass it to LoggerBuilder::file"]
    pub const fn max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files;
        self
    }

    /// One JSON object per line instead of plain text.
    #[must_use = "FileOutput is a value; pass it to LoggerBuilder::file"]
    pub const fn json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    fn layer(self, name: &str) -> Result<(BoxedLayer, WorkerGuard), LoggerError> {
        if self.max_files == 0 {
            return Err(LoggerError::invalid("max_files must be greater than zero"));
        }
        std::fs::create_dir_all(&self.dir)
            .context(format!("Failed to create log directory {}", self.dir.display()))?;

        let appender = RollingFileAppender::builder()
            .rotation(self.rotation)
            .filename_prefix(name)
            .filename_suffix("log")
            .max_log_files(self.max_files)
            .build(&self.dir)?;
        let (writer, guard) = tracing_appender::non_blocking(appender);

        let plain = layer().with_writer(writer).with_ansi(false);
        let layer = if self.json { plain.json().boxed() } else { plain.boxed() };
        Ok((layer, guard))
    }
}

/// Configures the process-wide tracing subscriber; see [`Logger::builder`].
#[derive(Debug)]
pub struct LoggerBuilder {
    name: String,
    console: bool,
    format: LogFormat,
    level: LevelFilter,
    env_filter: Option<String>,
    file: Option<FileOutput>,
}

impl LoggerBuilder {
    #[must_use = "The builder does nothing until init is called"]
    pub const fn console(mut self, enabled: bool) -> Self {
        self.console = enabled;
        self
    }

    #[must_use = "The builder does nothing until init is called"]
    pub const fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Default level for targets that no filter directive mentions.
    #[must_use = "The builder does nothing until init is called"]
    pub const fn level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    /// Replaces `RUST_LOG` with explicit directives. Invalid directives fail [`Self::init`].
    #[must_use = "The builder does nothing until init is called"]
    pub fn env_filter(mut self, directives: impl Into<String>) -> Self {
        self.env_filter = Some(directives.into());
        self
    }

    #[must_use = "The builder does nothing until init is called"]
    pub fn file(mut self, output: FileOutput) -> Self {
        self.file = Some(output);
        self
    }

    /// Installs the global subscriber.
    ///
    /// Keep the returned [`Logger`] alive until exit; dropping it flushes and stops the file
    /// writer.
    ///
    /// # Errors
    /// - [`LoggerError::InvalidConfiguration`] for an empty name, no enabled output, zero
    ///   `max_files` or an unparsable filter.
    /// - [`LoggerError::Io`] / [`LoggerError::Appender`] if the log directory is unusable.
    /// - [`LoggerError::Subscriber`] if a global subscriber is already installed.
    pub fn init(self) -> Result<Logger, LoggerError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(LoggerError::invalid("Logger name cannot be empty"));
        }
        if !self.console && self.file.is_none() {
            return Err(LoggerError::invalid("Enable console or file output"));
        }
        let filter = self.filter()?;

        let mut layers: Vec<BoxedLayer> = Vec::with_capacity(2);
        if self.console {
            layers.push(console_layer(self.format));
        }
        let guard = match self.file {
            Some(output) => {
                let (layer, guard) = output.layer(name)?;
                layers.push(layer);
                Some(guard)
            },
            None => None,
        };

        tracing_subscriber::registry().with(layers).with(filter).try_init()?;
        Ok(Logger { guard })
    }

    fn filter(&self) -> Result<EnvFilter, LoggerError> {
        let builder = EnvFilter::builder().with_default_directive(self.level.into());
        match &self.env_filter {
            None => Ok(builder.from_env_lossy()),
            Some(directives) => builder.parse(directives).map_err(|e| {
                LoggerError::invalid(format!("Invalid filter '{directives}': {e}"))
            }),
        }
    }
}

/// Handle to the installed subscriber.
#[must_use = "Dropping the handle stops the background file writer"]
#[derive(Debug)]
pub struct Logger {
    guard: Option<WorkerGuard>,
}

impl Logger {
    /// Starts a configuration; `name` prefixes log file names.
    ///
    /// Console output is on, compact, at `INFO` by default.
    pub fn builder(name: impl Into<String>) -> LoggerBuilder {
        LoggerBuilder {
            name: name.into(),
            console: true,
            format: LogFormat::default(),
            level: LevelFilter::INFO,
            env_filter: None,
            file: None,
        }
    }

    /// Whether log files are being written.
    #[must_use]
    pub const fn has_file_output(&self) -> bool {
        self.guard.is_some()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if self.guard.is_some() {
            tracing::debug!("Flushing log files");
        }
    }
}

fn console_layer(format: LogFormat) -> BoxedLayer {
    let base = layer().with_writer(std::io::stderr).with_ansi(std::io::stderr().is_terminal());
    match format {
        LogFormat::Compact => base.compact().boxed(),
        LogFormat::Pretty => base.pretty().boxed(),
        LogFormat::Json => base.json().boxed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn defaults() {
        let builder = Logger::builder("lattice-test");
        assert!(builder.console);
        assert_eq!(builder.format, LogFormat::Compact);
        assert_eq!(builder.level, LevelFilter::INFO);
        assert!(builder.file.is_none());

        let output = FileOutput::new("logs").max_files(3).json(true);
        assert_eq!((output.max_files, output.json), (3, true));
    }

    #[test]
    #[serial]
    fn rejects_blank_name() {
        let err = Logger::builder("  ").init().unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }

    #[test]
    #[serial]
    fn rejects_no_output() {
        let err = Logger::builder("lattice-test").console(false).init().unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }

    #[test]
    #[serial]
    fn rejects_bad_directives() {
        let err = Logger::builder("lattice-test")
            .env_filter("lattice_settings=loud")
            .init()
            .unwrap_err();
        assert!(err.to_string().contains("lattice_settings=loud"));
    }

    #[test]
    #[serial]
    fn rejects_zero_kept_files() {
        let tmp = tempfile::tempdir().unwrap();
        let err = Logger::builder("lattice-test")
            .file(FileOutput::new(tmp.path()).max_files(0))
            .init()
            .unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }
}
