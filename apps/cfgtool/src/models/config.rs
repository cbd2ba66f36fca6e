use config::{Config, Environment, File};
use lattice_logger::LogFormat;
use serde::Deserialize;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::debug;

const DEFAULT_CONFIG: &str = "lattice.toml";

#[derive(Debug, thiserror::Error)]
pub(crate) enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

trait ConfigErrorExt<T> {
    fn context(self, context: &'static str) -> Result<T, ConfigError>;
}

impl<T> ConfigErrorExt<T> for Result<T, config::ConfigError> {
    fn context(self, context: &'static str) -> Result<T, ConfigError> {
        self.map_err(|source| ConfigError::Config { source, context: Some(context.into()) })
    }
}

fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}

/// Settings of the tool itself, not of the project it edits.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ToolConfig {
    /// Project directory used when `--project` is not given.
    pub(crate) project: Option<PathBuf>,
    /// Feature tags active in addition to the host's.
    pub(crate) features: Vec<String>,
    pub(crate) log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub(crate) struct LogConfig {
    pub(crate) level: String,
    pub(crate) format: LogFormat,
    /// Also write rolling log files here.
    pub(crate) directory: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: "warn".to_owned(), format: LogFormat::Compact, directory: None }
    }
}

/// Layers an optional TOML file under `LATTICE__*` environment variables.
///
/// `LATTICE__LOG__LEVEL=debug` maps to `log.level`; `LATTICE__FEATURES=a,b` to `features`.
/// An explicitly named file must exist; the default `lattice.toml` is optional.
pub(crate) fn load_config(path: Option<&Path>) -> Result<ToolConfig, ConfigError> {
    let (file, required) =
        path.map_or_else(|| (PathBuf::from(DEFAULT_CONFIG), false), |p| (p.to_path_buf(), true));

    debug!(path = %file.display(), required, "Loading tool config");

    Config::builder()
        .add_source(File::from(file.as_path()).required(required))
        .add_source(
            Environment::with_prefix("LATTICE")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("features")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build config")?
        .try_deserialize::<ToolConfig>()
        .context("Failed to deserialize config")
}
