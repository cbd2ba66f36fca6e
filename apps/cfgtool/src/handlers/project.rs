use crate::models::args::ProjectArgs;
use crate::models::config::ToolConfig;
use anyhow::{Context, Result};
use lattice_settings::{Platform, Settings, SetupOptions, StaticFeatures};
use std::path::PathBuf;
use tracing::debug;

/// Host view for the tool: packs are only used when named with `--pack`.
#[derive(Debug, Default)]
struct ToolPlatform;

impl Platform for ToolPlatform {
    fn executable_path(&self) -> Option<PathBuf> {
        None
    }
}

pub(crate) fn features(args: &ProjectArgs, cfg: &ToolConfig) -> StaticFeatures {
    let mut features = StaticFeatures::host();
    features.extend(cfg.features.iter().cloned());
    features.extend(args.features.iter().map(|tag| tag.trim().to_owned()));
    features
}

/// Builds a store with the built-in defaults and loads the project with its overrides.
pub(crate) fn open(args: &ProjectArgs, cfg: &ToolConfig) -> Result<Settings> {
    load(args, cfg, false)
}

/// Like [`open`], but without override files, so saving never copies local values back.
pub(crate) fn open_for_edit(args: &ProjectArgs, cfg: &ToolConfig) -> Result<Settings> {
    load(args, cfg, true)
}

fn load(args: &ProjectArgs, cfg: &ToolConfig, project_only: bool) -> Result<Settings> {
    let dir = args.project.clone().or_else(|| cfg.project.clone()).unwrap_or_else(|| ".".into());

    let settings = Settings::builder()
        .features(features(args, cfg))
        .platform(ToolPlatform)
        .core_defaults(true)
        .build();

    let mut options =
        SetupOptions::new(&dir).upwards(args.upwards).ignore_override(args.no_override);
    if let Some(pack) = &args.pack {
        options = options.main_pack(pack);
    }
    if project_only {
        options = options.project_only();
    }

    settings
        .setup(&options)
        .with_context(|| format!("No project found from {}", dir.display()))?;
    debug!(resource_path = ?settings.resource_path(), "Project opened");
    Ok(settings)
}
