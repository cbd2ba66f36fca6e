use crate::handlers::project;
use crate::models::args::ProjectArgs;
use crate::models::config::ToolConfig;
use anyhow::Result;
use lattice_domain::{PropertyUsage, ValueKind};
use lattice_settings::format::literal;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct Listed {
    name: String,
    kind: ValueKind,
    value: String,
    basic: bool,
}

pub(crate) fn get(key: &str, args: &ProjectArgs, cfg: &ToolConfig) -> Result<()> {
    let settings = project::open(args, cfg)?;
    let value = settings.get(key)?;
    writeln!(std::io::stdout().lock(), "{}", literal::to_string(&value))?;
    Ok(())
}

pub(crate) fn list(json: bool, args: &ProjectArgs, cfg: &ToolConfig) -> Result<()> {
    let settings = project::open(args, cfg)?;
    let listed: Vec<Listed> = settings
        .property_list()
        .into_iter()
        .map(|info| {
            let value = settings.get(&info.name).map(|v| literal::to_string(&v));
            let basic = info.usage.contains(PropertyUsage::EDITOR_BASIC_SETTING);
            let value = value.unwrap_or_default();
            Listed { name: info.name, kind: info.kind, value, basic }
        })
        .collect();

    let mut out = std::io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut out, &listed)?;
        writeln!(out)?;
    } else {
        for entry in &listed {
            writeln!(out, "{}={}", entry.name, entry.value)?;
        }
    }
    Ok(())
}

pub(crate) fn autoloads(args: &ProjectArgs, cfg: &ToolConfig) -> Result<()> {
    let settings = project::open(args, cfg)?;
    let mut out = std::io::stdout().lock();
    for info in settings.autoloads() {
        let kind = if info.is_singleton { "singleton" } else { "script" };
        writeln!(out, "{}\t{}\t{kind}", info.name, info.path)?;
    }
    Ok(())
}

pub(crate) fn features(args: &ProjectArgs, cfg: &ToolConfig) -> Result<()> {
    let settings = project::open(args, cfg)?;
    let active = project::features(args, cfg);

    let mut out = std::io::stdout().lock();
    for tag in active.tags() {
        writeln!(out, "{tag}")?;
    }
    for tag in settings.custom_features() {
        writeln!(out, "{tag}\t(custom)")?;
    }
    Ok(())
}
