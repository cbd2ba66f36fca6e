use crate::handlers::project;
use crate::models::args::ProjectArgs;
use crate::models::config::ToolConfig;
use anyhow::{Context, Result};
use lattice_domain::Value;
use lattice_domain::constants::{PROJECT_FILE_BINARY, RES_SCHEME};
use lattice_settings::CustomMap;
use lattice_settings::format::literal;
use tracing::info;

#[derive(Debug)]
pub(crate) struct SetRequest<'a> {
    pub(crate) key: &'a str,
    pub(crate) value: &'a str,
    pub(crate) verbatim: bool,
    pub(crate) output: Option<&'a str>,
}

pub(crate) fn set(request: &SetRequest<'_>, args: &ProjectArgs, cfg: &ToolConfig) -> Result<()> {
    let value = if request.verbatim {
        Value::from(request.value)
    } else {
        literal::parse(request.value)
            .with_context(|| format!("'{}' is not a value literal; use --string", request.value))?
    };

    let settings = project::open_for_edit(args, cfg)?;
    settings.set(request.key, value);

    // A binary project file shadows the text one on the next load, so keep writing it.
    let binary = format!("{RES_SCHEME}{PROJECT_FILE_BINARY}");
    let target = request.output.or_else(|| settings.vfs().exists(&binary).then_some(&*binary));

    match target {
        Some(path) => {
            let features = settings.custom_features();
            settings.save_custom(path, &CustomMap::default(), features.as_slice(), true)?;
        },
        None => settings.save()?,
    }
    info!(key = request.key, "Setting saved");
    Ok(())
}
