use anyhow::{Context, Result};
use lattice_settings::{CustomMap, Settings, StaticFeatures};
use tracing::info;

/// Re-encodes a settings file; every record is kept, overrides stay as written.
pub(crate) fn convert(input: &str, output: &str) -> Result<()> {
    let settings = Settings::builder()
        .features(StaticFeatures::new())
        .disable_feature_overrides(true)
        .build();

    settings.load_custom(input).with_context(|| format!("Failed to read {input}"))?;
    let features = settings.custom_features();
    settings
        .save_custom(output, &CustomMap::default(), features.as_slice(), true)
        .with_context(|| format!("Failed to write {output}"))?;

    info!(input, output, records = settings.property_list().len(), "Converted");
    Ok(())
}
