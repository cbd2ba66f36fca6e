//! Writing the settings map to text or binary files.

use crate::error::SettingsError;
use crate::format::{SectionMap, binary, join_section, split_section, text};
use crate::store::Settings;
use fxhash::FxHashMap;
use lattice_domain::constants::{
    BINARY_EXTENSION, DETACHED_ORDER, PROJECT_FILE_TEXT, RES_SCHEME, TEXT_EXTENSION,
};
use lattice_domain::{SettingFlags, Value};
use std::path::Path;
use tracing::info;

/// Explicit entries for [`Settings::save_custom`], keyed by full setting key.
pub type CustomMap = FxHashMap<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Text,
    Binary,
}

impl Settings {
    /// Writes every changed setting to `res://project.cfg`, with the current custom features.
    ///
    /// # Errors
    /// Returns [`SettingsError::WriteFailure`] if the file cannot be written.
    pub fn save(&self) -> Result<(), SettingsError> {
        let path = format!("{RES_SCHEME}{PROJECT_FILE_TEXT}");
        let features = self.custom_features();
        self.save_custom(&path, &CustomMap::default(), features.as_slice(), true)?;

        let modified = self.vfs.modified_time(&path);
        self.state.lock().last_save_time = modified;
        Ok(())
    }

    /// Writes `custom`, plus every changed record when `merge` is set, to `path`.
    ///
    /// With `merge`, a record is written when it is not hidden, its value differs from its
    /// initial value, and `custom` has no entry for it. Entries are sorted by order, then
    /// name, and grouped by section. The format follows the extension of `path`.
    ///
    /// # Errors
    /// Returns [`SettingsError::InvalidParameter`] for an empty path,
    /// [`SettingsError::UnrecognizedFormat`] for an unknown extension,
    /// [`SettingsError::Encode`] if a value cannot be encoded, and
    /// [`SettingsError::WriteFailure`] if the file cannot be written.
    pub fn save_custom(
        &self,
        path: &str,
        custom: &CustomMap,
        features: &[impl AsRef<str>],
        merge: bool,
    ) -> Result<(), SettingsError> {
        if path.is_empty() {
            return Err(SettingsError::InvalidParameter {
                message: "save path is empty".into(),
                context: None,
            });
        }
        let format = file_format(path)?;

        let mut entries = self.collect(custom, merge);
        entries.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

        let mut sections = SectionMap::new();
        for (_, key, value) in entries {
            let (section, name) = split_section(&key);
            sections.entry(section.to_owned()).or_default().push((name.to_owned(), value));
        }

        let feature_list = features
            .iter()
            .map(|tag| tag.as_ref().trim().replace('"', ""))
            .filter(|tag| !tag.is_empty())
            .collect::<Vec<_>>()
            .join(",");

        let bytes = match format {
            FileFormat::Text => text::write(&sections, &feature_list).into_bytes(),
            FileFormat::Binary => {
                let flat: Vec<(String, &Value)> = sections
                    .iter()
                    .flat_map(|(section, names)| {
                        names.iter().map(move |(name, value)| (join_section(section, name), value))
                    })
                    .collect();
                let records = flat.iter().map(|(key, value)| (key.as_str(), *value));
                binary::encode(records, &feature_list)?
            },
        };

        self.vfs.write(path, &bytes).map_err(|source| SettingsError::WriteFailure {
            source,
            context: Some(path.to_owned().into()),
        })?;

        let records: usize = sections.values().map(Vec::len).sum();
        info!(path, records, format = ?format, "Settings saved");
        Ok(())
    }

    /// Snapshot of `(order, key, value)` triples to write, taken under one lock.
    fn collect(&self, custom: &CustomMap, merge: bool) -> Vec<(i32, String, Value)> {
        let state = self.state.lock();
        let mut entries = Vec::with_capacity(custom.len());

        if merge {
            entries.extend(
                state
                    .records
                    .iter()
                    .filter(|(key, record)| {
                        !record.flags.contains(SettingFlags::HIDDEN)
                            && record.is_changed()
                            && !custom.contains_key(*key)
                    })
                    .map(|(key, record)| (record.order, key.clone(), record.value.clone())),
            );
        }

        entries.extend(custom.iter().map(|(key, value)| {
            let order = state.records.get(key).map_or(DETACHED_ORDER, |record| record.order);
            (order, key.clone(), value.clone())
        }));

        entries
    }
}

fn file_format(path: &str) -> Result<FileFormat, SettingsError> {
    match Path::new(path).extension().and_then(|ext| ext.to_str()) {
        Some(TEXT_EXTENSION) => Ok(FileFormat::Text),
        Some(BINARY_EXTENSION) => Ok(FileFormat::Binary),
        _ => Err(SettingsError::UnrecognizedFormat {
            message: format!("expected .{TEXT_EXTENSION} or .{BINARY_EXTENSION}").into(),
            context: Some(path.to_owned().into()),
        }),
    }
}
