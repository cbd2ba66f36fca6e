//! Unlocked helpers over the settings map.
//!
//! Every function here expects the caller to hold the settings lock and never takes it
//! itself, so public operations can compose them freely without re-entering the mutex.

use crate::error::SettingsError;
use crate::features::FeatureSet;
use crate::record::{DEFINE_MASK, DefineOptions, SettingRecord};
use fxhash::{FxHashMap, FxHashSet};
use lattice_domain::constants::{
    AUTOLOAD_PREFIX, CUSTOM_FEATURES_KEY, NO_BUILTIN_ORDER_BASE, STORAGE_ONLY_PREFIXES,
};
use lattice_domain::{AutoloadInfo, PropertyInfo, PropertyUsage, SettingFlags, Value};
use std::path::PathBuf;
use std::time::SystemTime;
use tracing::{debug, warn};

#[derive(Debug)]
pub(crate) struct SettingsState {
    pub(crate) records: FxHashMap<String, SettingRecord>,
    /// Base key to the full dotted key whose value wins on read.
    pub(crate) overrides: FxHashMap<String, String>,
    pub(crate) custom_features: FxHashSet<String>,
    pub(crate) autoloads: FxHashMap<String, AutoloadInfo>,
    pub(crate) last_order: i32,
    pub(crate) last_builtin_order: i32,
    pub(crate) disable_feature_overrides: bool,
    pub(crate) resource_path: Option<PathBuf>,
    pub(crate) last_save_time: Option<SystemTime>,
}

impl Default for SettingsState {
    fn default() -> Self {
        Self {
            records: FxHashMap::default(),
            overrides: FxHashMap::default(),
            custom_features: FxHashSet::default(),
            autoloads: FxHashMap::default(),
            last_order: NO_BUILTIN_ORDER_BASE,
            last_builtin_order: 0,
            disable_feature_overrides: false,
            resource_path: None,
            last_save_time: None,
        }
    }
}

impl SettingsState {
    pub(crate) fn set(&mut self, key: &str, value: Value, features: &dyn FeatureSet) {
        if value.is_nil() {
            self.remove(key);
            return;
        }

        if key == CUSTOM_FEATURES_KEY {
            self.add_custom_features(&value);
            return;
        }

        if !self.disable_feature_overrides {
            self.register_override(key, features);
        }

        if let Some(record) = self.records.get_mut(key) {
            if record.flags.contains(SettingFlags::OVERRIDDEN) {
                debug!(key, "Write to locked setting ignored");
            } else {
                record.value = value.clone();
            }
        } else {
            let order = self.next_order();
            self.records.insert(key.to_owned(), SettingRecord::new(value.clone(), order));
        }

        if let Some(name) = autoload_name(key) {
            match value.as_str() {
                Some(raw) => {
                    let info = AutoloadInfo::from_setting(name, raw);
                    self.autoloads.insert(name.to_owned(), info);
                },
                None => warn!(key, kind = %value.kind(), "Autoload value is not a path"),
            }
        }
    }

    /// Drops a record and whatever autoload was derived from it.
    pub(crate) fn remove(&mut self, key: &str) -> Option<SettingRecord> {
        let removed = self.records.remove(key);
        if let Some(name) = autoload_name(key) {
            self.autoloads.remove(name);
        }
        removed
    }

    pub(crate) fn get(&self, key: &str) -> Result<&Value, SettingsError> {
        let resolved = self.resolve(key);
        self.records
            .get(resolved)
            .map(|record| &record.value)
            .ok_or_else(|| SettingsError::key_not_found(resolved))
    }

    /// The key a read of `key` is served from. An override stays registered after its
    /// record is cleared, so reads of the base key then fail until it is set again.
    pub(crate) fn resolve<'a>(&'a self, key: &'a str) -> &'a str {
        if self.disable_feature_overrides {
            return key;
        }
        self.overrides.get(key).map_or(key, String::as_str)
    }

    pub(crate) fn record(&self, key: &str) -> Result<&SettingRecord, SettingsError> {
        self.records.get(key).ok_or_else(|| SettingsError::key_not_found(key))
    }

    pub(crate) fn record_mut(&mut self, key: &str) -> Result<&mut SettingRecord, SettingsError> {
        self.records.get_mut(key).ok_or_else(|| SettingsError::key_not_found(key))
    }

    pub(crate) fn set_flag(
        &mut self,
        key: &str,
        flag: SettingFlags,
        enabled: bool,
    ) -> Result<(), SettingsError> {
        self.record_mut(key)?.flags.set(flag, enabled);
        Ok(())
    }

    pub(crate) fn define(
        &mut self,
        key: &str,
        default: Value,
        options: DefineOptions,
        features: &dyn FeatureSet,
    ) -> Result<Value, SettingsError> {
        if !self.records.contains_key(key) {
            self.set(key, default.clone(), features);
        }
        let current = self.get(key)?.clone();

        let builtin_order = self.last_builtin_order;
        let record = self.record_mut(key)?;
        record.initial = default;
        let promoted = record.order >= NO_BUILTIN_ORDER_BASE;
        if promoted {
            record.order = builtin_order;
        }
        record.flags.remove(DEFINE_MASK);
        record.flags.insert(options.flags());
        if promoted {
            self.last_builtin_order += 1;
        }

        Ok(current)
    }

    /// Every non-hidden record in `(order, name)` order.
    pub(crate) fn property_list(&self) -> Vec<PropertyInfo> {
        let mut listed: Vec<(&str, &SettingRecord)> = self
            .records
            .iter()
            .filter(|(_, record)| !record.flags.contains(SettingFlags::HIDDEN))
            .map(|(key, record)| (key.as_str(), record))
            .collect();
        listed.sort_by(|a, b| a.1.order.cmp(&b.1.order).then_with(|| a.0.cmp(b.0)));

        listed
            .into_iter()
            .map(|(name, record)| PropertyInfo {
                name: name.to_owned(),
                kind: record.value.kind(),
                usage: usage_of(name, record.flags),
            })
            .collect()
    }

    pub(crate) fn autoloads_sorted(&self) -> Vec<AutoloadInfo> {
        let mut listed: Vec<(i32, &AutoloadInfo)> = self
            .autoloads
            .values()
            .map(|info| {
                let order = self
                    .records
                    .get(&format!("{AUTOLOAD_PREFIX}{}", info.name))
                    .map_or(i32::MAX, |record| record.order);
                (order, info)
            })
            .collect();
        listed.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.name.cmp(&b.1.name)));
        listed.into_iter().map(|(_, info)| info.clone()).collect()
    }

    fn add_custom_features(&mut self, value: &Value) {
        let Some(raw) = value.as_str() else {
            warn!(kind = %value.kind(), "Custom features must be a comma-separated string");
            return;
        };
        self.custom_features.extend(
            raw.split(',').map(str::trim).filter(|tag| !tag.is_empty()).map(str::to_owned),
        );
    }

    fn register_override(&mut self, key: &str, features: &dyn FeatureSet) {
        let mut parts = key.split('.');
        let Some(base) = parts.next() else { return };

        let matched = parts.map(str::trim).find(|tag| {
            !tag.is_empty() && (features.has_feature(tag) || self.custom_features.contains(*tag))
        });

        if let Some(tag) = matched {
            debug!(base, key, tag, "Feature override registered");
            self.overrides.insert(base.to_owned(), key.to_owned());
        }
    }

    const fn next_order(&mut self) -> i32 {
        let order = self.last_order;
        self.last_order += 1;
        order
    }
}

fn autoload_name(key: &str) -> Option<&str> {
    key.strip_prefix(AUTOLOAD_PREFIX)
        .map(|rest| rest.split('/').next().unwrap_or(rest))
        .filter(|name| !name.is_empty())
}

fn usage_of(name: &str, flags: SettingFlags) -> PropertyUsage {
    let storage_only = flags.contains(SettingFlags::INTERNAL)
        || STORAGE_ONLY_PREFIXES.iter().any(|prefix| name.starts_with(prefix));

    let mut usage = if storage_only {
        PropertyUsage::STORAGE
    } else {
        PropertyUsage::EDITOR | PropertyUsage::STORAGE
    };
    if flags.contains(SettingFlags::BASIC) {
        usage |= PropertyUsage::EDITOR_BASIC_SETTING;
    }
    if flags.contains(SettingFlags::RESTART_IF_CHANGED) {
        usage |= PropertyUsage::RESTART_IF_CHANGED;
    }
    usage
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::StaticFeatures;

    #[test]
    fn orders_are_monotonic_from_user_base() {
        let features = StaticFeatures::new();
        let mut state = SettingsState::default();
        state.set("a/one", Value::Int(1), &features);
        state.set("a/two", Value::Int(2), &features);
        state.set("a/one", Value::Int(3), &features);

        assert_eq!(state.record("a/one").unwrap().order, NO_BUILTIN_ORDER_BASE);
        assert_eq!(state.record("a/two").unwrap().order, NO_BUILTIN_ORDER_BASE + 1);
        assert_eq!(state.get("a/one").unwrap(), &Value::Int(3));
    }

    #[test]
    fn override_needs_a_matching_token() {
        let features = StaticFeatures::from_iter(["mobile"]);
        let mut state = SettingsState::default();
        state.set("display/size.pc", Value::Int(1), &features);
        assert!(state.overrides.is_empty());

        state.set("display/size. mobile ", Value::Int(2), &features);
        assert_eq!(state.resolve("display/size"), "display/size. mobile ");
    }

    #[test]
    fn usage_follows_namespace_and_flags() {
        assert_eq!(usage_of("input/jump", SettingFlags::empty()), PropertyUsage::STORAGE);
        assert_eq!(
            usage_of("application/config/name", SettingFlags::BASIC),
            PropertyUsage::EDITOR | PropertyUsage::STORAGE | PropertyUsage::EDITOR_BASIC_SETTING
        );
        assert_eq!(
            usage_of("display/vsync", SettingFlags::INTERNAL | SettingFlags::RESTART_IF_CHANGED),
            PropertyUsage::STORAGE | PropertyUsage::RESTART_IF_CHANGED
        );
    }

    #[test]
    fn autoload_name_takes_first_segment() {
        assert_eq!(autoload_name("autoload/Game"), Some("Game"));
        assert_eq!(autoload_name("autoload/"), None);
        assert_eq!(autoload_name("application/name"), None);
    }
}
