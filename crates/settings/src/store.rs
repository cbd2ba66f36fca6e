//! The shared settings handle.
//!
//! Every public method locks the state exactly once and composes the unlocked helpers of
//! [`SettingsState`]; no method calls another public method while the lock is held.

use crate::builder::SettingsBuilder;
use crate::error::SettingsError;
use crate::features::FeatureSet;
use crate::migrate::MigrationRegistry;
use crate::platform::Platform;
use crate::record::DefineOptions;
use crate::state::SettingsState;
use lattice_domain::constants::{AUTOLOAD_PREFIX, NO_BUILTIN_ORDER_BASE, RES_SCHEME, USER_SCHEME};
use lattice_domain::{AutoloadInfo, PropertyInfo, SettingFlags, Value};
use lattice_storage::Vfs;
use parking_lot::Mutex;
use std::ops::Deref;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

/// The internal shared state of a [`Settings`] instance.
#[derive(Debug)]
pub struct SettingsInner {
    pub(crate) state: Mutex<SettingsState>,
    pub(crate) vfs: Vfs,
    pub(crate) features: Arc<dyn FeatureSet>,
    pub(crate) platform: Arc<dyn Platform>,
    pub(crate) migrations: MigrationRegistry,
}

/// A thread-safe handle to the settings store.
///
/// The handle is internally reference-counted (`Arc`) and can be cheaply cloned. Build one
/// at startup, run [`Settings::setup`] once, then pass clones to whoever needs them.
///
/// # Example
///
/// ```rust
/// use lattice_domain::Value;
/// use lattice_settings::{Settings, StaticFeatures};
///
/// let settings = Settings::builder().features(StaticFeatures::from_iter(["vulkan"])).build();
///
/// settings.set("rendering/driver", "opengl3");
/// settings.set("rendering/driver.vulkan", "vulkan");
/// assert_eq!(settings.get("rendering/driver").unwrap(), Value::from("vulkan"));
///
/// settings.set("autoload/Game", "*res://game.gd");
/// assert!(settings.autoload("Game").unwrap().is_singleton);
/// ```
#[derive(Debug, Clone)]
pub struct Settings {
    pub(crate) inner: Arc<SettingsInner>,
}

impl Deref for Settings {
    type Target = SettingsInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Default for Settings {
    fn default() -> Self {
        SettingsBuilder::new().build()
    }
}

impl Settings {
    #[must_use = "The store is not created until you call .build()"]
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::new()
    }

    /// `true` if a record exists under exactly `key`; overrides are not consulted.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.state.lock().records.contains_key(key)
    }

    /// Stores `value` under `key`; [`Value::Nil`] removes the record.
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        self.state.lock().set(key, value.into(), self.features.as_ref());
    }

    /// Reads `key`, resolving an active feature override first.
    ///
    /// # Errors
    /// Returns [`SettingsError::KeyNotFound`] if the resolved key has no record.
    pub fn get(&self, key: &str) -> Result<Value, SettingsError> {
        self.state.lock().get(key).cloned()
    }

    /// Removes a record and any autoload derived from it.
    ///
    /// # Errors
    /// Returns [`SettingsError::KeyNotFound`] if `key` has no record.
    pub fn clear(&self, key: &str) -> Result<(), SettingsError> {
        self.state.lock().remove(key).map(drop).ok_or_else(|| SettingsError::key_not_found(key))
    }

    /// # Errors
    /// Returns [`SettingsError::KeyNotFound`] if `key` has no record.
    pub fn set_order(&self, key: &str, order: i32) -> Result<(), SettingsError> {
        self.state.lock().record_mut(key)?.order = order;
        Ok(())
    }

    /// # Errors
    /// Returns [`SettingsError::KeyNotFound`] if `key` has no record.
    pub fn get_order(&self, key: &str) -> Result<i32, SettingsError> {
        Ok(self.state.lock().record(key)?.order)
    }

    /// # Errors
    /// Returns [`SettingsError::KeyNotFound`] if `key` has no record.
    pub fn set_initial_value(
        &self,
        key: &str,
        value: impl Into<Value>,
    ) -> Result<(), SettingsError> {
        self.state.lock().record_mut(key)?.initial = value.into();
        Ok(())
    }

    /// # Errors
    /// Returns [`SettingsError::KeyNotFound`] if `key` has no record.
    pub fn initial_value(&self, key: &str) -> Result<Value, SettingsError> {
        Ok(self.state.lock().record(key)?.initial.clone())
    }

    /// `true` when the stored value differs from the recorded default.
    ///
    /// # Errors
    /// Returns [`SettingsError::KeyNotFound`] if `key` has no record.
    pub fn can_revert(&self, key: &str) -> Result<bool, SettingsError> {
        Ok(self.state.lock().record(key)?.is_changed())
    }

    /// # Errors
    /// Returns [`SettingsError::KeyNotFound`] if `key` has no record.
    pub fn set_restart_if_changed(&self, key: &str, enabled: bool) -> Result<(), SettingsError> {
        self.state.lock().set_flag(key, SettingFlags::RESTART_IF_CHANGED, enabled)
    }

    /// # Errors
    /// Returns [`SettingsError::KeyNotFound`] if `key` has no record.
    pub fn set_as_basic(&self, key: &str, enabled: bool) -> Result<(), SettingsError> {
        self.state.lock().set_flag(key, SettingFlags::BASIC, enabled)
    }

    /// # Errors
    /// Returns [`SettingsError::KeyNotFound`] if `key` has no record.
    pub fn set_as_internal(&self, key: &str, enabled: bool) -> Result<(), SettingsError> {
        self.state.lock().set_flag(key, SettingFlags::INTERNAL, enabled)
    }

    /// Hidden records are left out of [`Settings::property_list`] and merged saves.
    ///
    /// # Errors
    /// Returns [`SettingsError::KeyNotFound`] if `key` has no record.
    pub fn set_hidden(&self, key: &str, enabled: bool) -> Result<(), SettingsError> {
        self.state.lock().set_flag(key, SettingFlags::HIDDEN, enabled)
    }

    /// # Errors
    /// Returns [`SettingsError::KeyNotFound`] if `key` has no record.
    pub fn set_ignore_value_in_docs(&self, key: &str, enabled: bool) -> Result<(), SettingsError> {
        self.state.lock().set_flag(key, SettingFlags::IGNORE_IN_DOCS, enabled)
    }

    /// A locked record ignores every later [`Settings::set`] until unlocked.
    ///
    /// # Errors
    /// Returns [`SettingsError::KeyNotFound`] if `key` has no record.
    pub fn set_locked(&self, key: &str, locked: bool) -> Result<(), SettingsError> {
        self.state.lock().set_flag(key, SettingFlags::OVERRIDDEN, locked)
    }

    /// # Errors
    /// Returns [`SettingsError::KeyNotFound`] if `key` has no record.
    pub fn flags(&self, key: &str) -> Result<SettingFlags, SettingsError> {
        Ok(self.state.lock().record(key)?.flags)
    }

    /// Declares a built-in setting and returns its current value.
    ///
    /// The default is stored only when the key is absent, but always becomes the initial
    /// value. A record still carrying a user order is moved into the built-in range.
    ///
    /// # Errors
    /// Returns [`SettingsError::KeyNotFound`] if `default` is [`Value::Nil`] and the key is
    /// absent.
    pub fn define(
        &self,
        key: &str,
        default: impl Into<Value>,
        options: DefineOptions,
    ) -> Result<Value, SettingsError> {
        self.state.lock().define(key, default.into(), options, self.features.as_ref())
    }

    /// `true` if `key` has a built-in order; missing keys report `true`.
    #[must_use]
    pub fn is_builtin_setting(&self, key: &str) -> bool {
        self.state.lock().records.get(key).is_none_or(|r| r.order < NO_BUILTIN_ORDER_BASE)
    }

    /// Every non-hidden record, sorted by order then name.
    #[must_use]
    pub fn property_list(&self) -> Vec<PropertyInfo> {
        self.state.lock().property_list()
    }

    #[must_use]
    pub fn autoload(&self, name: &str) -> Option<AutoloadInfo> {
        self.state.lock().autoloads.get(name).cloned()
    }

    /// Every autoload, in the order of the records they were derived from.
    #[must_use]
    pub fn autoloads(&self) -> Vec<AutoloadInfo> {
        self.state.lock().autoloads_sorted()
    }

    #[must_use]
    pub fn has_autoload(&self, name: &str) -> bool {
        self.state.lock().autoloads.contains_key(name)
    }

    /// Registers `info` by storing it under `autoload/<name>`.
    ///
    /// # Errors
    /// Returns [`SettingsError::InvalidParameter`] if the name is empty or contains `/`.
    pub fn add_autoload(&self, info: &AutoloadInfo) -> Result<(), SettingsError> {
        if info.name.is_empty() || info.name.contains('/') {
            return Err(SettingsError::InvalidParameter {
                message: format!("invalid autoload name '{}'", info.name).into(),
                context: None,
            });
        }
        let key = format!("{AUTOLOAD_PREFIX}{}", info.name);
        self.state.lock().set(&key, Value::from(info.to_setting()), self.features.as_ref());
        Ok(())
    }

    /// Unregisters an autoload together with its backing record.
    ///
    /// # Errors
    /// Returns [`SettingsError::KeyNotFound`] if no autoload has that name.
    pub fn remove_autoload(&self, name: &str) -> Result<(), SettingsError> {
        let mut state = self.state.lock();
        if !state.autoloads.contains_key(name) {
            return Err(SettingsError::key_not_found(name));
        }
        state.remove(&format!("{AUTOLOAD_PREFIX}{name}"));
        state.autoloads.remove(name);
        Ok(())
    }

    /// Custom feature tags, sorted.
    #[must_use]
    pub fn custom_features(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.state.lock().custom_features.iter().cloned().collect();
        tags.sort_unstable();
        tags
    }

    #[must_use]
    pub fn has_custom_feature(&self, tag: &str) -> bool {
        self.state.lock().custom_features.contains(tag)
    }

    /// With overrides disabled, dotted keys are plain records and reads are never redirected.
    pub fn set_disable_feature_overrides(&self, disabled: bool) {
        self.state.lock().disable_feature_overrides = disabled;
    }

    /// The full key a read of `base` is currently served from, if overridden.
    #[must_use]
    pub fn active_override(&self, base: &str) -> Option<String> {
        let state = self.state.lock();
        let resolved = state.resolve(base);
        (resolved != base).then(|| resolved.to_owned())
    }

    /// The directory the loaded project lives in.
    #[must_use]
    pub fn resource_path(&self) -> Option<PathBuf> {
        self.state.lock().resource_path.clone()
    }

    /// Maps `res://` and `user://` paths to the disk; other paths are returned unchanged.
    #[must_use]
    pub fn globalize_path(&self, path: &str) -> String {
        let root = if let Some(rest) = path.strip_prefix(RES_SCHEME) {
            self.resource_path().map(|root| root.join(rest))
        } else if let Some(rest) = path.strip_prefix(USER_SCHEME) {
            self.vfs.user_dir().map(|dir| dir.join(rest))
        } else {
            None
        };
        root.map_or_else(|| path.to_owned(), |p| p.to_string_lossy().into_owned())
    }

    /// Rewrites a disk path below the resource path as a `res://` path, lexically.
    #[must_use]
    pub fn localize_path(&self, path: &str) -> String {
        let path = simplify(&path.replace('\\', "/"));
        if path.contains("://") {
            return path;
        }
        let Some(root) = self.resource_path() else { return path };

        let candidate = Path::new(&path);
        if candidate.is_absolute() {
            return candidate.strip_prefix(&root).map_or(path.clone(), |rest| {
                format!("{RES_SCHEME}{}", rest.to_string_lossy().replace('\\', "/"))
            });
        }
        format!("{RES_SCHEME}{path}")
    }

    /// Modification time of the settings file last loaded or saved.
    #[must_use]
    pub fn last_save_time(&self) -> Option<SystemTime> {
        self.state.lock().last_save_time
    }

    /// `true` once setup mounted a pack.
    #[must_use]
    pub fn is_using_pack(&self) -> bool {
        self.vfs.is_using_pack()
    }

    #[must_use]
    pub fn vfs(&self) -> &Vfs {
        &self.vfs
    }
}

/// Collapses `.` and `name/..` segments without touching the disk.
fn simplify(path: &str) -> String {
    if path.contains("://") {
        return path.to_owned();
    }
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for component in Path::new(path).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str().unwrap_or_default()),
            Component::ParentDir => {
                if parts.last().is_some_and(|last| *last != "..") {
                    parts.pop();
                } else if !absolute {
                    parts.push("..");
                }
            },
            Component::Prefix(prefix) => {
                parts.push(prefix.as_os_str().to_str().unwrap_or_default());
            },
            Component::CurDir | Component::RootDir => {},
        }
    }
    let joined = parts.join("/");
    if absolute { format!("/{joined}") } else { joined }
}
