use crate::defaults;
use crate::features::{FeatureSet, StaticFeatures};
use crate::migrate::{Migration, MigrationRegistry};
use crate::platform::{Platform, SystemPlatform};
use crate::state::SettingsState;
use crate::store::{Settings, SettingsInner};
use lattice_storage::Vfs;
use parking_lot::Mutex;
use std::sync::Arc;

/// Fluent configuration for a [`Settings`] store.
///
/// Unless configured otherwise the store reports the host's feature tags, talks to the
/// current process through [`SystemPlatform`], and runs the default migrations.
#[derive(Debug, Default)]
pub struct SettingsBuilder {
    features: Option<Arc<dyn FeatureSet>>,
    platform: Option<Arc<dyn Platform>>,
    vfs: Option<Vfs>,
    migrations: Option<MigrationRegistry>,
    disable_feature_overrides: bool,
    core_defaults: bool,
}

impl SettingsBuilder {
    #[must_use = "Creates a new settings builder with default configuration"]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "Sets the feature tags consulted for dotted keys"]
    pub fn features(mut self, features: impl FeatureSet + 'static) -> Self {
        self.features = Some(Arc::new(features));
        self
    }

    #[must_use = "Sets the host services used by setup"]
    pub fn platform(mut self, platform: impl Platform + 'static) -> Self {
        self.platform = Some(Arc::new(platform));
        self
    }

    /// Shares an existing filesystem handle instead of creating a fresh one.
    #[must_use = "Sets the virtual filesystem"]
    pub fn vfs(mut self, vfs: Vfs) -> Self {
        self.vfs = Some(vfs);
        self
    }

    /// Replaces the whole migration table.
    #[must_use = "Sets the migration table"]
    pub fn migrations(mut self, migrations: MigrationRegistry) -> Self {
        self.migrations = Some(migrations);
        self
    }

    /// Appends one migration to the table.
    #[must_use = "Appends a migration"]
    pub fn migration(mut self, migration: Migration) -> Self {
        self.migrations = Some(self.migrations.unwrap_or_default().with(migration));
        self
    }

    #[must_use = "Sets whether dotted keys register overrides"]
    pub const fn disable_feature_overrides(mut self, disabled: bool) -> Self {
        self.disable_feature_overrides = disabled;
        self
    }

    /// Defines the engine's built-in settings (`application/config/name`, window size...).
    #[must_use = "Sets whether built-in settings are defined"]
    pub const fn core_defaults(mut self, enable: bool) -> Self {
        self.core_defaults = enable;
        self
    }

    #[must_use]
    pub fn build(self) -> Settings {
        let features = self.features.unwrap_or_else(|| Arc::new(StaticFeatures::host()));
        let platform = self.platform.unwrap_or_else(|| Arc::new(SystemPlatform::new()));
        let vfs = self.vfs.unwrap_or_default();

        if vfs.user_dir().is_none()
            && let Some(dir) = platform.user_data_dir()
        {
            vfs.set_user_dir(dir);
        }

        let mut state = SettingsState {
            disable_feature_overrides: self.disable_feature_overrides,
            ..SettingsState::default()
        };
        if self.core_defaults {
            defaults::register(&mut state, features.as_ref());
        }

        Settings {
            inner: Arc::new(SettingsInner {
                state: Mutex::new(state),
                vfs,
                features,
                platform,
                migrations: self.migrations.unwrap_or_default(),
            }),
        }
    }
}
