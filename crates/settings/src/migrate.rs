//! One-time rewrites of records saved by older layout versions.
//!
//! A [`Migration`] applies to every file whose `config_version` is at most its
//! `applies_through` version. Migrations run in registration order over the staged
//! records of a text file, before any of them reaches the store.

use lattice_domain::constants::INPUT_PREFIX;
use lattice_domain::{Dictionary, Value};
use tracing::debug;

/// Rewrites one record in place; returns `true` when the value was changed.
pub type MigrationFn = fn(key: &str, value: &mut Value) -> bool;

#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub name: &'static str,
    /// Newest file version this migration still applies to.
    pub applies_through: i64,
    pub apply: MigrationFn,
}

/// Ordered migration table consulted after every text load.
///
/// ```rust
/// use lattice_domain::Value;
/// use lattice_settings::{Migration, MigrationRegistry};
///
/// fn rename_driver(key: &str, value: &mut Value) -> bool {
///     if key == "rendering/driver" && value.as_str() == Some("gles2") {
///         *value = Value::from("compatibility");
///         return true;
///     }
///     false
/// }
///
/// let registry = MigrationRegistry::default().with(Migration {
///     name: "gles2_to_compatibility",
///     applies_through: 4,
///     apply: rename_driver,
/// });
/// assert_eq!(registry.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct MigrationRegistry {
    migrations: Vec<Migration>,
}

impl Default for MigrationRegistry {
    fn default() -> Self {
        Self::empty().with(INPUT_ACTIONS_TO_DICTIONARIES)
    }
}

impl MigrationRegistry {
    #[must_use]
    pub const fn empty() -> Self {
        Self { migrations: Vec::new() }
    }

    #[must_use = "Returns the registry with the migration appended"]
    pub fn with(mut self, migration: Migration) -> Self {
        self.register(migration);
        self
    }

    pub fn register(&mut self, migration: Migration) {
        self.migrations.push(migration);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Migration> {
        self.migrations.iter()
    }

    /// Applies every migration relevant to `version`; returns how many records changed.
    pub fn run(&self, version: i64, entries: &mut [(String, Value)]) -> usize {
        let mut changed = 0;
        for migration in self.migrations.iter().filter(|m| version <= m.applies_through) {
            let before = changed;
            for (key, value) in entries.iter_mut() {
                if (migration.apply)(key, value) {
                    changed += 1;
                }
            }
            let records = changed - before;
            debug!(migration = migration.name, version, records, "Migration applied");
        }
        changed
    }
}

/// Input actions used to be plain event lists; they now carry a deadzone.
pub const INPUT_ACTIONS_TO_DICTIONARIES: Migration = Migration {
    name: "input_actions_to_dictionaries",
    applies_through: 3,
    apply: input_actions_to_dictionaries,
};

fn input_actions_to_dictionaries(key: &str, value: &mut Value) -> bool {
    if !key.starts_with(INPUT_PREFIX) {
        return false;
    }
    let Value::Array(events) = value else { return false };

    let mut action = Dictionary::new();
    action.insert("deadzone", 0.5);
    action.insert("events", Value::Array(std::mem::take(events)));
    *value = Value::Dictionary(action);
    true
}
