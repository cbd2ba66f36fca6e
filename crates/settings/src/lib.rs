//! # Lattice Settings
//!
//! An engine-wide project settings store: an ordered map from slash-separated keys to typed
//! [`Value`](lattice_domain::Value)s, with feature-conditioned overrides, autoload
//! bookkeeping, and two interchangeable file formats.
//!
//! ## Core Features
//!
//! - **Overrides**: setting `rendering/driver.vulkan` while the `vulkan` tag is active makes
//!   reads of `rendering/driver` return that value.
//! - **Autoloads**: keys under `autoload/` register startup resources automatically.
//! - **Persistence**: human-editable `.cfg` text and compact `.binary` files, written
//!   atomically and sorted deterministically.
//! - **Discovery**: [`Settings::setup`] finds the project in packs, OS resource directories,
//!   or by walking up the filesystem, then layers `override.cfg` on top.
//! - **Migrations**: files saved by older layout versions are rewritten on load.
//!
//! ## Example
//!
//! ```rust
//! use lattice_settings::{CustomMap, Settings, SettingsError};
//!
//! fn main() -> Result<(), SettingsError> {
//!     # let tmp = tempfile::tempdir().unwrap();
//!     # let path = tmp.path().join("project.cfg");
//!     # let path = path.to_str().unwrap();
//!     let settings = Settings::builder().build();
//!     settings.set("application/config/name", "Demo");
//!     settings.save_custom(path, &CustomMap::default(), &["demo"], true)?;
//!
//!     let reloaded = Settings::builder().build();
//!     reloaded.load_custom(path)?;
//!     assert_eq!(reloaded.get("application/config/name")?.as_str(), Some("Demo"));
//!     assert!(reloaded.has_custom_feature("demo"));
//!     Ok(())
//! }
//! ```

mod builder;
mod defaults;
mod error;
mod features;
pub mod format;
mod loader;
mod migrate;
mod platform;
mod record;
mod saver;
mod state;
mod store;

pub use builder::SettingsBuilder;
pub use error::{SettingsError, SettingsErrorExt};
pub use features::{FeatureFn, FeatureSet, StaticFeatures};
pub use loader::SetupOptions;
pub use migrate::{INPUT_ACTIONS_TO_DICTIONARIES, Migration, MigrationFn, MigrationRegistry};
pub use platform::{Platform, SystemPlatform};
pub use record::DefineOptions;
pub use saver::CustomMap;
pub use store::{Settings, SettingsInner};
