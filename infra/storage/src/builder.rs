use crate::vfs::{Vfs, VfsInner, VfsState};
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;

#[derive(Debug, Clone)]
struct VfsConfig {
    resource_root: Option<PathBuf>,
    user_dir: Option<PathBuf>,
    packs_enabled: bool,
}

impl Default for VfsConfig {
    fn default() -> Self {
        Self { resource_root: None, user_dir: None, packs_enabled: true }
    }
}

/// Fluent configuration for a [`Vfs`].
#[derive(Debug, Default)]
pub struct VfsBuilder {
    config: VfsConfig,
}

impl VfsBuilder {
    #[must_use = "Creates a new filesystem builder with default configuration"]
    pub fn new() -> Self {
        Self::default()
    }

    /// Initial directory for `res://`. Setup may replace it later.
    #[must_use = "Sets the directory res:// resolves to"]
    pub fn resource_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.resource_root = Some(path.into());
        self
    }

    #[must_use = "Sets the directory user:// resolves to"]
    pub fn user_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.user_dir = Some(path.into());
        self
    }

    /// Disables [`Vfs::mount`]; every mount attempt then fails.
    #[must_use = "Sets whether packs may be mounted"]
    pub const fn packs_enabled(mut self, enable: bool) -> Self {
        self.config.packs_enabled = enable;
        self
    }

    /// Consumes the configuration and creates the handle.
    ///
    /// Orphaned temporary files from interrupted saves are removed from the resource root.
    /// The cleanup is non-critical: failures are logged and never abort the build.
    #[must_use]
    pub fn build(self) -> Vfs {
        let vfs = Vfs {
            inner: Arc::new(VfsInner {
                state: RwLock::new(VfsState {
                    user_dir: self.config.user_dir,
                    ..VfsState::default()
                }),
                packs_enabled: self.config.packs_enabled,
                tmp_counter: AtomicU64::new(1),
            }),
        };

        if let Some(root) = self.config.resource_root {
            vfs.set_resource_root(root);
        }

        vfs
    }
}
