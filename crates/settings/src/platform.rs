//! Host services consumed during setup and path translation.

use std::fmt;
use std::path::PathBuf;

/// The slice of the operating system the settings store depends on.
pub trait Platform: Send + Sync + fmt::Debug {
    /// Path of the running executable, used to find bundled and sibling packs.
    fn executable_path(&self) -> Option<PathBuf>;

    /// A fixed resource directory imposed by the OS (mobile platforms), if any.
    fn resource_dir(&self) -> Option<PathBuf> {
        None
    }

    /// Resource directory of an application bundle (macOS `.app/Contents/Resources`).
    fn bundle_resource_dir(&self) -> Option<PathBuf> {
        None
    }

    /// `true` when files are served by a remote filesystem and `res://` must be used as-is.
    fn is_remote_filesystem(&self) -> bool {
        false
    }

    /// The directory `user://` maps to.
    fn user_data_dir(&self) -> Option<PathBuf> {
        None
    }

    fn current_dir(&self) -> Option<PathBuf> {
        std::env::current_dir().ok()
    }
}

/// [`Platform`] backed by the current process.
#[derive(Debug, Clone, Default)]
pub struct SystemPlatform {
    user_data_dir: Option<PathBuf>,
}

impl SystemPlatform {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "Sets the directory user:// resolves to"]
    pub fn with_user_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.user_data_dir = Some(dir.into());
        self
    }
}

impl Platform for SystemPlatform {
    fn executable_path(&self) -> Option<PathBuf> {
        std::env::current_exe().ok()
    }

    fn bundle_resource_dir(&self) -> Option<PathBuf> {
        if !cfg!(target_os = "macos") {
            return None;
        }
        let exe = self.executable_path()?;
        let contents = exe.parent()?.parent()?;
        Some(contents.join("Resources"))
    }

    fn user_data_dir(&self) -> Option<PathBuf> {
        self.user_data_dir.clone()
    }
}
