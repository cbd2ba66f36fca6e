#![allow(dead_code, unreachable_pub)]

use lattice_settings::{Platform, Settings, StaticFeatures};
use std::path::{Path, PathBuf};

/// A host whose every answer is chosen by the test.
#[derive(Debug, Clone, Default)]
pub struct TestPlatform {
    pub exe: Option<PathBuf>,
    pub resource_dir: Option<PathBuf>,
    pub bundle_dir: Option<PathBuf>,
    pub cwd: Option<PathBuf>,
    pub remote: bool,
    pub user_dir: Option<PathBuf>,
}

impl Platform for TestPlatform {
    fn executable_path(&self) -> Option<PathBuf> {
        self.exe.clone()
    }

    fn resource_dir(&self) -> Option<PathBuf> {
        self.resource_dir.clone()
    }

    fn bundle_resource_dir(&self) -> Option<PathBuf> {
        self.bundle_dir.clone()
    }

    fn is_remote_filesystem(&self) -> bool {
        self.remote
    }

    fn user_data_dir(&self) -> Option<PathBuf> {
        self.user_dir.clone()
    }

    fn current_dir(&self) -> Option<PathBuf> {
        self.cwd.clone()
    }
}

/// A store with no active feature tags and a host that finds nothing on its own.
pub fn isolated() -> Settings {
    Settings::builder().features(StaticFeatures::new()).platform(TestPlatform::default()).build()
}

pub fn with_platform(platform: TestPlatform) -> Settings {
    Settings::builder().features(StaticFeatures::new()).platform(platform).build()
}

pub fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
