//! Loading settings files and discovering the project at startup.
//!
//! Files are read and parsed without holding the settings lock; the staged records are
//! applied under a single lock afterwards, so a failed load never leaves a partial store.

use crate::error::{SettingsError, SettingsErrorExt};
use crate::format::{binary, text};
use crate::record::DefineOptions;
use crate::state::SettingsState;
use crate::store::Settings;
use lattice_domain::Value;
use lattice_domain::constants::{
    BINARY_EXTENSION, OVERRIDE_FILE, PACK_EXTENSION, PROJECT_FILE_BINARY, PROJECT_FILE_TEXT,
    PROJECT_SETTINGS_OVERRIDE_KEY, RES_SCHEME,
};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

/// Where [`Settings::setup`] looks for the project.
#[derive(Debug, Clone, Default)]
pub struct SetupOptions {
    /// Directory the filesystem walk starts from.
    pub path: PathBuf,
    /// Pack to mount instead of probing next to the executable.
    pub main_pack: Option<PathBuf>,
    /// Keep walking up through parent directories until a project loads.
    pub upwards: bool,
    /// Skip every `override.cfg`.
    pub ignore_override: bool,
    /// Skip the file named by `application/config/project_settings_override`.
    pub ignore_settings_override: bool,
}

impl SetupOptions {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), ..Self::default() }
    }

    #[must_use = "Sets the pack to mount"]
    pub fn main_pack(mut self, pack: impl Into<PathBuf>) -> Self {
        self.main_pack = Some(pack.into());
        self
    }

    #[must_use = "Sets whether parent directories are searched"]
    pub const fn upwards(mut self, upwards: bool) -> Self {
        self.upwards = upwards;
        self
    }

    #[must_use = "Sets whether override files are skipped"]
    pub const fn ignore_override(mut self, ignore: bool) -> Self {
        self.ignore_override = ignore;
        self
    }

    #[must_use = "Sets whether the project settings override file is skipped"]
    pub const fn ignore_settings_override(mut self, ignore: bool) -> Self {
        self.ignore_settings_override = ignore;
        self
    }

    /// Loads nothing but the project file itself, as needed before saving it back.
    #[must_use = "Sets whether override files are skipped"]
    pub const fn project_only(self) -> Self {
        self.ignore_override(true).ignore_settings_override(true)
    }
}

impl Settings {
    /// Finds and loads the project settings, then any override files.
    ///
    /// Discovery stops at the first source that loads: a remote filesystem, the given main
    /// pack, a pack found next to the executable, the platform resource directory, and
    /// finally a walk from [`SetupOptions::path`]. A successful setup then loads the text
    /// file named by `application/config/project_settings_override`, if any.
    ///
    /// # Errors
    /// Returns [`SettingsError::PackUnavailable`] if the main pack cannot be mounted, or the
    /// error of the last load attempt when no project was found.
    pub fn setup(&self, options: &SetupOptions) -> Result<(), SettingsError> {
        let result = self.discover(options);
        if result.is_ok() {
            let custom = self.define(PROJECT_SETTINGS_OVERRIDE_KEY, "", DefineOptions::new())?;
            if !options.ignore_settings_override
                && let Some(path) = custom.as_str().filter(|path| !path.is_empty())
            {
                self.load_optional(path);
            }
            let resource_path = self.resource_path();
            info!(resource_path = ?resource_path, pack = self.is_using_pack(), "Settings loaded");
        }
        result
    }

    /// Loads one file, binary when it ends in `.binary` and text otherwise.
    ///
    /// # Errors
    /// Returns [`SettingsError::FileNotFound`] if the file does not exist, or the parse error
    /// of the file; nothing is applied in either case.
    pub fn load_custom(&self, path: &str) -> Result<(), SettingsError> {
        if Path::new(path).extension().is_some_and(|ext| ext == BINARY_EXTENSION) {
            self.load_binary(path)
        } else {
            self.load_text(path)
        }
    }

    fn discover(&self, options: &SetupOptions) -> Result<(), SettingsError> {
        let resource_dir = self.platform.resource_dir();
        if let Some(dir) = &resource_dir {
            self.set_resource_path(dir);
        }

        if self.platform.is_remote_filesystem() {
            debug!("Loading project from the remote filesystem");
            return self.load_project_from_res(options, &[res_override()]);
        }

        if let Some(pack) = &options.main_pack {
            self.vfs.mount(pack, true, 0).map_err(|e| SettingsError::PackUnavailable {
                message: e.to_string().into(),
                context: Some(pack.display().to_string().into()),
            })?;
            let beside: Vec<String> = pack.parent().map(beside_override).into_iter().collect();
            return self.load_project_from_res(options, &beside);
        }

        if let Some(exe) = self.platform.executable_path()
            && let Some(pack) = self.pack_candidates(&exe).into_iter().find(|p| self.try_mount(p))
        {
            debug!(pack = %pack.display(), "Project pack found");
            let mut overrides = vec![res_override()];
            overrides.extend(exe.parent().map(beside_override));
            return self.load_project_from_res(options, &overrides);
        }

        if resource_dir.is_some() {
            return self.load_project_from_res(options, &[res_override()]);
        }

        self.walk(options)
    }

    /// Loads `res://project.*`, then each of `overrides` in turn.
    fn load_project_from_res(
        &self,
        options: &SetupOptions,
        overrides: &[String],
    ) -> Result<(), SettingsError> {
        let text = format!("{RES_SCHEME}{PROJECT_FILE_TEXT}");
        let binary = format!("{RES_SCHEME}{PROJECT_FILE_BINARY}");
        self.load_text_or_binary(&text, &binary)?;

        if !options.ignore_override {
            for path in overrides {
                self.load_optional(path);
            }
        }
        Ok(())
    }

    fn walk(&self, options: &SetupOptions) -> Result<(), SettingsError> {
        let mut current = normalize(&options.path);
        loop {
            let text = current.join(PROJECT_FILE_TEXT).to_string_lossy().into_owned();
            let binary = current.join(PROJECT_FILE_BINARY).to_string_lossy().into_owned();
            let err = match self.load_text_or_binary(&text, &binary) {
                Ok(()) => {
                    self.set_resource_path(&current);
                    if !options.ignore_override {
                        self.load_optional(&beside_override(&current));
                    }
                    return Ok(());
                },
                Err(err) => err,
            };

            match current.parent() {
                Some(parent) if options.upwards && parent != current => {
                    current = parent.to_path_buf();
                },
                _ => return Err(err),
            }
        }
    }

    fn pack_candidates(&self, exe: &Path) -> Vec<PathBuf> {
        let filename = exe.file_name().map(|n| n.to_string_lossy().into_owned());
        let basename = exe.file_stem().map(|n| n.to_string_lossy().into_owned());
        let names: Vec<String> = [basename, filename]
            .into_iter()
            .flatten()
            .map(|name| format!("{name}.{PACK_EXTENSION}"))
            .collect();

        let mut dirs: Vec<PathBuf> = Vec::new();
        dirs.extend(self.platform.bundle_resource_dir());
        dirs.extend(exe.parent().map(Path::to_path_buf));
        dirs.extend(self.platform.current_dir());

        let mut candidates = vec![exe.to_path_buf()];
        for dir in &dirs {
            for name in &names {
                let candidate = dir.join(name);
                if !candidates.contains(&candidate) {
                    candidates.push(candidate);
                }
            }
        }
        candidates
    }

    fn try_mount(&self, pack: &Path) -> bool {
        match self.vfs.mount(pack, true, 0) {
            Ok(()) => true,
            Err(e) if e.is_not_found() => false,
            Err(e) => {
                debug!(pack = %pack.display(), error = %e, "Pack candidate rejected");
                false
            },
        }
    }

    /// Tries `binary` first; a missing file falls through silently, other errors are logged.
    fn load_text_or_binary(&self, text: &str, binary: &str) -> Result<(), SettingsError> {
        match self.load_binary(binary) {
            Ok(()) => return Ok(()),
            Err(e) if e.is_not_found() => {},
            Err(e) => warn!(path = binary, error = %e, "Couldn't load binary settings"),
        }

        self.load_text(text).inspect_err(|e| {
            if !e.is_not_found() {
                warn!(path = text, error = %e, "Couldn't load text settings");
            }
        })
    }

    /// Best-effort load; only unexpected failures are reported.
    fn load_optional(&self, path: &str) {
        match self.load_text(path) {
            Ok(()) => debug!(path, "Override file applied"),
            Err(e) if e.is_not_found() => {},
            Err(e) => warn!(path, error = %e, "Override file ignored"),
        }
    }

    fn load_text(&self, path: &str) -> Result<(), SettingsError> {
        let src = self.vfs.read_to_string(path).context(path.to_owned())?;
        let doc = text::parse(&src, path)?;
        let mut entries = doc.entries;
        self.migrations.run(doc.version, &mut entries);
        let modified = self.vfs.modified_time(path);

        let count = entries.len();
        self.apply(entries, |state| {
            if modified.is_some() {
                state.last_save_time = modified;
            }
        });
        debug!(path, records = count, version = doc.version, "Text settings loaded");
        Ok(())
    }

    fn load_binary(&self, path: &str) -> Result<(), SettingsError> {
        let bytes = self.vfs.read(path).context(path.to_owned())?;
        let entries = binary::decode(&bytes, path)?;

        let count = entries.len();
        self.apply(entries, |_| {});
        debug!(path, records = count, "Binary settings loaded");
        Ok(())
    }

    fn apply(
        &self,
        entries: Vec<(String, Value)>,
        finish: impl FnOnce(&mut SettingsState),
    ) {
        let mut state = self.state.lock();
        for (key, value) in entries {
            state.set(&key, value, self.features.as_ref());
        }
        finish(&mut state);
    }

    fn set_resource_path(&self, dir: &Path) {
        let trimmed = dir.to_string_lossy();
        let trimmed = trimmed.trim_end_matches(['/', '\\']);
        let path = if trimmed.is_empty() { dir.to_path_buf() } else { PathBuf::from(trimmed) };

        self.vfs.set_resource_root(path.clone());
        self.state.lock().resource_path = Some(path);
    }
}

fn res_override() -> String {
    format!("{RES_SCHEME}{OVERRIDE_FILE}")
}

fn beside_override(dir: &Path) -> String {
    dir.join(OVERRIDE_FILE).to_string_lossy().into_owned()
}

/// Absolute form of `path` with `.` and `..` collapsed.
fn normalize(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            },
            Component::CurDir => {},
            other => out.push(other),
        }
    }
    out
}
