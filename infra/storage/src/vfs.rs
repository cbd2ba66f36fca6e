//! Virtual filesystem handle resolving `res://`, `user://` and plain paths.
//!
//! `res://` lookups consult mounted packs first and fall back to the resource root on disk.
//! Writes never touch packs: they go to disk through the atomic swap pattern.

use crate::builder::VfsBuilder;
use crate::error::{StorageError, StorageErrorExt};
use crate::maintenance;
use crate::pack::{self, PackEntry};
use crate::security;
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::fs;
use std::io::Write;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;
use tracing::{debug, info};

pub const RES_SCHEME: &str = "res://";
pub const USER_SCHEME: &str = "user://";

#[derive(Debug, Default)]
pub(crate) struct VfsState {
    pub(crate) resource_root: Option<PathBuf>,
    pub(crate) user_dir: Option<PathBuf>,
    pub(crate) packs: FxHashMap<String, PackEntry>,
    pub(crate) mounted: Vec<PathBuf>,
}

/// The internal shared state of a [`Vfs`] instance.
#[derive(Debug)]
pub struct VfsInner {
    pub(crate) state: RwLock<VfsState>,
    /// Whether [`Vfs::mount`] is allowed at all.
    pub(crate) packs_enabled: bool,
    /// A unique counter used to generate temporary file names.
    pub(crate) tmp_counter: AtomicU64,
}

#[derive(Debug)]
enum Location {
    Pack(PackEntry),
    Disk(PathBuf),
}

/// A thread-safe handle to the virtual filesystem.
///
/// The handle is internally reference-counted (`Arc`) and can be cheaply cloned.
///
/// # Example
///
/// ```rust
/// use lattice_storage::{PackBuilder, Vfs};
///
/// # let tmp = tempfile::tempdir().unwrap();
/// let pack = tmp.path().join("game.pck");
/// PackBuilder::new().file("project.binary", b"ECFG".to_vec()).write(&pack).unwrap();
///
/// let vfs = Vfs::builder().resource_root(tmp.path()).build();
/// vfs.mount(&pack, true, 0).unwrap();
///
/// assert!(vfs.is_using_pack());
/// assert_eq!(vfs.read("res://project.binary").unwrap(), b"ECFG");
/// ```
#[derive(Debug, Clone)]
pub struct Vfs {
    pub(crate) inner: Arc<VfsInner>,
}

impl Deref for Vfs {
    type Target = VfsInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Default for Vfs {
    fn default() -> Self {
        VfsBuilder::new().build()
    }
}

impl Vfs {
    #[must_use = "The filesystem is not created until you call .build()"]
    pub fn builder() -> VfsBuilder {
        VfsBuilder::new()
    }

    /// The directory `res://` maps to on disk, if one has been chosen.
    #[must_use]
    pub fn resource_root(&self) -> Option<PathBuf> {
        self.state.read().resource_root.clone()
    }

    /// Points `res://` at `root` and cleans up temporary files left behind by crashed saves.
    pub fn set_resource_root(&self, root: impl Into<PathBuf>) {
        let root = root.into();
        maintenance::purge_tmp(&root);
        debug!(path = %root.display(), "Resource root changed");
        self.state.write().resource_root = Some(root);
    }

    #[must_use]
    pub fn user_dir(&self) -> Option<PathBuf> {
        self.state.read().user_dir.clone()
    }

    pub fn set_user_dir(&self, dir: impl Into<PathBuf>) {
        self.state.write().user_dir = Some(dir.into());
    }

    /// `true` once at least one pack has been mounted.
    #[must_use]
    pub fn is_using_pack(&self) -> bool {
        !self.state.read().mounted.is_empty()
    }

    /// Mounts the pack stored in `path` starting at byte `offset`.
    ///
    /// With `replace_files`, entries of this pack shadow entries of packs mounted earlier;
    /// otherwise earlier entries win. With `offset == 0` the pack may also be appended to
    /// the end of a larger file (an executable), located through its footer.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::PacksDisabled`] if the handle was built without pack support.
    /// Returns [`StorageError::FileNotFound`] if `path` does not exist.
    /// Returns [`StorageError::InvalidPack`] if no well-formed pack is found.
    pub fn mount(
        &self,
        path: impl AsRef<Path>,
        replace_files: bool,
        offset: u64,
    ) -> Result<(), StorageError> {
        let path = path.as_ref();
        if !self.packs_enabled {
            return Err(StorageError::PacksDisabled {
                message: path.display().to_string().into(),
                context: None,
            });
        }

        let entries = pack::read_index(path, offset)?;
        let count = entries.len();

        let mut state = self.state.write();
        for (key, entry) in entries {
            if replace_files || !state.packs.contains_key(&key) {
                state.packs.insert(key, entry);
            }
        }
        state.mounted.push(path.to_path_buf());

        info!(path = %path.display(), entries = count, "Mounted pack");
        Ok(())
    }

    /// Reads a whole file.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::FileNotFound`] if the path resolves to nothing.
    /// Returns [`StorageError::PathTraversalAttempt`] if a `res://` path escapes the root.
    /// Returns [`StorageError::Decompress`] if a compressed pack entry is corrupted.
    pub fn read(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        match self.locate(path)? {
            Location::Pack(entry) => entry.read().context(format!("Pack read failed: {path}")),
            Location::Disk(resolved) => match fs::read(&resolved) {
                Ok(data) => Ok(data),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                    Err(StorageError::not_found(resolved.display()))
                },
                Err(err) => Err(StorageError::Io {
                    source: err,
                    context: Some(format!("Read failed: {}", resolved.display()).into()),
                }),
            },
        }
    }

    /// Reads a whole file as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Same as [`Vfs::read`], plus [`StorageError::Io`] for invalid UTF-8.
    pub fn read_to_string(&self, path: &str) -> Result<String, StorageError> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).map_err(|e| StorageError::Io {
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            context: Some(format!("File is not valid UTF-8: {path}").into()),
        })
    }

    /// Writes data to a file atomically.
    ///
    /// 1. Data is written to a unique temporary file (`.lattmp.<id>`).
    /// 2. The file is synced to hardware (`fsync`).
    /// 3. The temporary file is renamed to the final destination.
    ///
    /// On platforms that do not support atomic replace for existing targets, the
    /// implementation falls back to remove-then-rename.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::PathTraversalAttempt`] if a `res://` path escapes the root.
    /// Returns [`StorageError::Io`] if the destination cannot be created or replaced.
    pub fn write(&self, path: &str, data: &[u8]) -> Result<(), StorageError> {
        let resolved = self.disk_path(path)?;

        if let Some(parent) = resolved.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .context(format!("Failed to create parent of {}", resolved.display()))?;
        }

        let temp = unique_tmp_path(&resolved, &self.tmp_counter);

        {
            let mut file = fs::OpenOptions::new()
                .create_new(true)
                .write(true)
                .open(&temp)
                .context(format!("Temp creation failed: {}", temp.display()))?;
            file.write_all(data).context("Write failed")?;
            file.sync_all().context("Hardware sync failed")?;
        }

        if let Err(err) = fs::rename(&temp, &resolved) {
            if err.kind() == std::io::ErrorKind::AlreadyExists {
                fs::remove_file(&resolved)
                    .context(format!("Failed to replace existing file: {}", resolved.display()))?;
                fs::rename(&temp, &resolved).context(format!(
                    "Atomic swap failed: {} -> {}",
                    temp.display(),
                    resolved.display()
                ))?;
            } else {
                let _ = fs::remove_file(&temp);
                return Err(StorageError::Io {
                    source: err,
                    context: Some(
                        format!("Atomic swap failed: {} -> {}", temp.display(), resolved.display())
                            .into(),
                    ),
                });
            }
        }

        if let Some(parent) = resolved.parent() {
            sync_dir(parent);
        }

        debug!(path = %resolved.display(), "File saved atomically");
        Ok(())
    }

    /// Checks whether a file exists in a mounted pack or on disk.
    #[must_use]
    pub fn exists(&self, path: &str) -> bool {
        match self.locate(path) {
            Ok(Location::Pack(_)) => true,
            Ok(Location::Disk(resolved)) => resolved.is_file(),
            Err(_) => false,
        }
    }

    /// Last modification time; pack entries report the pack file's time.
    #[must_use]
    pub fn modified_time(&self, path: &str) -> Option<SystemTime> {
        let target = match self.locate(path).ok()? {
            Location::Pack(entry) => entry.source().to_path_buf(),
            Location::Disk(resolved) => resolved,
        };
        fs::metadata(target).and_then(|m| m.modified()).ok()
    }

    /// Resolves a virtual path to the disk location writes would target.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::PathTraversalAttempt`] if a `res://` or `user://` path
    /// escapes its root.
    pub fn disk_path(&self, path: &str) -> Result<PathBuf, StorageError> {
        let state = self.state.read();
        if let Some(rest) = path.strip_prefix(RES_SCHEME) {
            return scoped(state.resource_root.as_deref(), rest);
        }
        if let Some(rest) = path.strip_prefix(USER_SCHEME) {
            return scoped(state.user_dir.as_deref(), rest);
        }
        Ok(PathBuf::from(path))
    }

    fn locate(&self, path: &str) -> Result<Location, StorageError> {
        if let Some(rest) = path.strip_prefix(RES_SCHEME) {
            let state = self.state.read();
            if !state.packs.is_empty() {
                let key = security::pack_key(rest)?;
                if let Some(entry) = state.packs.get(&key) {
                    return Ok(Location::Pack(entry.clone()));
                }
            }
        }
        self.disk_path(path).map(Location::Disk)
    }
}

fn scoped(root: Option<&Path>, rest: &str) -> Result<PathBuf, StorageError> {
    match root {
        Some(root) => security::resolve_under(root, rest),
        None => security::normalize_relative(Path::new(rest.trim_start_matches('/'))),
    }
}

fn sync_dir(path: &Path) {
    // Directories cannot be opened as files on Windows.
    if !cfg!(unix) {
        return;
    }
    match fs::File::open(path) {
        Ok(dir) => {
            if let Err(err) = dir.sync_all() {
                tracing::warn!(path = %path.display(), error = %err, "Directory sync failed");
            }
        },
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "Directory open failed");
        },
    }
}

fn unique_tmp_path(target: &Path, counter: &AtomicU64) -> PathBuf {
    let counter = counter.fetch_add(1, Ordering::Relaxed);
    let file_name = target.file_name().and_then(|s| s.to_str()).unwrap_or("settings");
    let tmp_name = format!("{file_name}{}{counter}", maintenance::TMP_MARKER);
    target.with_file_name(tmp_name)
}
