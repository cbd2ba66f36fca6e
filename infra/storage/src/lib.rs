//! A small virtual filesystem for settings and resource files.
//!
//! # Core Features
//!
//! - **Virtual roots**: `res://` resolves through mounted packs, then the resource root on
//!   disk; `user://` resolves below the user data directory; other paths are used as given.
//! - **Packs**: read-only archives mountable with a replace flag and a byte offset, including
//!   packs appended to an executable.
//! - **Atomic Writes**: unique temp write + `fsync` + `rename`, so a crash never leaves a
//!   half-written settings file behind.
//! - **Sandboxing**: `..` segments may not climb above a virtual root.
//! - **Self-Healing**: stale temporary files are removed when a resource root is chosen.
//!
//! # Examples
//!
//! ```rust
//! use lattice_storage::{StorageError, Vfs};
//!
//! fn main() -> Result<(), StorageError> {
//!     # let tmp = tempfile::tempdir().unwrap();
//!     let vfs = Vfs::builder().resource_root(tmp.path()).build();
//!
//!     vfs.write("res://project.cfg", b"config_version=5\n")?;
//!     assert_eq!(vfs.read_to_string("res://project.cfg")?, "config_version=5\n");
//!
//!     let missing = vfs.read("res://override.cfg").unwrap_err();
//!     assert!(missing.is_not_found());
//!     Ok(())
//! }
//! ```

mod builder;
mod error;
mod maintenance;
mod pack;
mod security;
mod vfs;

pub use builder::VfsBuilder;
pub use error::{StorageError, StorageErrorExt};
pub use pack::{Compression, PACK_FORMAT_VERSION, PACK_MAGIC, PackBuilder};
pub use vfs::{RES_SCHEME, USER_SCHEME, Vfs};
