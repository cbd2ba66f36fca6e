//! # Domain Models
//!
//! Pure data types shared by the settings store, the storage layer and the tooling.
//! Dependencies are limited to `serde`, `bitflags` and `strum`.
//! Keep it lean: no I/O, no locking, no parsing, just data and simple helpers.

pub mod autoload;
pub mod constants;
pub mod flags;
pub mod value;

pub use autoload::AutoloadInfo;
pub use flags::{PropertyInfo, PropertyUsage, SettingFlags};
pub use value::{Color, Dictionary, Value, ValueKind, Vector2, Vector2i, Vector3};
