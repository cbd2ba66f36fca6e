use crate::value::ValueKind;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Per-record metadata flags.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct SettingFlags: u8 {
        /// Changing the value only takes effect after a restart.
        const RESTART_IF_CHANGED = 1 << 0;
        /// Shown in the basic (non-advanced) settings view.
        const BASIC = 1 << 1;
        /// Stored but never listed for editing.
        const INTERNAL = 1 << 2;
        /// Excluded from property listings and from merged saves.
        const HIDDEN = 1 << 3;
        /// The default value is machine-specific and must not be documented.
        const IGNORE_IN_DOCS = 1 << 4;
        /// Locked by an external override; plain writes are ignored.
        const OVERRIDDEN = 1 << 5;
    }
}

bitflags! {
    /// How a listed property may be used by an editor.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct PropertyUsage: u32 {
        const STORAGE = 1 << 1;
        const EDITOR = 1 << 2;
        const EDITOR_BASIC_SETTING = 1 << 3;
        const RESTART_IF_CHANGED = 1 << 4;
    }
}

/// One entry of a property listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyInfo {
    pub name: String,
    pub kind: ValueKind,
    pub usage: PropertyUsage,
}
