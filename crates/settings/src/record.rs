use lattice_domain::{SettingFlags, Value};

/// A stored setting: value plus the metadata used for listing, reverting and saving.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SettingRecord {
    pub(crate) value: Value,
    /// Default used for revert and merged saves; [`Value::Nil`] until defined.
    pub(crate) initial: Value,
    pub(crate) order: i32,
    pub(crate) flags: SettingFlags,
}

impl SettingRecord {
    pub(crate) const fn new(value: Value, order: i32) -> Self {
        Self { value, initial: Value::Nil, order, flags: SettingFlags::empty() }
    }

    pub(crate) fn is_changed(&self) -> bool {
        self.value != self.initial
    }
}

/// Flags applied by [`Settings::define`](crate::Settings::define).
///
/// ```rust
/// use lattice_settings::DefineOptions;
///
/// let options = DefineOptions::new().basic().restart_if_changed();
/// assert!(options.flags().contains(lattice_domain::SettingFlags::BASIC));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefineOptions {
    flags: SettingFlags,
}

impl DefineOptions {
    #[must_use]
    pub const fn new() -> Self {
        Self { flags: SettingFlags::empty() }
    }

    #[must_use]
    pub const fn basic(self) -> Self {
        self.with(SettingFlags::BASIC)
    }

    #[must_use]
    pub const fn restart_if_changed(self) -> Self {
        self.with(SettingFlags::RESTART_IF_CHANGED)
    }

    #[must_use]
    pub const fn internal(self) -> Self {
        self.with(SettingFlags::INTERNAL)
    }

    #[must_use]
    pub const fn ignore_in_docs(self) -> Self {
        self.with(SettingFlags::IGNORE_IN_DOCS)
    }

    #[must_use]
    pub const fn flags(self) -> SettingFlags {
        self.flags
    }

    const fn with(self, flag: SettingFlags) -> Self {
        Self { flags: self.flags.union(flag) }
    }
}

/// The flags `define` owns; other flags on the record are left alone.
pub(crate) const DEFINE_MASK: SettingFlags = SettingFlags::BASIC
    .union(SettingFlags::RESTART_IF_CHANGED)
    .union(SettingFlags::INTERNAL)
    .union(SettingFlags::IGNORE_IN_DOCS);
