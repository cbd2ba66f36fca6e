use serde::{Deserialize, Serialize};

/// Marks a singleton autoload in the stored path.
pub const SINGLETON_MARKER: char = '*';

/// A resource instantiated at startup, derived from an `autoload/<name>` setting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AutoloadInfo {
    pub name: String,
    pub path: String,
    pub is_singleton: bool,
}

impl AutoloadInfo {
    /// Builds an entry from the raw setting value (`*res://foo.gd` for singletons).
    #[must_use]
    pub fn from_setting(name: impl Into<String>, raw: &str) -> Self {
        let (path, is_singleton) = raw
            .strip_prefix(SINGLETON_MARKER)
            .map_or((raw, false), |stripped| (stripped, true));
        Self { name: name.into(), path: path.to_owned(), is_singleton }
    }

    /// The value to store back under `autoload/<name>`.
    #[must_use]
    pub fn to_setting(&self) -> String {
        if self.is_singleton {
            format!("{SINGLETON_MARKER}{}", self.path)
        } else {
            self.path.clone()
        }
    }
}
