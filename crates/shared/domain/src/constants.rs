//! Reserved keys, namespaces and file names.

/// Highest text layout version this build understands.
pub const CONFIG_VERSION: i64 = 5;

/// Reserved top-level assignment holding the saved layout version.
pub const CONFIG_VERSION_KEY: &str = "config_version";
/// Reserved key whose comma-separated value seeds the custom feature set.
pub const CUSTOM_FEATURES_KEY: &str = "custom_features";
/// Names an extra text file loaded after a successful setup.
pub const PROJECT_SETTINGS_OVERRIDE_KEY: &str = "application/config/project_settings_override";

pub const AUTOLOAD_PREFIX: &str = "autoload/";
pub const INPUT_PREFIX: &str = "input/";

/// Namespaces that are stored but never shown in the editor.
pub const STORAGE_ONLY_PREFIXES: &[&str] = &[
    "input/",
    "importer_defaults/",
    "import/",
    "autoload/",
    "editor_plugins/",
    "shader_globals/",
];

/// Orders below this value belong to built-in definitions.
pub const NO_BUILTIN_ORDER_BASE: i32 = 1 << 16;
/// Order given to custom save entries that have no live record.
pub const DETACHED_ORDER: i32 = 0xFFF_FFFF;

pub const RES_SCHEME: &str = "res://";
pub const USER_SCHEME: &str = "user://";

pub const PROJECT_FILE_TEXT: &str = "project.cfg";
pub const PROJECT_FILE_BINARY: &str = "project.binary";
pub const OVERRIDE_FILE: &str = "override.cfg";

pub const TEXT_EXTENSION: &str = "cfg";
pub const BINARY_EXTENSION: &str = "binary";
pub const PACK_EXTENSION: &str = "pck";
