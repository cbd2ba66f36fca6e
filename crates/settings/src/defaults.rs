//! Built-in definitions registered by [`SettingsBuilder::core_defaults`].
//!
//! [`SettingsBuilder::core_defaults`]: crate::SettingsBuilder::core_defaults

use crate::features::FeatureSet;
use crate::record::DefineOptions;
use crate::state::SettingsState;
use lattice_domain::Value;
use lattice_domain::constants::PROJECT_SETTINGS_OVERRIDE_KEY;
use tracing::warn;

pub(crate) fn register(state: &mut SettingsState, features: &dyn FeatureSet) {
    let basic = DefineOptions::new().basic();
    let restart = DefineOptions::new().restart_if_changed();
    let plain = DefineOptions::new();
    let internal = DefineOptions::new().internal();
    let no_entries = Value::PackedStringArray(Vec::new());

    let table: [(&str, Value, DefineOptions); 16] = [
        ("application/config/name", Value::from(""), basic),
        ("application/config/description", Value::from(""), basic),
        ("application/run/main_scene", Value::from(""), basic),
        ("application/run/disable_stdout", Value::Bool(false), plain),
        ("application/run/disable_stderr", Value::Bool(false), plain),
        ("application/config/use_hidden_project_data_directory", Value::Bool(true), restart),
        ("application/config/use_custom_user_dir", Value::Bool(false), plain),
        ("application/config/custom_user_dir_name", Value::from(""), plain),
        (PROJECT_SETTINGS_OVERRIDE_KEY, Value::from(""), plain),
        ("display/window/size/viewport_width", Value::Int(1152), basic),
        ("display/window/size/viewport_height", Value::Int(648), basic),
        ("display/window/size/resizable", Value::Bool(true), basic),
        ("display/window/energy_saving/keep_screen_on", Value::Bool(true), plain),
        ("audio/general/2d_panning_strength", Value::Float(1.0), restart),
        ("application/config/features", no_entries.clone(), internal),
        ("internationalization/locale/translations", no_entries, internal),
    ];

    for (key, default, options) in table {
        if let Err(e) = state.define(key, default, options, features) {
            warn!(key, error = %e, "Failed to define built-in setting");
        }
    }
}
