mod common;

use common::isolated;
use lattice_domain::constants::NO_BUILTIN_ORDER_BASE;
use lattice_domain::{AutoloadInfo, PropertyUsage, SettingFlags, Value, ValueKind};
use lattice_settings::{DefineOptions, Settings, SettingsError, StaticFeatures};

#[test]
fn set_then_get_returns_value() {
    let settings = isolated();
    settings.set("physics/2d/gravity", 980);
    settings.set("application/config/name", "Demo");

    assert_eq!(settings.get("physics/2d/gravity").unwrap(), Value::Int(980));
    assert_eq!(settings.get("application/config/name").unwrap(), Value::from("Demo"));
    assert!(settings.has("physics/2d/gravity"));
}

#[test]
fn nil_removes_and_missing_key_fails() {
    let settings = isolated();
    settings.set("a/b", true);
    settings.set("a/b", Value::Nil);

    assert!(!settings.has("a/b"));
    assert!(matches!(settings.get("a/b"), Err(SettingsError::KeyNotFound { .. })));
    assert!(matches!(settings.clear("a/b"), Err(SettingsError::KeyNotFound { .. })));
}

#[test]
fn active_feature_redirects_reads() {
    let settings = Settings::builder().features(StaticFeatures::from_iter(["vulkan"])).build();
    settings.set("rendering/driver", "opengl3");
    settings.set("rendering/driver.vulkan", "vulkan");

    assert_eq!(settings.get("rendering/driver").unwrap(), Value::from("vulkan"));
    let active = settings.active_override("rendering/driver");
    assert_eq!(active.as_deref(), Some("rendering/driver.vulkan"));
    assert_eq!(settings.get("rendering/driver.vulkan").unwrap(), Value::from("vulkan"));
}

#[test]
fn cleared_override_target_is_not_found() {
    let settings = Settings::builder().features(StaticFeatures::from_iter(["vulkan"])).build();
    settings.set("rendering/driver", "opengl3");
    settings.set("rendering/driver.vulkan", "vulkan");
    settings.clear("rendering/driver.vulkan").unwrap();

    let err = settings.get("rendering/driver").unwrap_err();
    assert!(matches!(err, SettingsError::KeyNotFound { .. }));
    assert!(err.to_string().contains("rendering/driver.vulkan"));
    let active = settings.active_override("rendering/driver");
    assert_eq!(active.as_deref(), Some("rendering/driver.vulkan"));

    settings.set("rendering/driver.vulkan", "metal");
    assert_eq!(settings.get("rendering/driver").unwrap(), Value::from("metal"));
}

#[test]
fn inactive_feature_registers_nothing() {
    let settings = isolated();
    settings.set("rendering/driver.vulkan", "vulkan");

    assert!(settings.active_override("rendering/driver").is_none());
    assert!(matches!(settings.get("rendering/driver"), Err(SettingsError::KeyNotFound { .. })));

    settings.set("rendering/driver", "opengl3");
    assert_eq!(settings.get("rendering/driver").unwrap(), Value::from("opengl3"));
}

#[test]
fn custom_features_enable_overrides() {
    let settings = isolated();
    settings.set("custom_features", "steam, demo");
    settings.set("application/config/name.demo", "Demo Build");

    assert!(!settings.has("custom_features"));
    assert!(settings.has_custom_feature("steam"));
    assert_eq!(settings.custom_features(), ["demo", "steam"]);
    assert_eq!(settings.get("application/config/name").unwrap(), Value::from("Demo Build"));
}

#[test]
fn overrides_can_be_disabled() {
    let features = StaticFeatures::from_iter(["mobile"]);
    let settings = Settings::builder().features(features.clone()).build();
    settings.set("display/size", 1);
    settings.set("display/size.mobile", 2);
    assert_eq!(settings.get("display/size").unwrap(), Value::Int(2));

    settings.set_disable_feature_overrides(true);
    assert_eq!(settings.get("display/size").unwrap(), Value::Int(1));
    assert!(settings.active_override("display/size").is_none());

    let plain = Settings::builder().features(features).disable_feature_overrides(true).build();
    plain.set("display/size.mobile", 2);
    assert!(plain.get("display/size").is_err());
    assert!(plain.has("display/size.mobile"));
}

#[test]
fn locked_records_ignore_writes() {
    let settings = isolated();
    settings.set("debug/fps", 60);
    settings.set_locked("debug/fps", true).unwrap();
    settings.set("debug/fps", 30);
    assert_eq!(settings.get("debug/fps").unwrap(), Value::Int(60));

    settings.set_locked("debug/fps", false).unwrap();
    settings.set("debug/fps", 30);
    assert_eq!(settings.get("debug/fps").unwrap(), Value::Int(30));
}

#[test]
fn autoload_follows_its_record() {
    let settings = isolated();
    settings.set("autoload/Foo", "*res://foo.gd");

    let expected = AutoloadInfo {
        name: "Foo".to_owned(),
        path: "res://foo.gd".to_owned(),
        is_singleton: true,
    };
    assert_eq!(settings.autoload("Foo"), Some(expected));
    assert!(settings.has("autoload/Foo"));

    settings.clear("autoload/Foo").unwrap();
    assert!(!settings.has_autoload("Foo"));
    assert!(!settings.has("autoload/Foo"));
}

#[test]
fn autoload_registry_accessors() {
    let settings = isolated();
    let bar = AutoloadInfo::from_setting("Bar", "res://bar.gd");
    let audio = AutoloadInfo::from_setting("Audio", "*res://audio.gd");
    assert!(audio.is_singleton);
    settings.add_autoload(&bar).unwrap();
    settings.add_autoload(&audio).unwrap();

    assert_eq!(settings.get("autoload/Bar").unwrap(), Value::from("res://bar.gd"));
    assert_eq!(settings.get("autoload/Audio").unwrap(), Value::from("*res://audio.gd"));
    assert_eq!(settings.autoloads(), [bar, audio]);

    settings.remove_autoload("Bar").unwrap();
    assert!(!settings.has("autoload/Bar"));
    assert!(matches!(settings.remove_autoload("Bar"), Err(SettingsError::KeyNotFound { .. })));

    let nameless = AutoloadInfo::from_setting("", "res://x.gd");
    let err = settings.add_autoload(&nameless).unwrap_err();
    assert!(matches!(err, SettingsError::InvalidParameter { .. }));
}

#[test]
fn orders_are_assigned_on_insert() {
    let settings = isolated();
    settings.set("b/first", 1);
    settings.set("a/second", 2);

    assert_eq!(settings.get_order("b/first").unwrap(), NO_BUILTIN_ORDER_BASE);
    assert_eq!(settings.get_order("a/second").unwrap(), NO_BUILTIN_ORDER_BASE + 1);

    settings.set_order("a/second", 3).unwrap();
    assert_eq!(settings.get_order("a/second").unwrap(), 3);
    assert!(matches!(settings.get_order("missing"), Err(SettingsError::KeyNotFound { .. })));
    assert!(settings.set_order("missing", 1).is_err());
}

#[test]
fn define_records_defaults() {
    let settings = isolated();
    let value = settings.define("display/width", 1152, DefineOptions::new().basic()).unwrap();
    assert_eq!(value, Value::Int(1152));
    assert!(settings.is_builtin_setting("display/width"));
    assert_eq!(settings.get_order("display/width").unwrap(), 0);
    assert!(!settings.can_revert("display/width").unwrap());

    settings.set("display/width", 1920);
    assert!(settings.can_revert("display/width").unwrap());
    assert_eq!(settings.initial_value("display/width").unwrap(), Value::Int(1152));

    settings.set("user/volume", 3);
    assert!(!settings.is_builtin_setting("user/volume"));
    let kept = settings.define("user/volume", 9, DefineOptions::new()).unwrap();
    assert_eq!(kept, Value::Int(3));
    assert_eq!(settings.get_order("user/volume").unwrap(), 1);
    assert_eq!(settings.initial_value("user/volume").unwrap(), Value::Int(9));

    assert!(settings.is_builtin_setting("never/set"));
}

#[test]
fn define_returns_overridden_value() {
    let settings = Settings::builder().features(StaticFeatures::from_iter(["pc"])).build();
    settings.set("display/vsync.pc", false);
    let value = settings.define("display/vsync", true, DefineOptions::new()).unwrap();
    assert_eq!(value, Value::Bool(false));
}

#[test]
fn flags_round_trip() {
    let settings = isolated();
    settings.set("rendering/msaa", 2);
    settings.set_restart_if_changed("rendering/msaa", true).unwrap();
    settings.set_as_basic("rendering/msaa", true).unwrap();
    settings.set_ignore_value_in_docs("rendering/msaa", true).unwrap();
    settings.set_as_internal("rendering/msaa", true).unwrap();
    settings.set_as_internal("rendering/msaa", false).unwrap();

    let flags = settings.flags("rendering/msaa").unwrap();
    assert_eq!(
        flags,
        SettingFlags::RESTART_IF_CHANGED | SettingFlags::BASIC | SettingFlags::IGNORE_IN_DOCS
    );
    assert!(settings.set_hidden("missing", true).is_err());
    settings.set_initial_value("rendering/msaa", 2).unwrap();
    assert!(!settings.can_revert("rendering/msaa").unwrap());
}

#[test]
fn property_list_orders_and_filters() {
    let settings = isolated();
    settings.set("zeta/a", 1);
    settings.set("input/jump", Value::Array(Vec::new()));
    settings.set("alpha/secret", "x");
    settings.set_hidden("alpha/secret", true).unwrap();
    settings.define("alpha/basic", 0.5, DefineOptions::new().basic().restart_if_changed()).unwrap();

    let listed = settings.property_list();
    let names: Vec<&str> = listed.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["alpha/basic", "zeta/a", "input/jump"]);

    assert_eq!(listed[0].kind, ValueKind::Float);
    assert_eq!(
        listed[0].usage,
        PropertyUsage::EDITOR
            | PropertyUsage::STORAGE
            | PropertyUsage::EDITOR_BASIC_SETTING
            | PropertyUsage::RESTART_IF_CHANGED
    );
    assert_eq!(listed[2].usage, PropertyUsage::STORAGE);
}

#[test]
fn equal_orders_fall_back_to_names() {
    let settings = isolated();
    settings.set("b/key", 1);
    settings.set("a/key", 2);
    settings.set_order("a/key", 5).unwrap();
    settings.set_order("b/key", 5).unwrap();

    let names: Vec<String> = settings.property_list().into_iter().map(|p| p.name).collect();
    assert_eq!(names, ["a/key", "b/key"]);
}

#[test]
fn core_defaults_are_opt_in() {
    let bare = isolated();
    assert!(bare.property_list().is_empty());

    let settings = Settings::builder().features(StaticFeatures::new()).core_defaults(true).build();
    assert_eq!(settings.get("display/window/size/viewport_width").unwrap(), Value::Int(1152));
    assert_eq!(settings.property_list()[0].name, "application/config/name");
    assert!(settings.flags("application/config/name").unwrap().contains(SettingFlags::BASIC));
}

#[test]
fn clones_share_state_across_threads() {
    let settings = isolated();
    std::thread::scope(|scope| {
        for worker in 0..4 {
            let handle = settings.clone();
            scope.spawn(move || {
                for i in 0..50 {
                    handle.set(&format!("worker_{worker}/key_{i}"), i);
                }
            });
        }
    });

    assert_eq!(settings.property_list().len(), 200);
    assert_eq!(settings.get("worker_3/key_49").unwrap(), Value::Int(49));
}
