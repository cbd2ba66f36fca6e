mod common;

use common::{isolated, path_str};
use lattice_domain::{Color, Dictionary, Value, Vector2i};
use lattice_settings::{CustomMap, Migration, Settings, SettingsError, StaticFeatures};
use lattice_storage::Vfs;
use tempfile::TempDir;

const NO_FEATURES: &[&str] = &[];

fn sample() -> Settings {
    let settings = isolated();
    settings.set("application/config/name", "Demo \"quoted\"");
    settings.set("application/run/main_scene", "res://main.scn");
    settings.set("display/window/size", Value::Vector2i(Vector2i { x: 1152, y: 648 }));
    settings.set("rendering/clear_color", Value::Color(Color { r: 0.3, g: 0.3, b: 0.3, a: 1.0 }));
    settings.set("autoload/Game", "*res://game.gd");
    settings.set("toplevel", 7);

    let mut action = Dictionary::new();
    action.insert("deadzone", 0.2);
    action.insert("events", Value::Array(vec![Value::Int(32), Value::from("ui_accept")]));
    settings.set("input/jump", Value::Dictionary(action));
    settings
}

fn assert_same_records(expected: &Settings, actual: &Settings) {
    let names: Vec<String> = expected.property_list().into_iter().map(|p| p.name).collect();
    assert_eq!(names.len(), actual.property_list().len());
    for name in names {
        assert_eq!(expected.get(&name).unwrap(), actual.get(&name).unwrap(), "{name}");
    }
}

#[test]
fn text_file_layout() {
    let temp = TempDir::new().unwrap();
    let path = path_str(&temp.path().join("project.cfg"));

    let settings = isolated();
    settings.set("toplevel", 1);
    settings.set("application/config/name", "Demo");
    settings.save_custom(&path, &CustomMap::default(), &["steam"], true).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with(';'));
    assert!(text.ends_with(
        "config_version=5\ncustom_features=\"steam\"\n\ntoplevel=1\n\n[application]\n\n\
         config/name=\"Demo\"\n"
    ));
}

#[test]
fn text_round_trip() {
    let temp = TempDir::new().unwrap();
    let path = path_str(&temp.path().join("project.cfg"));

    let original = sample();
    original.save_custom(&path, &CustomMap::default(), &["demo"], true).unwrap();

    let loaded = isolated();
    loaded.load_custom(&path).unwrap();
    assert_same_records(&original, &loaded);
    assert!(loaded.autoload("Game").unwrap().is_singleton);
    assert!(loaded.has_custom_feature("demo"));
    assert!(loaded.last_save_time().is_some());
}

#[test]
fn binary_round_trip() {
    let temp = TempDir::new().unwrap();
    let path = path_str(&temp.path().join("project.binary"));

    let original = sample();
    original.save_custom(&path, &CustomMap::default(), &[" \"steam\" ", "pc"], true).unwrap();
    assert_eq!(&std::fs::read(&path).unwrap()[..4], b"ECFG");

    let loaded = isolated();
    loaded.load_custom(&path).unwrap();
    assert_same_records(&original, &loaded);
    assert_eq!(loaded.custom_features(), ["pc", "steam"]);
}

#[test]
fn saves_are_deterministic() {
    let temp = TempDir::new().unwrap();
    let settings = sample();

    for ext in ["cfg", "binary"] {
        let first = path_str(&temp.path().join(format!("first.{ext}")));
        let second = path_str(&temp.path().join(format!("second.{ext}")));
        settings.save_custom(&first, &CustomMap::default(), &["a", "b"], true).unwrap();
        settings.save_custom(&second, &CustomMap::default(), &["a", "b"], true).unwrap();
        assert_eq!(std::fs::read(first).unwrap(), std::fs::read(second).unwrap());
    }
}

#[test]
fn merge_skips_hidden_and_unchanged_records() {
    let temp = TempDir::new().unwrap();
    let path = path_str(&temp.path().join("project.cfg"));

    let settings = isolated();
    settings.set("app/changed", 1);
    settings.set("app/secret", 2);
    settings.set_hidden("app/secret", true).unwrap();
    settings.set("app/untouched", 3);
    settings.set_initial_value("app/untouched", 3).unwrap();
    settings.save_custom(&path, &CustomMap::default(), NO_FEATURES, true).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("changed=1"));
    assert!(!text.contains("secret"));
    assert!(!text.contains("untouched"));
    assert!(!text.contains("custom_features"));
}

#[test]
fn custom_entries_win_and_merge_is_optional() {
    let temp = TempDir::new().unwrap();
    let merged = path_str(&temp.path().join("merged.cfg"));
    let only_custom = path_str(&temp.path().join("custom.binary"));

    let settings = isolated();
    settings.set("a/first", "record");
    settings.set("b/other", 5);

    let mut custom = CustomMap::default();
    custom.insert("a/first".to_owned(), Value::from("custom"));
    custom.insert("zz/extra".to_owned(), Value::Int(1));

    settings.save_custom(&merged, &custom, NO_FEATURES, true).unwrap();
    settings.save_custom(&only_custom, &custom, NO_FEATURES, false).unwrap();

    let loaded = isolated();
    loaded.load_custom(&merged).unwrap();
    assert_eq!(loaded.get("a/first").unwrap(), Value::from("custom"));
    assert_eq!(loaded.get("b/other").unwrap(), Value::Int(5));
    assert_eq!(loaded.get("zz/extra").unwrap(), Value::Int(1));

    let loaded = isolated();
    loaded.load_custom(&only_custom).unwrap();
    assert!(!loaded.has("b/other"));
    assert_eq!(loaded.property_list().len(), 2);
}

#[test]
fn save_rejects_bad_destinations() {
    let temp = TempDir::new().unwrap();
    let settings = sample();
    let custom = CustomMap::default();

    let err = settings.save_custom("", &custom, NO_FEATURES, true).unwrap_err();
    assert!(matches!(err, SettingsError::InvalidParameter { .. }));

    let json = path_str(&temp.path().join("project.json"));
    let err = settings.save_custom(&json, &custom, NO_FEATURES, true).unwrap_err();
    assert!(matches!(err, SettingsError::UnrecognizedFormat { .. }));

    let blocker = temp.path().join("blocker");
    std::fs::write(&blocker, b"not a directory").unwrap();
    let nested = path_str(&blocker.join("project.cfg"));
    let err = settings.save_custom(&nested, &custom, NO_FEATURES, true).unwrap_err();
    assert!(matches!(err, SettingsError::WriteFailure { .. }));
}

#[test]
fn save_writes_project_file_under_resource_root() {
    let temp = TempDir::new().unwrap();
    let settings = Settings::builder()
        .features(StaticFeatures::new())
        .vfs(Vfs::builder().resource_root(temp.path()).build())
        .build();
    settings.set("custom_features", "demo");
    settings.set("application/config/name", "Saved");

    assert!(settings.last_save_time().is_none());
    settings.save().unwrap();
    assert!(settings.last_save_time().is_some());

    let text = std::fs::read_to_string(temp.path().join("project.cfg")).unwrap();
    assert!(text.contains("custom_features=\"demo\"\n"));
    assert!(text.contains("config/name=\"Saved\"\n"));
}

#[test]
fn missing_file_is_not_found() {
    let temp = TempDir::new().unwrap();
    let settings = isolated();

    for name in ["absent.cfg", "absent.binary"] {
        let err = settings.load_custom(&path_str(&temp.path().join(name))).unwrap_err();
        assert!(err.is_not_found(), "{err}");
    }
}

#[test]
fn bad_magic_applies_nothing() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("project.binary");
    let mut bytes = b"XCFG".to_vec();
    bytes.extend_from_slice(&1u32.to_le_bytes());
    std::fs::write(&path, bytes).unwrap();

    let settings = isolated();
    let err = settings.load_custom(&path_str(&path)).unwrap_err();
    assert!(matches!(err, SettingsError::CorruptData { .. }));
    assert!(settings.property_list().is_empty());
}

#[test]
fn newer_version_applies_nothing() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("project.cfg");
    std::fs::write(&path, "[application]\nconfig/name=\"Future\"\nconfig_version=6\n").unwrap();
    let future = temp.path().join("future.cfg");
    std::fs::write(&future, "config_version=6\n\n[application]\n\nconfig/name=\"Future\"\n")
        .unwrap();

    let settings = isolated();
    // Inside a section the reserved name is an ordinary record.
    settings.load_custom(&path_str(&path)).unwrap();
    assert!(settings.has("application/config_version"));

    let settings = isolated();
    let err = settings.load_custom(&path_str(&future)).unwrap_err();
    assert!(matches!(err, SettingsError::IncompatibleVersion { found: 6, supported: 5, .. }));
    assert!(!settings.has("application/config/name"));
}

#[test]
fn malformed_records_are_skipped() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("project.cfg");
    std::fs::write(&path, "[a]\ngood=1\nbad=Vector2(1.0)\nnext=2\n").unwrap();

    let settings = isolated();
    settings.load_custom(&path_str(&path)).unwrap();
    assert_eq!(settings.get("a/good").unwrap(), Value::Int(1));
    assert_eq!(settings.get("a/next").unwrap(), Value::Int(2));
    assert!(!settings.has("a/bad"));
}

#[test]
fn old_input_actions_are_migrated() {
    let temp = TempDir::new().unwrap();
    let old = temp.path().join("old.cfg");
    let current = temp.path().join("current.cfg");
    std::fs::write(&old, "config_version=3\n\n[input]\n\njump=[32, \"space\"]\n").unwrap();
    std::fs::write(&current, "config_version=5\n\n[input]\n\njump=[32]\n").unwrap();

    let settings = isolated();
    settings.load_custom(&path_str(&old)).unwrap();
    let Value::Dictionary(action) = settings.get("input/jump").unwrap() else {
        panic!("input action was not migrated");
    };
    assert_eq!(action.get_str("deadzone"), Some(&Value::Float(0.5)));
    assert_eq!(
        action.get_str("events"),
        Some(&Value::Array(vec![Value::Int(32), Value::from("space")]))
    );

    let settings = isolated();
    settings.load_custom(&path_str(&current)).unwrap();
    assert_eq!(settings.get("input/jump").unwrap(), Value::Array(vec![Value::Int(32)]));
}

fn rename_gles2(key: &str, value: &mut Value) -> bool {
    if key == "rendering/driver" && value.as_str() == Some("gles2") {
        *value = Value::from("compatibility");
        return true;
    }
    false
}

#[test]
fn registered_migrations_run_on_load() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("project.cfg");
    std::fs::write(&path, "config_version=4\n\n[rendering]\n\ndriver=\"gles2\"\n").unwrap();

    let settings = Settings::builder()
        .features(StaticFeatures::new())
        .migration(Migration { name: "gles2", applies_through: 4, apply: rename_gles2 })
        .build();
    settings.load_custom(&path_str(&path)).unwrap();
    assert_eq!(settings.get("rendering/driver").unwrap(), Value::from("compatibility"));
}
