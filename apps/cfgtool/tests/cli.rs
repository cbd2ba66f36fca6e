use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const PROJECT: &str = "config_version=5\n\n[application]\n\nconfig/name=\"Demo\"\n\
                       config/name.demo=\"Demo Build\"\n\n[autoload]\n\nGame=\"*res://game.gd\"\n";

fn lattice_cfg(cwd: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_lattice-cfg"));
    cmd.current_dir(cwd).env_remove("LATTICE__FEATURES").env_remove("RUST_LOG");
    cmd
}

fn project() -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("project.cfg"), PROJECT).unwrap();
    temp
}

#[test]
fn get_prints_literal() {
    let temp = project();
    lattice_cfg(temp.path())
        .args(["get", "application/config/name"])
        .assert()
        .success()
        .stdout("\"Demo\"\n");
}

#[test]
fn get_missing_key_fails() {
    let temp = project();
    lattice_cfg(temp.path())
        .args(["get", "nothing/here"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Setting not found"));
}

#[test]
fn feature_flag_selects_override() {
    let temp = project();
    lattice_cfg(temp.path())
        .args(["get", "application/config/name", "--feature", "demo"])
        .assert()
        .success()
        .stdout("\"Demo Build\"\n");
}

#[test]
fn config_file_adds_features() {
    let temp = project();
    fs::write(temp.path().join("lattice.toml"), "features = [\"demo\"]\n").unwrap();
    lattice_cfg(temp.path())
        .args(["get", "application/config/name"])
        .assert()
        .success()
        .stdout("\"Demo Build\"\n");
}

#[test]
fn set_persists_to_project_file() {
    let temp = project();
    lattice_cfg(temp.path())
        .args(["set", "display/window/size/viewport_width", "1920"])
        .assert()
        .success();
    lattice_cfg(temp.path())
        .args(["set", "application/run/main_scene", "res://main.scn", "--string"])
        .assert()
        .success();

    let text = fs::read_to_string(temp.path().join("project.cfg")).unwrap();
    assert!(text.contains("[display]"));
    assert!(text.contains("window/size/viewport_width=1920"));
    assert!(text.contains("run/main_scene=\"res://main.scn\""));

    lattice_cfg(temp.path())
        .args(["get", "display/window/size/viewport_width"])
        .assert()
        .success()
        .stdout("1920\n");
}

#[test]
fn set_null_removes() {
    let temp = project();
    lattice_cfg(temp.path())
        .args(["set", "application/config/name.demo", "null"])
        .assert()
        .success();
    lattice_cfg(temp.path())
        .args(["set", "display/window/size/offset", "-8"])
        .assert()
        .success();

    let text = fs::read_to_string(temp.path().join("project.cfg")).unwrap();
    assert!(!text.contains("name.demo"));
    assert!(text.contains("window/size/offset=-8"));
    lattice_cfg(temp.path())
        .args(["get", "application/config/name", "--feature", "demo"])
        .assert()
        .success()
        .stdout("\"Demo\"\n");
}

#[test]
fn set_leaves_local_overrides_out_of_project() {
    let temp = project();
    fs::write(temp.path().join("override.cfg"), "[display]\nlocal/secret=\"machine-only\"\n")
        .unwrap();

    lattice_cfg(temp.path())
        .args(["get", "display/local/secret"])
        .assert()
        .success()
        .stdout("\"machine-only\"\n");
    lattice_cfg(temp.path())
        .args(["set", "application/config/description", "shared", "--string"])
        .assert()
        .success();

    let text = fs::read_to_string(temp.path().join("project.cfg")).unwrap();
    assert!(text.contains("config/description=\"shared\""));
    assert!(!text.contains("machine-only"), "{text}");
}

#[test]
fn set_rejects_bad_literal() {
    let temp = project();
    lattice_cfg(temp.path())
        .args(["set", "application/config/name", "not a literal"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--string"));
}

#[test]
fn list_and_autoloads() {
    let temp = project();
    lattice_cfg(temp.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("application/config/name=\"Demo\"\n"));

    lattice_cfg(temp.path())
        .args(["list", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"autoload/Game\""));

    lattice_cfg(temp.path())
        .arg("autoloads")
        .assert()
        .success()
        .stdout("Game\tres://game.gd\tsingleton\n");
}

#[test]
fn convert_to_binary_and_back() {
    let temp = project();
    let binary_dir = TempDir::new().unwrap();
    let binary = binary_dir.path().join("project.binary");
    let text = temp.path().join("roundtrip.cfg");

    lattice_cfg(temp.path())
        .args(["convert", "project.cfg", binary.to_str().unwrap()])
        .assert()
        .success();
    assert_eq!(&fs::read(&binary).unwrap()[..4], b"ECFG");

    lattice_cfg(binary_dir.path())
        .args(["get", "application/config/name.demo"])
        .assert()
        .success()
        .stdout("\"Demo Build\"\n");

    lattice_cfg(temp.path())
        .args(["convert", binary.to_str().unwrap(), text.to_str().unwrap()])
        .assert()
        .success();
    let converted = fs::read_to_string(text).unwrap();
    assert!(converted.contains("config/name.demo=\"Demo Build\""));
}

#[test]
fn missing_project_is_reported() {
    let temp = TempDir::new().unwrap();
    lattice_cfg(temp.path())
        .args(["get", "application/config/name"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No project found"));
}
