use lattice_storage::*;
use tempfile::TempDir;

fn vfs_at(temp: &TempDir) -> Vfs {
    Vfs::builder().resource_root(temp.path()).user_dir(temp.path().join("user")).build()
}

#[test]
fn test_path_traversal_blocked() {
    let temp = TempDir::new().unwrap();
    let vfs = vfs_at(&temp);

    assert!(matches!(
        vfs.disk_path("res://../etc/passwd"),
        Err(StorageError::PathTraversalAttempt { .. })
    ));
    assert!(vfs.disk_path("res://foo/../../bar").is_err());
    assert!(vfs.write("user://../../escape.cfg", b"x").is_err());
}

#[test]
fn test_write_read_roundtrip() {
    let temp = TempDir::new().unwrap();
    let vfs = vfs_at(&temp);

    vfs.write("res://nested/dir/project.cfg", b"config_version=5\n").unwrap();
    assert!(vfs.exists("res://nested/dir/project.cfg"));
    assert_eq!(vfs.read_to_string("res://nested/dir/project.cfg").unwrap(), "config_version=5\n");
    assert!(vfs.modified_time("res://nested/dir/project.cfg").is_some());

    vfs.write("user://prefs.cfg", b"a=1").unwrap();
    assert!(temp.path().join("user").join("prefs.cfg").is_file());
}

#[test]
fn test_overwrite_leaves_no_temp_files() {
    let temp = TempDir::new().unwrap();
    let vfs = vfs_at(&temp);

    vfs.write("res://project.cfg", b"first").unwrap();
    vfs.write("res://project.cfg", b"second").unwrap();

    assert_eq!(vfs.read("res://project.cfg").unwrap(), b"second");
    let leftovers = std::fs::read_dir(temp.path())
        .unwrap()
        .flatten()
        .filter(|e| e.file_name().to_string_lossy().contains(".lattmp."))
        .count();
    assert_eq!(leftovers, 0);
}

#[test]
fn test_missing_file_is_not_found() {
    let temp = TempDir::new().unwrap();
    let vfs = vfs_at(&temp);

    let err = vfs.read("res://override.cfg").unwrap_err();
    assert!(err.is_not_found());
    assert!(!vfs.exists("res://override.cfg"));
    assert!(vfs.modified_time("res://override.cfg").is_none());
}

#[test]
fn test_plain_paths_bypass_roots() {
    let temp = TempDir::new().unwrap();
    let vfs = Vfs::default();
    let target = temp.path().join("absolute.cfg");
    let target_str = target.to_str().unwrap();

    vfs.write(target_str, b"plain").unwrap();
    assert_eq!(vfs.read(target_str).unwrap(), b"plain");
    assert_eq!(vfs.disk_path(target_str).unwrap(), target);
}

#[test]
fn test_pack_entries_shadow_disk() {
    let temp = TempDir::new().unwrap();
    let vfs = vfs_at(&temp);
    std::fs::write(temp.path().join("project.binary"), b"disk").unwrap();
    std::fs::write(temp.path().join("only_on_disk.txt"), b"fallback").unwrap();

    let pack = temp.path().join("game.pck");
    PackBuilder::new().file("res://project.binary", b"packed".to_vec()).write(&pack).unwrap();

    assert!(!vfs.is_using_pack());
    vfs.mount(&pack, true, 0).unwrap();
    assert!(vfs.is_using_pack());

    assert_eq!(vfs.read("res://project.binary").unwrap(), b"packed");
    assert_eq!(vfs.read("res://./project.binary").unwrap(), b"packed");
    assert_eq!(vfs.read("res://only_on_disk.txt").unwrap(), b"fallback");
}

#[test]
fn test_replace_flag_controls_precedence() {
    let temp = TempDir::new().unwrap();
    let vfs = vfs_at(&temp);

    let base = temp.path().join("base.pck");
    let patch = temp.path().join("patch.pck");
    let late = temp.path().join("late.pck");
    PackBuilder::new().file("a.txt", b"base".to_vec()).write(&base).unwrap();
    PackBuilder::new().file("a.txt", b"patch".to_vec()).write(&patch).unwrap();
    PackBuilder::new().file("a.txt", b"late".to_vec()).write(&late).unwrap();

    vfs.mount(&base, true, 0).unwrap();
    vfs.mount(&patch, true, 0).unwrap();
    assert_eq!(vfs.read("res://a.txt").unwrap(), b"patch");

    vfs.mount(&late, false, 0).unwrap();
    assert_eq!(vfs.read("res://a.txt").unwrap(), b"patch");
}

#[test]
fn test_compressed_pack_roundtrip() {
    let temp = TempDir::new().unwrap();
    let vfs = vfs_at(&temp);

    let payload = vec![42u8; 8192];
    let pack = temp.path().join("data.pck");
    PackBuilder::new()
        .compression(Compression::Lz4)
        .file("blob.bin", payload.clone())
        .write(&pack)
        .unwrap();

    assert!(std::fs::metadata(&pack).unwrap().len() < 8192);
    vfs.mount(&pack, true, 0).unwrap();
    assert_eq!(vfs.read("res://blob.bin").unwrap(), payload);
}

#[test]
fn test_pack_embedded_in_executable() {
    let temp = TempDir::new().unwrap();
    let vfs = vfs_at(&temp);

    let exe = temp.path().join("game.exe");
    std::fs::write(&exe, vec![0x7fu8; 1000]).unwrap();
    PackBuilder::new().file("project.binary", b"embedded".to_vec()).append_to(&exe).unwrap();

    vfs.mount(&exe, true, 0).unwrap();
    assert_eq!(vfs.read("res://project.binary").unwrap(), b"embedded");
}

#[test]
fn test_pack_at_explicit_offset() {
    let temp = TempDir::new().unwrap();
    let vfs = vfs_at(&temp);

    let bytes = PackBuilder::new().file("x.cfg", b"offset".to_vec()).to_bytes().unwrap();
    let mut file = vec![0u8; 64];
    file.extend_from_slice(&bytes);
    let host = temp.path().join("host.bin");
    std::fs::write(&host, file).unwrap();

    vfs.mount(&host, true, 64).unwrap();
    assert_eq!(vfs.read("res://x.cfg").unwrap(), b"offset");
}

#[test]
fn test_mount_failures() {
    let temp = TempDir::new().unwrap();
    let vfs = vfs_at(&temp);

    assert!(vfs.mount(temp.path().join("missing.pck"), true, 0).unwrap_err().is_not_found());

    let junk = temp.path().join("junk.pck");
    std::fs::write(&junk, b"not a pack at all").unwrap();
    assert!(matches!(vfs.mount(&junk, true, 0), Err(StorageError::InvalidPack { .. })));
    assert!(!vfs.is_using_pack());

    let disabled = Vfs::builder().resource_root(temp.path()).packs_enabled(false).build();
    let pack = temp.path().join("ok.pck");
    PackBuilder::new().file("a", b"a".to_vec()).write(&pack).unwrap();
    assert!(matches!(disabled.mount(&pack, true, 0), Err(StorageError::PacksDisabled { .. })));
}
