#![cfg(feature = "cli")]

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::tempdir;

const ROOT: &str = "25E42C696BA466E1D6FEBE101DB8FA38922330793FA596A63BAF0DED9A130595";

fn scenario(root: &Path) {
    fs::write(root.join("empty"), b"").unwrap();
    fs::create_dir(root.join("sub")).unwrap();
    fs::write(root.join("sub/a.txt"), b"hi").unwrap();
}

fn dirhash(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_dirhash"))
        .args(args)
        .env_remove("DIRHASH_SYMLINKS")
        .env_remove("DIRHASH_CONFIG")
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn test_prints_uppercase_digest() {
    let dir = tempdir().unwrap();
    scenario(dir.path());

    let out = dirhash(&["--dir", dir.path().to_str().unwrap()]);
    assert!(out.status.success());
    assert_eq!(String::from_utf8(out.stdout).unwrap(), format!("{}\n", ROOT));
}

#[test]
fn test_defaults_to_current_directory() {
    let dir = tempdir().unwrap();
    scenario(dir.path());

    let out = Command::new(env!("CARGO_BIN_EXE_dirhash"))
        .current_dir(dir.path())
        .output()
        .unwrap();
    assert!(out.status.success());
    assert_eq!(String::from_utf8(out.stdout).unwrap(), format!("{}\n", ROOT));
}

#[test]
fn test_prints_listing() {
    let dir = tempdir().unwrap();
    scenario(dir.path());

    let out = dirhash(&["--dir", dir.path().to_str().unwrap(), "--listing"]);
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.contains("\"sub\"\n=\n"));
    assert!(stdout.ends_with("\"empty\"\n"));
}

#[test]
fn test_file_root_fails() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("file");
    fs::write(&file, "x").unwrap();

    let out = dirhash(&["--dir", file.to_str().unwrap()]);
    assert!(!out.status.success());
    assert!(out.stdout.is_empty());
    assert!(String::from_utf8(out.stderr).unwrap().contains("not a directory"));
}

#[test]
fn test_expect_checks_digest() {
    let dir = tempdir().unwrap();
    scenario(dir.path());
    let path = dir.path().to_str().unwrap();

    let ok = dirhash(&["--dir", path, "--expect", &ROOT.to_lowercase()]);
    assert!(ok.status.success());

    let wrong = "0".repeat(64);
    let bad = dirhash(&["--dir", path, "--expect", &wrong]);
    assert!(!bad.status.success());
    assert!(String::from_utf8(bad.stderr).unwrap().contains("digest mismatch"));
}

#[cfg(unix)]
#[test]
fn test_config_file_sets_symlink_policy() {
    let tree = tempdir().unwrap();
    fs::write(tree.path().join("f"), "f").unwrap();
    std::os::unix::fs::symlink("f", tree.path().join("link")).unwrap();

    let refused = dirhash(&["--dir", tree.path().to_str().unwrap()]);
    assert!(!refused.status.success());

    let cfg_dir = tempdir().unwrap();
    let cfg = cfg_dir.path().join("dirhash.toml");
    fs::write(&cfg, "symlinks = \"follow\"\nparallel = false\n").unwrap();

    let out = dirhash(&[
        "--dir",
        tree.path().to_str().unwrap(),
        "--config",
        cfg.to_str().unwrap(),
    ]);
    assert!(out.status.success());
}

#[test]
fn test_rejects_unknown_symlink_policy() {
    let dir = tempdir().unwrap();
    for policy in ["sometimes", "FILE"] {
        let out = dirhash(&["--dir", dir.path().to_str().unwrap(), "--symlinks", policy]);
        assert!(!out.status.success());
    }
}
