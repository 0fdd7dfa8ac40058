use std::fs;

use tempfile::TempDir;
use trellis_core::manifest::Manifest;
use trellis_core::registry::{entry_path, RegistryEntry, VersionEntry};

#[test]
fn test_parse_minimal_manifest() {
    let manifest = Manifest::parse_toml(
        r#"
[package]
name = "app"
version = "0.1.0"
"#,
    )
    .unwrap();
    assert_eq!(manifest.package.name, "app");
    assert_eq!(manifest.package.version, "0.1.0");
    assert!(manifest.dependencies.is_empty());
}

#[test]
fn test_parse_manifest_dependencies() {
    let manifest = Manifest::parse_toml(
        r#"
[package]
name = "app"
version = "0.1.0"
description = "demo"

[dependencies]
a = "*"
b = ">=1.0.0, <2.0.0"
"#,
    )
    .unwrap();
    assert_eq!(manifest.package.description.as_deref(), Some("demo"));
    assert_eq!(manifest.dependencies.len(), 2);
    assert_eq!(manifest.dependencies["b"], ">=1.0.0, <2.0.0");
}

#[test]
fn test_manifest_missing_package_fails() {
    let err = Manifest::parse_toml("[dependencies]\na = \"*\"\n").unwrap_err();
    assert!(err.to_string().contains("Manifest error"), "got: {err}");
}

#[test]
fn test_manifest_empty_name_fails() {
    let err = Manifest::parse_toml("[package]\nname = \" \"\nversion = \"0.1.0\"\n").unwrap_err();
    assert!(err.to_string().contains("must not be empty"));
}

#[test]
fn test_manifest_from_path() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join(trellis_core::MANIFEST_FILE);
    fs::write(&path, "[package]\nname = \"app\"\nversion = \"1.0.0\"\n").unwrap();
    let manifest = Manifest::from_path(&path).unwrap();
    assert_eq!(manifest.package.name, "app");
}

#[test]
fn test_manifest_from_missing_path() {
    let tmp = TempDir::new().unwrap();
    let err = Manifest::from_path(&tmp.path().join("Trellis.toml")).unwrap_err();
    assert!(err.to_string().contains("Could not read"));
}

#[test]
fn test_parse_registry_entry() {
    let entry = RegistryEntry::parse_toml(
        r#"
[versions."1.0.0"]

[versions."2.0.0".dependencies]
b = "<2.0.0"
"#,
    )
    .unwrap();
    assert_eq!(entry.versions.len(), 2);
    assert!(entry.versions["1.0.0"].dependencies.is_empty());
    assert_eq!(entry.versions["2.0.0"].dependencies["b"], "<2.0.0");
}

#[test]
fn test_registry_entry_serializes_back() {
    let mut entry = RegistryEntry::default();
    let mut v = VersionEntry::default();
    v.dependencies.insert("c".to_string(), "^1".to_string());
    entry.versions.insert("0.3.0".to_string(), v);

    let text = entry.to_string_pretty().unwrap();
    let parsed = RegistryEntry::parse_toml(&text).unwrap();
    assert_eq!(parsed.versions["0.3.0"].dependencies["c"], "^1");
}

#[test]
fn test_entry_path() {
    let path = entry_path(std::path::Path::new("/registry"), "left-pad");
    assert_eq!(path, Some(std::path::PathBuf::from("/registry/left-pad.toml")));
}

#[test]
fn test_entry_path_rejects_names_leaving_registry() {
    let root = std::path::Path::new("/registry");
    for name in ["../x", "..", "a/b", "a\\b", "c:x", ""] {
        assert_eq!(entry_path(root, name), None, "{name:?}");
    }
}
