use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

#[allow(deprecated)]
fn trellis_cmd(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("trellis").unwrap();
    cmd.env("TRELLIS_HOME", home).env_remove("RUST_LOG");
    cmd
}

/// A project directory, a registry directory and an empty Trellis home.
struct Fixture {
    tmp: TempDir,
}

impl Fixture {
    fn new(dependencies: &str) -> Self {
        let tmp = TempDir::new().unwrap();
        let project = tmp.path().join("project");
        let registry = tmp.path().join("registry");
        let home = tmp.path().join("home");
        fs::create_dir_all(&project).unwrap();
        fs::create_dir_all(&registry).unwrap();
        fs::create_dir_all(&home).unwrap();

        fs::write(
            project.join("Trellis.toml"),
            format!(
                "[package]\nname = \"app\"\nversion = \"0.1.0\"\n\n[dependencies]\n{dependencies}"
            ),
        )
        .unwrap();
        fs::write(
            registry.join("a.toml"),
            r#"
[versions."1.0.0"]
[versions."1.1.0"]
[versions."2.0.0".dependencies]
b = "<2.0.0"
"#,
        )
        .unwrap();
        fs::write(
            registry.join("b.toml"),
            r#"
[versions."1.0.0"]
[versions."1.5.0"]
[versions."2.0.0"]
"#,
        )
        .unwrap();
        Self { tmp }
    }

    fn project(&self) -> std::path::PathBuf {
        self.tmp.path().join("project")
    }

    fn registry(&self) -> std::path::PathBuf {
        self.tmp.path().join("registry")
    }

    fn home(&self) -> std::path::PathBuf {
        self.tmp.path().join("home")
    }

    fn cmd(&self) -> Command {
        let mut cmd = trellis_cmd(&self.home());
        cmd.current_dir(self.project());
        cmd
    }
}

#[test]
fn test_resolve_prints_chosen_versions() {
    let fx = Fixture::new("a = \"*\"\n");

    fx.cmd()
        .args(["resolve", "--registry"])
        .arg(fx.registry())
        .assert()
        .success()
        .stdout("a 2.0.0\nb 1.5.0\n")
        .stderr(predicate::str::contains("Fetching a"))
        .stderr(predicate::str::contains("Fetching b"));
}

#[test]
fn test_resolve_latest_only_policy() {
    let fx = Fixture::new("a = \"*\"\n");

    fx.cmd()
        .args(["resolve", "--policy", "latest-only", "--registry"])
        .arg(fx.registry())
        .assert()
        .success()
        .stdout("a 2.0.0\nb 2.0.0\n");
}

#[test]
fn test_resolve_uses_config_registry_and_policy() {
    let fx = Fixture::new("a = \"*\"\n");
    fs::write(
        fx.home().join("config.toml"),
        format!(
            "[registry]\npath = {:?}\n\n[resolve]\npolicy = \"latest-only\"\n",
            fx.registry().display().to_string()
        ),
    )
    .unwrap();

    fx.cmd()
        .arg("resolve")
        .assert()
        .success()
        .stdout(predicate::str::contains("b 2.0.0"));
}

#[test]
fn test_resolve_with_explicit_manifest_path() {
    let fx = Fixture::new("a = \"<2\"\n");

    trellis_cmd(&fx.home())
        .current_dir(fx.tmp.path())
        .arg("resolve")
        .arg("--manifest")
        .arg(fx.project().join("Trellis.toml"))
        .arg("--registry")
        .arg(fx.registry())
        .assert()
        .success()
        .stdout("a 1.1.0\n");
}

#[test]
fn test_resolve_without_dependencies_prints_nothing() {
    let fx = Fixture::new("");

    fx.cmd()
        .args(["resolve", "--registry"])
        .arg(fx.registry())
        .assert()
        .success()
        .stdout("")
        .stderr(predicate::str::contains("no dependencies declared"))
        .stderr(predicate::str::contains("Fetching").not());
}

#[test]
fn test_resolve_without_manifest_fails() {
    let tmp = TempDir::new().unwrap();

    trellis_cmd(tmp.path())
        .current_dir(tmp.path())
        .arg("resolve")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not find Trellis.toml"));
}

#[test]
fn test_resolve_unknown_policy_fails() {
    let fx = Fixture::new("a = \"*\"\n");

    fx.cmd()
        .args(["resolve", "--policy", "newest", "--registry"])
        .arg(fx.registry())
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown resolve policy"));
}

#[test]
fn test_resolve_unsatisfiable_fails() {
    let fx = Fixture::new("b = \">=3.0.0\"\n");

    fx.cmd()
        .args(["resolve", "--registry"])
        .arg(fx.registry())
        .assert()
        .failure()
        .stdout("")
        .stderr(predicate::str::contains("Dependency resolution failed"));
}

#[test]
fn test_resolve_missing_package_fails() {
    let fx = Fixture::new("ghost = \"^1\"\n");

    fx.cmd()
        .args(["resolve", "--registry"])
        .arg(fx.registry())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Registry error"));
}

#[test]
fn test_resolve_invalid_requirement_fails() {
    let fx = Fixture::new("a = \">=x\"\n");

    fx.cmd()
        .args(["resolve", "--registry"])
        .arg(fx.registry())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Manifest error"));
}
