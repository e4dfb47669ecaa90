//! CLI integration tests for Apollon.
//!
//! These tests drive the binary the way CocoaPods and Xcode do: `--install`
//! from the Podfile directory, `--cache` and `--sync_back` with the build
//! environment of a script phase.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

const SAMPLE_PBXPROJ: &str = include_str!("fixtures/project.pbxproj");

const PODFILE_LOCK: &str = "\
PODS:
  - AFNetworking (4.0.1)
  - MyKit (1.2.0)

SPEC CHECKSUMS:
  AFNetworking: 7864c38297c79aaca1500c33288e429c3451fdce
  MyKit: 0b1f2c3d4e5f60718293a4b5c6d7e8f901234567

PODFILE CHECKSUM: 1f2a3b4c5d6e7f8091a2b3c4d5e6f70812345678

COCOAPODS: 1.15.2
";

const AFNETWORKING_CHECKSUM: &str = "7864c38297c79aaca1500c33288e429c3451fdce";

/// A Podfile directory with a generated Pods project, a build-products
/// directory, an isolated cache root and config file.
struct Workspace {
    tmp: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace { tmp };
        fs::create_dir_all(ws.xcodeproj()).unwrap();
        fs::create_dir_all(ws.built_products_dir()).unwrap();
        fs::write(ws.xcodeproj().join("project.pbxproj"), SAMPLE_PBXPROJ).unwrap();
        fs::write(ws.app_dir().join("Podfile.lock"), PODFILE_LOCK).unwrap();
        ws
    }

    fn app_dir(&self) -> PathBuf {
        self.tmp.path().join("App")
    }

    fn pods_dir(&self) -> PathBuf {
        self.app_dir().join("Pods")
    }

    fn xcodeproj(&self) -> PathBuf {
        self.pods_dir().join("Pods.xcodeproj")
    }

    fn built_products_dir(&self) -> PathBuf {
        self.tmp.path().join("Build").join("Debug-iphonesimulator")
    }

    fn cache_root(&self) -> PathBuf {
        self.tmp.path().join(".apollon")
    }

    fn pbxproj(&self) -> String {
        fs::read_to_string(self.xcodeproj().join("project.pbxproj")).unwrap()
    }

    /// An `apollon` command isolated from the user's cache and config.
    fn apollon(&self) -> Command {
        let mut cmd = Command::cargo_bin("apollon").unwrap();
        cmd.current_dir(self.app_dir())
            .env("APOLLON_HOME", self.cache_root())
            .env("APOLLON_CONFIG", self.tmp.path().join("config.toml"))
            .env_remove("RUST_LOG");
        cmd
    }

    /// An `apollon` command run as an Xcode script phase.
    fn build_phase(&self) -> Command {
        let mut cmd = self.apollon();
        cmd.current_dir(self.pods_dir())
            .env("PROJECT_FILE_PATH", self.xcodeproj())
            .env("PROJECT_DIR", self.pods_dir())
            .env("CONFIGURATION", "Debug")
            .env("PLATFORM_NAME", "iphonesimulator")
            .env("ARCHS", "x86_64 arm64")
            .env("BUILT_PRODUCTS_DIR", self.built_products_dir());
        cmd
    }

    fn write_apollonfile(&self, entries: &[(&str, bool)]) {
        let mut xml = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" \
             \"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n\
             <plist version=\"1.0\">\n<dict>\n",
        );
        for (target, enabled) in entries {
            xml.push_str(&format!(
                "\t<key>{}</key>\n\t<{}/>\n",
                target,
                if *enabled { "true" } else { "false" }
            ));
        }
        xml.push_str("</dict>\n</plist>\n");
        fs::write(self.pods_dir().join("Apollonfile"), xml).unwrap();
    }

    fn cache_entry(&self, target: &str, identity: &str) -> PathBuf {
        self.cache_root()
            .join(target)
            .join(identity)
            .join("Debug-iphonesimulator")
            .join("arm64_x86_64")
            .join(format!("lib{}.a", target))
    }

    fn build_product(&self, target: &str) -> PathBuf {
        self.built_products_dir()
            .join(target)
            .join(format!("lib{}.a", target))
    }
}

fn write_file(path: &Path, contents: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

// ============================================================================
// apollon (argument handling)
// ============================================================================

#[test]
fn test_requires_exactly_one_action() {
    let ws = Workspace::new();

    ws.apollon().assert().failure();

    ws.apollon()
        .args(["--clean", "--cache"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

// ============================================================================
// apollon --clean / --clean-old
// ============================================================================

#[test]
fn test_clean_removes_cache_root() {
    let ws = Workspace::new();
    write_file(&ws.cache_entry("AFNetworking", "abc"), b"lib");

    ws.apollon().arg("--clean").assert().success();
    assert!(!ws.cache_root().exists());

    // Nothing to remove is not an error
    ws.apollon().arg("--clean").assert().success();
}

#[test]
fn test_clean_old_under_limit() {
    let ws = Workspace::new();
    write_file(&ws.cache_entry("AFNetworking", "abc"), b"lib");

    ws.apollon()
        .arg("--clean-old")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cache size is under the limit"));
    assert!(ws.cache_entry("AFNetworking", "abc").exists());
}

#[test]
fn test_clean_old_evicts_oldest() {
    let ws = Workspace::new();
    fs::write(
        ws.tmp.path().join("config.toml"),
        "[cache]\nsize_limit = 100\n",
    )
    .unwrap();

    let old = ws.cache_entry("AFNetworking", "old");
    let new = ws.cache_entry("AFNetworking", "new");
    write_file(&old, &[0u8; 60]);
    write_file(&new, &[0u8; 60]);
    filetime::set_file_mtime(&old, filetime::FileTime::from_unix_time(1_000, 0)).unwrap();

    ws.apollon()
        .arg("--clean-old")
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted"))
        .stdout(predicate::str::contains("old"));
    assert!(!old.exists());
    assert!(new.exists());
}

// ============================================================================
// apollon --setup / --remove
// ============================================================================

#[test]
fn test_setup_without_podfile_fails() {
    let ws = Workspace::new();

    ws.apollon()
        .arg("--setup")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: No `Podfile` found"));
}

#[test]
fn test_remove_without_hook_fails() {
    let ws = Workspace::new();
    fs::write(ws.app_dir().join("Podfile"), "target 'App' do\nend\n").unwrap();

    ws.apollon()
        .arg("--remove")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Apollon is not installed!"));
}

// ============================================================================
// apollon --install
// ============================================================================

#[test]
fn test_install_wires_project() {
    let ws = Workspace::new();

    ws.apollon().arg("--install").assert().success();

    let pbxproj = ws.pbxproj();
    assert!(pbxproj.contains("[Apollon] Sync"));
    assert!(pbxproj.contains("[Apollon] Check Pods Manifest.lock"));
    assert!(pbxproj.contains("[Apollon] Collecting Libraries"));
    assert!(pbxproj.contains("PBXAggregateTarget"));
    assert!(pbxproj.contains("path = Apollonfile"));

    let mappings = ws.pods_dir().join("Source Mappings");
    assert!(mappings.join("AFNetworking.cs.json").exists());
    assert!(mappings.join("MyKit.cs.json").exists());
    assert!(!mappings.join("Pods-App.cs.json").exists());
    assert!(ws.pods_dir().join("Apollonfile").exists());

    // A second install changes nothing structural
    ws.apollon().arg("--install").assert().success();
    assert_eq!(ws.pbxproj().matches("[Apollon] Sync").count(), 1);
}

// ============================================================================
// apollon --cache / --sync_back
// ============================================================================

#[test]
fn test_cache_outside_xcode_fails() {
    let ws = Workspace::new();

    let mut cmd = ws.apollon();
    for name in [
        "PROJECT_FILE_PATH",
        "PROJECT_DIR",
        "CONFIGURATION",
        "PLATFORM_NAME",
        "ARCHS",
        "BUILT_PRODUCTS_DIR",
    ] {
        cmd.env_remove(name);
    }
    cmd.arg("--cache")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: environment variable"))
        .stderr(predicate::str::contains("is not set"));
}

#[test]
fn test_cache_rejects_unknown_target() {
    let ws = Workspace::new();
    ws.apollon().arg("--install").assert().success();
    ws.write_apollonfile(&[("AFNetworking", false), ("Alamofire", true)]);

    ws.build_phase()
        .arg("--cache")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "error: `Alamofire` Not Found in the Pods project",
        ));
}

#[test]
fn test_cache_round_trip() {
    let ws = Workspace::new();
    ws.apollon().arg("--install").assert().success();
    ws.write_apollonfile(&[("AFNetworking", true), ("MyKit", false)]);

    let cached = ws.cache_entry("AFNetworking", AFNETWORKING_CHECKSUM);
    write_file(&cached, b"cached AFNetworking");

    // First build: AFNetworking switches to the cached library
    ws.build_phase()
        .arg("--cache")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("AFNetworking: Turn on Staticization!"))
        .stderr(predicate::str::contains("error: [Apollon] Re-Run!"));

    let product = ws.build_product("AFNetworking");
    assert!(fs::symlink_metadata(&product).unwrap().file_type().is_symlink());
    assert_eq!(fs::read(&product).unwrap(), b"cached AFNetworking");
    assert!(!ws.pbxproj().contains("-DOS_OBJECT_USE_OBJC=0 -w"));

    // Second build: nothing left to change
    ws.build_phase().arg("--cache").assert().success();

    // Turning caching off restores the compile phase
    ws.write_apollonfile(&[("AFNetworking", false), ("MyKit", false)]);
    ws.build_phase()
        .arg("--cache")
        .assert()
        .failure()
        .stderr(predicate::str::contains("AFNetworking: Turn off Staticization!"));
    assert!(fs::symlink_metadata(&product).is_err());
    assert!(ws.pbxproj().contains("-DOS_OBJECT_USE_OBJC=0 -w"));

    ws.build_phase().arg("--cache").assert().success();
}

#[test]
fn test_sync_back_collects_built_library() {
    let ws = Workspace::new();
    ws.apollon().arg("--install").assert().success();
    ws.write_apollonfile(&[("AFNetworking", true), ("MyKit", false)]);
    write_file(&ws.build_product("AFNetworking"), b"fresh AFNetworking");
    write_file(&ws.build_product("MyKit"), b"fresh MyKit");

    ws.build_phase().arg("--sync_back").assert().success();

    let cached = ws.cache_entry("AFNetworking", AFNETWORKING_CHECKSUM);
    assert_eq!(fs::read(&cached).unwrap(), b"fresh AFNetworking");
    assert!(!ws.cache_root().join("MyKit").exists());
}
