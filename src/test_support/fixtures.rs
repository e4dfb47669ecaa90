//! On-disk fixtures for sync and collect tests.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::cache::library_name;
use crate::core::{
    ApollonConfig, BuildEnvironment, BuildFile, LockData, LockEntry, SourceMappings,
};
use crate::ops::RunContext;

/// The sample Pods project used across tests.
pub const SAMPLE_PBXPROJ: &str = include_str!("../../tests/fixtures/project.pbxproj");

/// A Podfile directory with its Pods project, a build-products directory and
/// a cache root, all inside one temp dir:
///
/// ```text
/// <tmp>/App/Podfile.lock
/// <tmp>/App/Pods/                  PROJECT_DIR
/// <tmp>/DevPods/<name>/            dev pod sources
/// <tmp>/Build/Debug-iphonesimulator BUILT_PRODUCTS_DIR
/// <tmp>/.apollon                   cache root
/// ```
pub struct SyncFixture {
    pub tmp: TempDir,
    pub env: BuildEnvironment,
    pub cache_root: PathBuf,
    lock: LockData,
    config: ApollonConfig,
}

impl SyncFixture {
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let project_dir = tmp.path().join("App").join("Pods");
        let built_products_dir = tmp.path().join("Build").join("Debug-iphonesimulator");
        fs::create_dir_all(&project_dir).unwrap();
        fs::create_dir_all(&built_products_dir).unwrap();

        let env = BuildEnvironment {
            project_file_path: project_dir.join("Pods.xcodeproj"),
            project_dir,
            configuration: "Debug".to_string(),
            platform_name: "iphonesimulator".to_string(),
            archs: vec!["arm64".to_string(), "x86_64".to_string()],
            built_products_dir,
        };

        SyncFixture {
            cache_root: tmp.path().join(".apollon"),
            tmp,
            env,
            lock: LockData::default(),
            config: ApollonConfig::new(),
        }
    }

    pub fn root(&self) -> &Path {
        self.tmp.path()
    }

    pub fn config(&self) -> &ApollonConfig {
        &self.config
    }

    /// Record a released pod in the lock data.
    pub fn released_pod(&mut self, name: &str, checksum: &str) -> &mut Self {
        self.lock.insert(
            name,
            LockEntry {
                checksum: Some(checksum.to_string()),
                external_source_path: None,
            },
        );
        self
    }

    /// Record a `:path` pod and create its source tree. Returns the source
    /// directory.
    pub fn dev_pod(&mut self, name: &str) -> PathBuf {
        let dir = self.root().join("DevPods").join(name);
        fs::create_dir_all(dir.join("Classes")).unwrap();
        fs::write(dir.join("Classes").join(format!("{}.h", name)), "").unwrap();
        fs::write(dir.join("Classes").join(format!("{}.m", name)), "").unwrap();
        self.lock.insert(
            name,
            LockEntry {
                checksum: Some(format!("{}-checksum", name)),
                external_source_path: Some(PathBuf::from("../DevPods").join(name)),
            },
        );
        dir
    }

    pub fn configure(&mut self, target: &str, static_enabled: bool) -> &mut Self {
        self.config.set(target, static_enabled);
        self
    }

    pub fn write_mapping(&self, target: &str, files: &[BuildFile]) {
        SourceMappings::in_project_dir(&self.env.project_dir)
            .save(target, files)
            .unwrap();
    }

    /// Put a library into the cache for `target` at `identity`.
    pub fn seed_cache(&self, target: &str, identity: &str) -> PathBuf {
        let path = self
            .context()
            .locations()
            .cache_path_for(target, identity)
            .unwrap();
        fs::write(&path, format!("!<arch>\n{}@{}\n", target, identity)).unwrap();
        path
    }

    pub fn build_products_path(&self, target: &str) -> PathBuf {
        self.env
            .built_products_dir
            .join(target)
            .join(library_name(target))
    }

    /// Write a freshly compiled library into the build products directory.
    pub fn write_built_library(&self, target: &str) -> PathBuf {
        let path = self.build_products_path(target);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, format!("!<arch>\n{} built\n", target)).unwrap();
        path
    }

    pub fn context(&self) -> RunContext {
        RunContext::new(
            self.env.clone(),
            &self.cache_root,
            self.lock.clone(),
            self.config.clone(),
        )
    }
}

impl Default for SyncFixture {
    fn default() -> Self {
        Self::new()
    }
}
