//! Deterministic paths of cached and built libraries.
//!
//! A cache entry lives at
//! `<cache root>/<target>/<identity>/<CONFIGURATION>-<PLATFORM>/<archs>/lib<target>.a`
//! and the library Xcode builds lives at
//! `<BUILT_PRODUCTS_DIR>/<target>/lib<target>.a`.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::core::BuildEnvironment;
use crate::util::fs::ensure_dir;

/// File name of a target's static library.
pub fn library_name(target: &str) -> String {
    format!("lib{}.a", target)
}

/// Resolves library paths for one build configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locations {
    cache_root: PathBuf,
    built_products_dir: PathBuf,
    descriptor: String,
}

impl Locations {
    /// Paths for the build described by `env`, cached under `cache_root`.
    pub fn new(cache_root: impl Into<PathBuf>, env: &BuildEnvironment) -> Self {
        Locations {
            cache_root: cache_root.into(),
            built_products_dir: env.built_products_dir.clone(),
            descriptor: env.configuration_descriptor(),
        }
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    /// `<CONFIGURATION>-<PLATFORM>/<archs>`
    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    /// Directory of the cache entry for `target` at `identity`.
    pub fn cache_dir_for(&self, target: &str, identity: &str) -> PathBuf {
        let mut dir = self.cache_root.join(target).join(identity);
        for component in self.descriptor.split('/') {
            dir.push(component);
        }
        dir
    }

    /// Library path of the cache entry, creating its directory.
    pub fn cache_path_for(&self, target: &str, identity: &str) -> Result<PathBuf> {
        let dir = self.cache_dir_for(target, identity);
        ensure_dir(&dir)?;
        Ok(dir.join(library_name(target)))
    }

    /// Library path Xcode builds for `target`. The directory belongs to Xcode
    /// and is not created here.
    pub fn build_products_path_for(&self, target: &str) -> PathBuf {
        self.built_products_dir
            .join(target)
            .join(library_name(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn env(built_products_dir: &Path) -> BuildEnvironment {
        BuildEnvironment {
            project_file_path: PathBuf::from("/app/Pods/Pods.xcodeproj"),
            project_dir: PathBuf::from("/app/Pods"),
            configuration: "Release".to_string(),
            platform_name: "iphoneos".to_string(),
            archs: vec!["arm64".to_string(), "armv7".to_string()],
            built_products_dir: built_products_dir.to_path_buf(),
        }
    }

    #[test]
    fn test_cache_path_for_creates_directory() {
        let tmp = TempDir::new().unwrap();
        let locations = Locations::new(tmp.path().join(".apollon"), &env(Path::new("/products")));

        let path = locations.cache_path_for("MyKit", "abc1234").unwrap();
        assert_eq!(
            path,
            tmp.path()
                .join(".apollon/MyKit/abc1234/Release-iphoneos/arm64_armv7/libMyKit.a")
        );
        assert!(path.parent().unwrap().is_dir());
        assert!(!path.exists());

        // Idempotent
        assert_eq!(locations.cache_path_for("MyKit", "abc1234").unwrap(), path);
    }

    #[test]
    fn test_build_products_path_for() {
        let locations = Locations::new("/cache", &env(Path::new("/products")));
        assert_eq!(
            locations.build_products_path_for("MyKit"),
            PathBuf::from("/products/MyKit/libMyKit.a")
        );
        assert!(!Path::new("/products/MyKit").exists());
    }
}
