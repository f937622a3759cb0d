// Test helpers for isolated testing
// Provides temporary work folders and fixtures that don't touch the system
#![allow(dead_code)]

use flate2::Compression;
use flate2::write::GzEncoder;
use opencv_recipe::{Configuration, OptionSchema, Settings};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Isolated recipe work folder using temporary directories
/// Automatically cleaned up when dropped (RAII pattern)
///
/// # Example
/// ```
/// use test_helpers::TestEnvironment;
///
/// let env = TestEnvironment::new();
/// // Use env.root, env.package, env.cache
/// // Automatically cleaned up when env goes out of scope
/// ```
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub root: PathBuf,
    pub package: PathBuf,
    pub cache: PathBuf,
}

impl TestEnvironment {
    /// Create a new isolated work folder
    ///
    /// - temp/
    ///   - work/      (sources and build folders)
    ///   - package/   (install prefix)
    ///   - cache/     (downloaded archives)
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path().join("work");
        let package = temp_dir.path().join("package");
        let cache = temp_dir.path().join("cache");

        fs::create_dir_all(&root).unwrap();
        fs::create_dir_all(&package).unwrap();
        fs::create_dir_all(&cache).unwrap();

        Self {
            temp_dir,
            root,
            package,
            cache,
        }
    }

    pub fn layout(&self) -> opencv_recipe::Layout {
        opencv_recipe::Layout::new(&self.root, &self.package)
    }
}

impl Default for TestEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

/// Write a tar.gz whose entries all live under `top_dir`
pub fn write_tar_gz(archive: &Path, top_dir: &str, files: &[(&str, &str)]) {
    let file = fs::File::create(archive).unwrap();
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));

    for (path, contents) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, format!("{}/{}", top_dir, path), contents.as_bytes())
            .unwrap();
    }

    builder.into_inner().unwrap().finish().unwrap();
}

/// Settings map for a native Linux/gcc build, with overrides
pub fn settings(overrides: &[(&str, &str)]) -> BTreeMap<String, String> {
    let mut map: BTreeMap<String, String> = [
        ("os", "Linux"),
        ("os_build", "Linux"),
        ("compiler", "gcc"),
        ("compiler.version", "9"),
        ("arch", "x86_64"),
        ("arch_build", "x86_64"),
        ("build_type", "Release"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (k, v) in overrides {
        map.insert(k.to_string(), v.to_string());
    }
    map
}

pub fn options(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Resolve a configuration, returning the error for negative tests
pub fn try_resolve(
    settings_overrides: &[(&str, &str)],
    option_pairs: &[(&str, &str)],
) -> opencv_recipe::Result<Configuration> {
    Configuration::resolve(
        &OptionSchema::opencv(),
        Settings::from_map(&settings(settings_overrides))?,
        &options(option_pairs),
    )
}

pub fn resolve(settings_overrides: &[(&str, &str)], option_pairs: &[(&str, &str)]) -> Configuration {
    try_resolve(settings_overrides, option_pairs).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_creates_directories() {
        let env = TestEnvironment::new();

        assert!(env.root.exists());
        assert!(env.package.exists());
        assert!(env.cache.exists());
    }

    #[test]
    fn test_environment_cleanup() {
        let root = {
            let env = TestEnvironment::new();
            env.root.clone()
        };

        // After env is dropped, temp directory should be cleaned up
        assert!(!root.exists());
    }

    #[test]
    fn test_write_tar_gz() {
        let env = TestEnvironment::new();
        let archive = env.cache.join("fixture.tar.gz");
        write_tar_gz(&archive, "top", &[("a.txt", "hello")]);
        assert!(fs::metadata(&archive).unwrap().len() > 0);
    }
}
