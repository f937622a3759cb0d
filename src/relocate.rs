//! Package relocation - make installed CMake config files path-independent
//!
//! OpenCV's install step writes the absolute package folder into its
//! `*.cmake` config files. Those paths are replaced with
//! `${CONAN_OPENCV_ROOT}` so the package can be moved after it is built.

use crate::error::Result;
use anyhow::Context;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Placeholder written in place of the package folder
pub const ROOT_PLACEHOLDER: &str = "${CONAN_OPENCV_ROOT}";

/// Relocate every CMake config file below the package folder
///
/// Returns the files that were rewritten.
pub fn relocate_package(package_folder: &Path) -> Result<Vec<PathBuf>> {
    let folder = package_folder
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid package folder path"))?;

    let files = find_cmake_files(package_folder);

    // Each file is rewritten independently
    let results: Vec<Result<Option<PathBuf>>> = files
        .par_iter()
        .map(|file| relocate_file(file, folder))
        .collect();

    let mut relocated = Vec::new();
    for result in results {
        if let Some(path) = result? {
            relocated.push(path);
        }
    }

    tracing::debug!(
        "Relocated {} of {} CMake files in {}",
        relocated.len(),
        files.len(),
        package_folder.display()
    );
    Ok(relocated)
}

/// Find all `*.cmake` files in a directory
fn find_cmake_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .follow_links(false)
        .max_open(64)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|path| is_cmake_file(path))
        .collect()
}

fn is_cmake_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "cmake")
}

/// Rewrite one file, returning its path when something changed
fn relocate_file(path: &Path, folder: &str) -> Result<Option<PathBuf>> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;

    if !contents.contains(folder) {
        return Ok(None);
    }

    fs::write(path, contents.replace(folder, ROOT_PLACEHOLDER))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(Some(path.to_path_buf()))
}
