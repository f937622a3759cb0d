//! Working folder layout for one recipe run

use serde::Serialize;
use std::path::{Path, PathBuf};

const SOURCE_SUBFOLDER: &str = "source_subfolder";
const BUILD_SUBFOLDER: &str = "build_subfolder";
const CONTRIB_SUBFOLDER: &str = "contrib";

/// Folders used by the source, build and package steps
///
/// ```text
/// <root>/
///   source_subfolder/   upstream OpenCV sources
///   contrib/            opencv_contrib sources (when enabled)
///   build_subfolder/    CMake binary dir
/// <package>/            install prefix
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Layout {
    pub root: PathBuf,
    pub package_folder: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>, package_folder: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            package_folder: package_folder.into(),
        }
    }

    pub fn source_folder(&self) -> PathBuf {
        self.root.join(SOURCE_SUBFOLDER)
    }

    pub fn build_folder(&self) -> PathBuf {
        self.root.join(BUILD_SUBFOLDER)
    }

    pub fn contrib_folder(&self) -> PathBuf {
        self.root.join(CONTRIB_SUBFOLDER)
    }

    /// Directory handed to `OPENCV_EXTRA_MODULES_PATH`
    pub fn contrib_modules(&self) -> PathBuf {
        self.contrib_folder().join("modules")
    }

    pub fn package_path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.package_folder.join(relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folders() {
        let layout = Layout::new("/work", "/work/package");
        assert_eq!(layout.source_folder(), PathBuf::from("/work/source_subfolder"));
        assert_eq!(layout.build_folder(), PathBuf::from("/work/build_subfolder"));
        assert_eq!(layout.contrib_modules(), PathBuf::from("/work/contrib/modules"));
        assert_eq!(
            layout.package_path("licenses"),
            PathBuf::from("/work/package/licenses")
        );
    }
}
