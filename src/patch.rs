//! Source patches applied before configuring.
//!
//! Two kinds of patch exist:
//! - clang 3.9 miscompiles `imgwarp.cpp`, which must be built with `-O0`
//!   (opencv/opencv#8010);
//! - OpenCV's OpenEXR finder hard-codes `C:/Deploy` search roots and only
//!   knows the unversioned library names. The roots are stripped so
//!   `OPENEXR_ROOT` wins, and every name variant a packaged OpenEXR may use
//!   is accepted.

use crate::configure::Configuration;
use crate::error::{RecipeError, Result};
use crate::requirements::Dependency;
use crate::settings::Compiler;
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};

const IMGPROC_CMAKELISTS: &str = "modules/imgproc/CMakeLists.txt";
const FIND_OPENEXR: &str = "cmake/OpenCVFindOpenEXR.cmake";
const OPENEXR_LIBRARIES: &[&str] = &["Half", "Iex", "Imath", "IlmImf", "IlmThread"];

/// A literal search-and-replace in one source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePatch {
    /// Path relative to the source folder
    pub path: PathBuf,
    pub search: String,
    pub replace: String,
}

impl FilePatch {
    fn new(path: &str, search: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            path: PathBuf::from(path),
            search: search.into(),
            replace: replace.into(),
        }
    }
}

/// Patches needed for a configuration
pub fn patches(config: &Configuration) -> Vec<FilePatch> {
    let mut patches = Vec::new();

    if let Compiler::Clang { version, .. } = &config.settings.compiler
        && version.major() == 3
        && version.minor() == 9
    {
        let define = "ocv_define_module(imgproc opencv_core WRAP java python js)";
        patches.push(FilePatch::new(
            IMGPROC_CMAKELISTS,
            define,
            format!(
                "{}\nset_source_files_properties(${{CMAKE_CURRENT_LIST_DIR}}/src/imgwarp.cpp \
                 PROPERTIES COMPILE_FLAGS \"-O0\")",
                define
            ),
        ));
    }

    if config.options.openexr {
        for search in [
            r#"SET(OPENEXR_ROOT "C:/Deploy" CACHE STRING "Path to the OpenEXR \"Deploy\" folder")"#,
            r#"set(OPENEXR_ROOT "")"#,
            "SET(OPENEXR_LIBSEARCH_SUFFIXES x64/Release x64 x64/Debug)",
            "SET(OPENEXR_LIBSEARCH_SUFFIXES Win32/Release Win32 Win32/Debug)",
        ] {
            patches.push(FilePatch::new(FIND_OPENEXR, search, ""));
        }

        let version = Dependency::Openexr.version();
        for lib in OPENEXR_LIBRARIES {
            patches.push(FilePatch::new(
                FIND_OPENEXR,
                format!("NAMES {}", lib),
                format!("NAMES {}", openexr_library_names(lib, version)),
            ));
        }
    }

    patches
}

/// Every name an OpenEXR library may be installed under
///
/// Depends on namespace versioning (`Half-2_3`), static (`_s`) and debug
/// (`_d`) builds.
pub fn openexr_library_names(name: &str, version: &str) -> String {
    let mut parts = version.split('.');
    let major = parts.next().unwrap_or("0");
    let minor = parts.next().unwrap_or("0");
    let versioned = format!("{}-{}_{}", name, major, minor);

    [versioned.as_str(), name]
        .iter()
        .flat_map(|base| {
            ["", "_s", "_d", "_s_d"]
                .iter()
                .map(move |suffix| format!("{}{}", base, suffix))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Apply patches to a source tree
///
/// A search string that is missing from its file is an error.
pub fn apply(source_folder: &Path, patches: &[FilePatch]) -> Result<()> {
    for patch in patches {
        let path = source_folder.join(&patch.path);
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        if !contents.contains(&patch.search) {
            return Err(RecipeError::PatchNotApplied {
                path: path.display().to_string(),
                pattern: patch.search.clone(),
            });
        }

        fs::write(&path, contents.replace(&patch.search, &patch.replace))
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::debug!("Patched {}", patch.path.display());
    }
    Ok(())
}
