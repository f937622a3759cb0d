//! Artifact naming: which libraries the package provides and where.
//!
//! Names are a pure function of the version and the configuration. The same
//! inputs always give the same ordered list. OpenCV only appends a debug
//! postfix for MSVC, where Debug and Release share one install folder.
//!
//! ```text
//! Windows, Release:  opencv_core401.lib     (x64/vc15/staticlib)
//! Windows, Debug:    opencv_core401d.lib
//! Linux, Release:    libopencv_core.a       (lib, lib/opencv4/3rdparty)
//! Linux, Debug:      libopencv_core.a
//! ```

use crate::configure::Configuration;
use crate::settings::{BuildType, Compiler, Os};
use serde::Serialize;

/// Main OpenCV modules, in link order
pub const MAIN_MODULES: &[&str] = &[
    "gapi",
    "stitching",
    "photo",
    "video",
    "ml",
    "calib3d",
    "features2d",
    "highgui",
    "videoio",
    "flann",
    "imgcodecs",
    "objdetect",
    "imgproc",
    "core",
];

/// Contrib modules, in link order. `freetype` and `sfm` are opt-in.
pub const CONTRIB_MODULES: &[&str] = &[
    "aruco",
    "bgsegm",
    "bioinspired",
    "ccalib",
    "datasets",
    "dpm",
    "face",
    "freetype",
    "fuzzy",
    "hfs",
    "img_hash",
    "line_descriptor",
    "optflow",
    "phase_unwrapping",
    "plot",
    "reg",
    "rgbd",
    "saliency",
    "sfm",
    "shape",
    "stereo",
    "structured_light",
    "superres",
    "surface_matching",
    "tracking",
    "videostab",
    "xfeatures2d",
    "ximgproc",
    "xobjdetect",
    "xphoto",
];

/// CUDA contrib modules, in link order. Built when both contrib and cuda are on.
pub const CUDA_CONTRIB_MODULES: &[&str] = &[
    "cudaoptflow",
    "cudalegacy",
    "cudaobjdetect",
    "cudastereo",
    "cudabgsegm",
    "cudafeatures2d",
    "cudacodec",
    "cudaimgproc",
    "cudafilters",
    "cudawarping",
    "cudaarithm",
    "cudev",
];

/// Postfix of MSVC debug library names
pub const DEBUG_POSTFIX: &str = "d";

/// Graph API runtime, linked by static builds
const ADE_LIBRARY: &str = "ade";

/// Kind of file a library is shipped as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LinkKind {
    Static,
    Shared,
}

/// Everything the package exposes for linking
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactDescriptor {
    /// OpenCV modules, in link order
    pub modules: Vec<String>,
    /// Version fragment in library names (`401` on Windows)
    pub version_tag: String,
    /// Postfix for the build configuration (`d` for Debug)
    pub postfix: String,
    /// Link names, in link order (`opencv_core401d`, `ade`)
    pub libs: Vec<String>,
    pub link_kind: LinkKind,
    pub include_dirs: Vec<String>,
    pub lib_dirs: Vec<String>,
    pub bin_dirs: Vec<String>,
}

impl ArtifactDescriptor {
    /// On-disk file names for the libraries, for the target platform
    pub fn file_names(&self, os: &Os) -> Vec<String> {
        self.libs
            .iter()
            .map(|lib| library_file_name(lib, os, self.link_kind))
            .collect()
    }
}

/// Compute the artifacts of a configuration
pub fn describe(version: &str, config: &Configuration) -> ArtifactDescriptor {
    let settings = &config.settings;
    let opts = &config.options;

    let mut modules: Vec<String> = Vec::new();
    if let Some(contrib) = opts.contrib {
        modules.extend(
            CONTRIB_MODULES
                .iter()
                .filter(|m| match **m {
                    "freetype" => contrib.freetype,
                    "sfm" => contrib.sfm,
                    _ => true,
                })
                .map(|m| m.to_string()),
        );
        if opts.cuda.is_some() {
            modules.extend(CUDA_CONTRIB_MODULES.iter().map(|m| m.to_string()));
        }
    }
    modules.extend(MAIN_MODULES.iter().map(|m| m.to_string()));

    let version_tag = if settings.os == Os::Windows {
        version.replace('.', "")
    } else {
        String::new()
    };
    let msvc_debug =
        settings.compiler.is_visual_studio() && settings.build_type == BuildType::Debug;
    let postfix = if msvc_debug {
        DEBUG_POSTFIX.to_string()
    } else {
        String::new()
    };

    let mut libs: Vec<String> = modules
        .iter()
        .map(|m| format!("opencv_{}{}{}", m, version_tag, postfix))
        .collect();
    if !opts.shared {
        libs.push(ADE_LIBRARY.to_string());
    }

    let mut include_dirs = vec!["include".to_string()];
    let mut lib_dirs = vec!["lib".to_string()];
    let mut bin_dirs = vec!["bin".to_string()];

    if let Compiler::VisualStudio { version, .. } = &settings.compiler
        && let Some(arch) = settings.arch.msvc_folder()
    {
        let vc = format!("vc{}", version.major());
        bin_dirs.push(format!("{}/{}/bin", arch, vc));
        let libdir = if opts.shared { "lib" } else { "staticlib" };
        lib_dirs.push(format!("{}/{}/{}", arch, vc, libdir));
    }

    if matches!(settings.os, Os::Android { .. }) && !opts.shared {
        include_dirs.push("sdk/native/jni/include".to_string());
        lib_dirs.push("sdk/native/staticlibs".to_string());
    } else {
        include_dirs.push("include/opencv4".to_string());
        lib_dirs.push("lib/opencv4/3rdparty".to_string());
    }

    ArtifactDescriptor {
        modules,
        version_tag,
        postfix,
        libs,
        link_kind: if opts.shared {
            LinkKind::Shared
        } else {
            LinkKind::Static
        },
        include_dirs,
        lib_dirs,
        bin_dirs,
    }
}

/// File name of a library for a platform
pub fn library_file_name(lib: &str, os: &Os, kind: LinkKind) -> String {
    match (os, kind) {
        (Os::Windows, LinkKind::Static) => format!("{}.lib", lib),
        (Os::Windows, LinkKind::Shared) => format!("{}.dll", lib),
        (Os::Macos | Os::Ios, LinkKind::Shared) => format!("lib{}.dylib", lib),
        (Os::Linux | Os::Android { .. }, LinkKind::Shared) => format!("lib{}.so", lib),
        (_, LinkKind::Static) => format!("lib{}.a", lib),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::OptionSchema;
    use crate::settings::Settings;
    use std::collections::BTreeMap;

    fn resolve(settings: &[(&str, &str)], options: &[(&str, &str)]) -> Configuration {
        let mut map: BTreeMap<String, String> = [
            ("os", "Linux"),
            ("compiler", "gcc"),
            ("compiler.version", "9"),
            ("arch", "x86_64"),
            ("build_type", "Release"),
            ("os_build", "Linux"),
            ("arch_build", "x86_64"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        for (k, v) in settings {
            map.insert(k.to_string(), v.to_string());
        }
        let options = options
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Configuration::resolve(
            &OptionSchema::opencv(),
            Settings::from_map(&map).unwrap(),
            &options,
        )
        .unwrap()
    }

    fn windows(build_type: &str) -> Vec<(&'static str, String)> {
        vec![
            ("os", "Windows".to_string()),
            ("os_build", "Windows".to_string()),
            ("compiler", "Visual Studio".to_string()),
            ("compiler.version", "15".to_string()),
            ("build_type", build_type.to_string()),
        ]
    }

    fn resolve_owned(settings: &[(&'static str, String)]) -> Configuration {
        let borrowed: Vec<(&str, &str)> =
            settings.iter().map(|(k, v)| (*k, v.as_str())).collect();
        resolve(&borrowed, &[])
    }

    #[test]
    fn test_linux_release_names() {
        let artifacts = describe("4.0.1", &resolve(&[], &[]));
        assert_eq!(artifacts.modules.len(), MAIN_MODULES.len());
        assert_eq!(artifacts.libs.first().map(String::as_str), Some("opencv_gapi"));
        assert_eq!(artifacts.libs.last().map(String::as_str), Some("ade"));
        assert!(artifacts.libs.contains(&"opencv_core".to_string()));
        assert_eq!(artifacts.include_dirs, vec!["include", "include/opencv4"]);
        assert_eq!(artifacts.lib_dirs, vec!["lib", "lib/opencv4/3rdparty"]);
        assert_eq!(artifacts.bin_dirs, vec!["bin"]);
    }

    #[test]
    fn test_windows_version_and_debug_postfix() {
        let release = describe("4.0.1", &resolve_owned(&windows("Release")));
        let debug = describe("4.0.1", &resolve_owned(&windows("Debug")));
        assert!(release.libs.contains(&"opencv_core401".to_string()));
        assert!(debug.libs.contains(&"opencv_core401d".to_string()));
        assert_eq!(release.bin_dirs, vec!["bin", "x64/vc15/bin"]);
        assert_eq!(release.lib_dirs[1], "x64/vc15/staticlib");
    }

    #[test]
    fn test_visual_studio_debug_never_collides_with_release() {
        let release = describe("4.0.1", &resolve_owned(&windows("Release")));
        let debug = describe("4.0.1", &resolve_owned(&windows("Debug")));
        for lib in debug.libs.iter().filter(|l| l.starts_with("opencv_")) {
            assert!(!release.libs.contains(lib), "{} collides", lib);
        }
    }

    #[test]
    fn test_linux_debug_has_no_postfix() {
        let debug = describe("4.0.1", &resolve(&[("build_type", "Debug")], &[]));
        assert!(debug.postfix.is_empty());
        assert!(debug.libs.contains(&"opencv_core".to_string()));
        assert!(!debug.libs.contains(&"opencv_cored".to_string()));
    }

    #[test]
    fn test_mingw_debug_has_no_postfix() {
        let debug = describe(
            "4.0.1",
            &resolve(
                &[
                    ("os", "Windows"),
                    ("os_build", "Windows"),
                    ("compiler", "gcc"),
                    ("compiler.version", "8"),
                    ("build_type", "Debug"),
                ],
                &[],
            ),
        );
        assert!(debug.libs.contains(&"opencv_core401".to_string()));
    }

    #[test]
    fn test_visual_studio_arm_dirs() {
        let mut settings = windows("Release");
        settings.push(("arch", "armv8".to_string()));
        let artifacts = describe("4.0.1", &resolve_owned(&settings));
        assert_eq!(artifacts.bin_dirs, vec!["bin", "ARM64/vc15/bin"]);
        assert_eq!(artifacts.lib_dirs[1], "ARM64/vc15/staticlib");
    }

    #[test]
    fn test_names_are_idempotent() {
        let config = resolve(
            &[],
            &[("contrib", "True"), ("contrib_sfm", "True"), ("eigen", "True")],
        );
        assert_eq!(describe("4.0.1", &config), describe("4.0.1", &config));
    }

    #[test]
    fn test_contrib_modules_follow_sub_options() {
        let artifacts = describe("4.0.1", &resolve(&[], &[("contrib", "True")]));
        assert_eq!(artifacts.modules.first().map(String::as_str), Some("aruco"));
        assert!(!artifacts.modules.contains(&"freetype".to_string()));
        assert!(!artifacts.modules.contains(&"sfm".to_string()));

        let artifacts = describe(
            "4.0.1",
            &resolve(&[], &[("contrib", "True"), ("contrib_freetype", "True")]),
        );
        assert!(artifacts.modules.contains(&"freetype".to_string()));
    }

    #[test]
    fn test_cuda_contrib_modules() {
        let artifacts = describe(
            "4.0.1",
            &resolve(&[], &[("contrib", "True"), ("cuda", "True")]),
        );
        let cuda: Vec<&String> = artifacts
            .modules
            .iter()
            .filter(|m| m.starts_with("cud"))
            .collect();
        assert_eq!(cuda.len(), CUDA_CONTRIB_MODULES.len());
        assert!(artifacts.libs.contains(&"opencv_cudaarithm".to_string()));
        assert!(artifacts.libs.contains(&"opencv_cudev".to_string()));

        // cuda modules live in contrib
        let artifacts = describe("4.0.1", &resolve(&[], &[("cuda", "True")]));
        assert!(artifacts.modules.iter().all(|m| !m.starts_with("cuda")));
    }

    #[test]
    fn test_shared_build_has_no_ade() {
        let artifacts = describe("4.0.1", &resolve(&[], &[("shared", "True")]));
        assert!(!artifacts.libs.contains(&"ade".to_string()));
        assert_eq!(artifacts.link_kind, LinkKind::Shared);
        assert_eq!(
            artifacts.file_names(&Os::Linux)[0],
            "libopencv_gapi.so".to_string()
        );
    }

    #[test]
    fn test_android_static_layout() {
        let artifacts = describe(
            "4.0.1",
            &resolve(
                &[
                    ("os", "Android"),
                    ("os.api_level", "21"),
                    ("compiler", "clang"),
                    ("compiler.version", "8"),
                    ("arch", "armv8"),
                ],
                &[],
            ),
        );
        assert_eq!(artifacts.include_dirs, vec!["include", "sdk/native/jni/include"]);
        assert_eq!(artifacts.lib_dirs, vec!["lib", "sdk/native/staticlibs"]);
    }

    #[test]
    fn test_library_file_names() {
        assert_eq!(
            library_file_name("opencv_core401", &Os::Windows, LinkKind::Static),
            "opencv_core401.lib"
        );
        assert_eq!(
            library_file_name("opencv_core", &Os::Macos, LinkKind::Shared),
            "libopencv_core.dylib"
        );
        assert_eq!(
            library_file_name("opencv_core", &Os::Ios, LinkKind::Static),
            "libopencv_core.a"
        );
    }
}
