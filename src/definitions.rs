//! Build flag translation: configuration to CMake definitions.
//!
//! Every vendored third-party build inside OpenCV is switched off. Libraries
//! come only from declared dependencies, so each one has a single source.
//! Platform-specific flags are derived from the settings.

use crate::configure::{Configuration, GtkVersion, ParallelBackend};
use crate::layout::Layout;
use crate::requirements::Dependency;
use crate::settings::{Arch, Compiler, Os};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Third-party components OpenCV can build from its own `3rdparty/` tree
const VENDORED_BUILDS: &[&str] = &[
    "BUILD_ZLIB",
    "BUILD_TIFF",
    "BUILD_JASPER",
    "BUILD_JPEG",
    "BUILD_PNG",
    "BUILD_OPENEXR",
    "BUILD_WEBP",
    "BUILD_TBB",
    "BUILD_IPP_IW",
    "BUILD_ITT",
];

/// Features never built by this recipe
const ALWAYS_OFF: &[&str] = &[
    "BUILD_EXAMPLES",
    "BUILD_DOCS",
    "BUILD_TESTS",
    "BUILD_PERF_TEST",
    "WITH_IPP",
    "BUILD_opencv_apps",
    "BUILD_opencv_java",
    "WITH_PROTOBUF",
    "WITH_FFMPEG",
    "WITH_QUIRC",
    "WITH_CAROTENE",
];

/// A value passed to CMake with `-D`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CMakeValue {
    Bool(bool),
    Str(String),
    Path(PathBuf),
}

impl fmt::Display for CMakeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(true) => f.write_str("ON"),
            Self::Bool(false) => f.write_str("OFF"),
            Self::Str(s) => f.write_str(s),
            Self::Path(p) => write!(f, "{}", p.display()),
        }
    }
}

impl From<bool> for CMakeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for CMakeValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for CMakeValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<PathBuf> for CMakeValue {
    fn from(value: PathBuf) -> Self {
        Self::Path(value)
    }
}

/// Sorted CMake definitions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Definitions(BTreeMap<String, CMakeValue>);

impl Definitions {
    pub fn set(&mut self, key: &str, value: impl Into<CMakeValue>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&CMakeValue> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &CMakeValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `-DKEY=VALUE` command line arguments
    pub fn to_args(&self) -> Vec<String> {
        self.0
            .iter()
            .map(|(key, value)| format!("-D{}={}", key, value))
            .collect()
    }
}

/// Root folders of dependencies that were already installed
pub type DependencyRoots = BTreeMap<Dependency, PathBuf>;

/// Environment captured from the invoking build environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildEnv {
    pub android_ndk_home: Option<PathBuf>,
    /// `CC` or `CXX` is set, so CMake picks the compiler from the environment
    pub compiler_from_env: bool,
}

impl BuildEnv {
    pub fn from_env() -> Self {
        Self {
            android_ndk_home: std::env::var_os("ANDROID_NDK_HOME").map(PathBuf::from),
            compiler_from_env: std::env::var_os("CC").is_some()
                || std::env::var_os("CXX").is_some(),
        }
    }
}

/// Translate a configuration into CMake definitions
pub fn translate(
    config: &Configuration,
    layout: &Layout,
    roots: &DependencyRoots,
    env: &BuildEnv,
) -> Definitions {
    let settings = &config.settings;
    let opts = &config.options;
    let mut defs = Definitions::default();

    for key in ALWAYS_OFF {
        defs.set(key, false);
    }

    if let Compiler::VisualStudio { runtime, .. } = &settings.compiler {
        defs.set("BUILD_WITH_STATIC_CRT", runtime.is_static());
    }
    if let Some(fpic) = opts.fpic
        && settings.os != Os::Windows
    {
        defs.set("ENABLE_PIC", fpic);
    }

    for key in VENDORED_BUILDS {
        defs.set(key, false);
    }
    defs.set("BUILD_JPEG_TURBO_DISABLE", true);

    defs.set("WITH_JPEG", opts.jpeg.is_some());
    defs.set("WITH_TIFF", opts.tiff);
    defs.set("WITH_WEBP", opts.webp);
    defs.set("WITH_PNG", opts.png);
    defs.set("WITH_JASPER", opts.jasper);
    defs.set("WITH_OPENEXR", opts.openexr);
    defs.set("WITH_EIGEN", opts.eigen);
    defs.set("WITH_TBB", opts.parallel == Some(ParallelBackend::Tbb));
    defs.set("WITH_OPENMP", opts.parallel == Some(ParallelBackend::Openmp));
    defs.set("WITH_CUDA", opts.cuda.is_some());
    defs.set("WITH_CUBLAS", opts.cuda.is_some_and(|c| c.cublas));
    defs.set("WITH_CUFFT", opts.cuda.is_some_and(|c| c.cufft));

    if opts.openexr {
        match roots.get(&Dependency::Openexr) {
            Some(root) => defs.set("OPENEXR_ROOT", root.clone()),
            None => tracing::warn!("OpenEXR root is unknown; CMake will search default paths"),
        }
    }

    if settings.os == Os::Linux {
        defs.set("WITH_GTK", opts.gtk.is_some());
        defs.set("WITH_GTK_2_X", opts.gtk == Some(GtkVersion::Gtk2));
    }

    if let Some(contrib) = opts.contrib {
        defs.set("OPENCV_EXTRA_MODULES_PATH", layout.contrib_modules());
        defs.set("BUILD_opencv_freetype", contrib.freetype);
        defs.set("BUILD_opencv_sfm", contrib.sfm);
    }

    if opts.nonfree {
        defs.set("OPENCV_ENABLE_NONFREE", true);
    }

    if let Os::Android { api_level } = settings.os {
        if let Some(stl) = settings.compiler.libcxx() {
            defs.set("ANDROID_STL", stl);
        }
        defs.set("ANDROID_NATIVE_API_LEVEL", api_level.to_string());
        defs.set("BUILD_PERF_TESTS", false);
        defs.set("BUILD_ANDROID_EXAMPLES", false);
        defs.set("ANDROID_ABI", android_abi(settings.arch));
        if let Some(ndk) = &env.android_ndk_home {
            defs.set("ANDROID_NDK", ndk.clone());
        }
    }

    tracing::debug!("Translated {} CMake definitions", defs.len());
    defs
}

/// ANDROID_ABI for an architecture
pub fn android_abi(arch: Arch) -> &'static str {
    match arch {
        Arch::Armv7 | Arch::Armv7hf => "armeabi-v7a with NEON",
        Arch::Armv8 => "arm64-v8a",
        Arch::Armv5 => "armeabi",
        Arch::Armv6 => "armeabi-v6",
        other => other.as_str(),
    }
}
