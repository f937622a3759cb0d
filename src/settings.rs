//! Platform descriptor: the settings a recipe is configured for.
//!
//! Settings describe the *target* of a build: operating system, compiler,
//! architecture and build type. They are supplied by the invoking environment
//! (command line or profile) as flat `key=value` pairs using the same keys
//! package managers use:
//!
//! ```text
//! os=Android
//! os.api_level=21
//! compiler=clang
//! compiler.version=8
//! compiler.libcxx=c++_shared
//! arch=armv8
//! build_type=Release
//! ```
//!
//! The build machine's own os/arch (`os_build`, `arch_build`) default to the
//! host this tool runs on and are used for cross-build detection.
//!
//! # Examples
//!
//! ```
//! use opencv_recipe::settings::{Os, Settings};
//! use std::collections::BTreeMap;
//!
//! let mut values = BTreeMap::new();
//! values.insert("os".to_string(), "Linux".to_string());
//! values.insert("compiler".to_string(), "gcc".to_string());
//! values.insert("compiler.version".to_string(), "9".to_string());
//! values.insert("arch".to_string(), "x86_64".to_string());
//! values.insert("build_type".to_string(), "Release".to_string());
//!
//! let settings = Settings::from_map(&values).unwrap();
//! assert_eq!(settings.os, Os::Linux);
//! ```

use crate::error::{RecipeError, Result};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Target operating system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Os {
    Windows,
    Linux,
    Macos,
    Ios,
    Android { api_level: u32 },
}

impl Os {
    /// Name without sub-settings, as used in settings files
    pub fn name(&self) -> &'static str {
        match self {
            Self::Windows => "Windows",
            Self::Linux => "Linux",
            Self::Macos => "Macos",
            Self::Ios => "iOS",
            Self::Android { .. } => "Android",
        }
    }

    /// Same OS family, ignoring sub-settings like the Android API level
    pub fn same_family(&self, other: &Os) -> bool {
        self.name() == other.name()
    }

    fn parse(name: &str, api_level: Option<&str>) -> Result<Self> {
        match name {
            "Windows" => Ok(Self::Windows),
            "Linux" => Ok(Self::Linux),
            "Macos" => Ok(Self::Macos),
            "iOS" => Ok(Self::Ios),
            "Android" => {
                let raw = api_level.ok_or_else(|| {
                    RecipeError::MissingSetting("os.api_level".to_string())
                })?;
                let api_level = raw.parse().map_err(|_| RecipeError::InvalidSetting {
                    key: "os.api_level".to_string(),
                    value: raw.to_string(),
                    reason: "expected an integer API level".to_string(),
                })?;
                Ok(Self::Android { api_level })
            }
            other => Err(RecipeError::InvalidSetting {
                key: "os".to_string(),
                value: other.to_string(),
                reason: "expected one of Windows, Linux, Macos, iOS, Android".to_string(),
            }),
        }
    }

    /// Parse `os_build`, which carries no API level
    fn parse_build(name: &str) -> Result<Self> {
        match name {
            "Android" => Ok(Self::Android { api_level: 0 }),
            other => Self::parse(other, None),
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Android { api_level } => write!(f, "Android (API {})", api_level),
            other => f.write_str(other.name()),
        }
    }
}

/// Target CPU architecture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Arch {
    X86,
    X86_64,
    Armv5,
    Armv6,
    Armv7,
    Armv7hf,
    Armv8,
}

impl Arch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X86 => "x86",
            Self::X86_64 => "x86_64",
            Self::Armv5 => "armv5",
            Self::Armv6 => "armv6",
            Self::Armv7 => "armv7",
            Self::Armv7hf => "armv7hf",
            Self::Armv8 => "armv8",
        }
    }

    /// Folder OpenCV installs MSVC binaries under (`OpenCV_ARCH`)
    pub fn msvc_folder(&self) -> Option<&'static str> {
        match self {
            Self::X86 => Some("x86"),
            Self::X86_64 => Some("x64"),
            Self::Armv7 | Self::Armv7hf => Some("ARM"),
            Self::Armv8 => Some("ARM64"),
            Self::Armv5 | Self::Armv6 => None,
        }
    }

    /// Visual Studio generator platform (`cmake -A`)
    pub fn msvc_platform(&self) -> Option<&'static str> {
        match self {
            Self::X86 => Some("Win32"),
            other => other.msvc_folder(),
        }
    }

    /// Architecture of the machine running this tool
    pub fn host() -> Option<Self> {
        match std::env::consts::ARCH {
            "x86" => Some(Self::X86),
            "x86_64" => Some(Self::X86_64),
            "arm" => Some(Self::Armv7),
            // Rust says "aarch64", package managers say "armv8"
            "aarch64" => Some(Self::Armv8),
            _ => None,
        }
    }
}

impl FromStr for Arch {
    type Err = RecipeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "x86" => Ok(Self::X86),
            "x86_64" => Ok(Self::X86_64),
            "armv5" => Ok(Self::Armv5),
            "armv6" => Ok(Self::Armv6),
            "armv7" => Ok(Self::Armv7),
            "armv7hf" => Ok(Self::Armv7hf),
            "armv8" => Ok(Self::Armv8),
            other => Err(RecipeError::InvalidSetting {
                key: "arch".to_string(),
                value: other.to_string(),
                reason: "unsupported architecture".to_string(),
            }),
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BuildType {
    Debug,
    Release,
    RelWithDebInfo,
    MinSizeRel,
}

impl BuildType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "Debug",
            Self::Release => "Release",
            Self::RelWithDebInfo => "RelWithDebInfo",
            Self::MinSizeRel => "MinSizeRel",
        }
    }
}

impl FromStr for BuildType {
    type Err = RecipeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Debug" => Ok(Self::Debug),
            "Release" => Ok(Self::Release),
            "RelWithDebInfo" => Ok(Self::RelWithDebInfo),
            "MinSizeRel" => Ok(Self::MinSizeRel),
            other => Err(RecipeError::InvalidSetting {
                key: "build_type".to_string(),
                value: other.to_string(),
                reason: "expected Debug, Release, RelWithDebInfo or MinSizeRel".to_string(),
            }),
        }
    }
}

/// Visual Studio C runtime flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Runtime {
    MT,
    MTd,
    MD,
    MDd,
}

impl Runtime {
    /// Static CRT (`/MT`, `/MTd`)
    pub fn is_static(&self) -> bool {
        matches!(self, Self::MT | Self::MTd)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MT => "MT",
            Self::MTd => "MTd",
            Self::MD => "MD",
            Self::MDd => "MDd",
        }
    }
}

impl FromStr for Runtime {
    type Err = RecipeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "MT" => Ok(Self::MT),
            "MTd" => Ok(Self::MTd),
            "MD" => Ok(Self::MD),
            "MDd" => Ok(Self::MDd),
            other => Err(RecipeError::InvalidSetting {
                key: "compiler.runtime".to_string(),
                value: other.to_string(),
                reason: "expected MT, MTd, MD or MDd".to_string(),
            }),
        }
    }
}

/// Loose `major[.minor[.patch]]` compiler version
///
/// Compiler versions are not semver ("15", "3.9", "10.0"), so missing
/// components compare as zero, and `14` equals `14.0`.
#[derive(Debug, Clone, Serialize)]
pub struct CompilerVersion {
    raw: String,
    parts: Vec<u32>,
}

impl CompilerVersion {
    pub fn major(&self) -> u32 {
        self.parts.first().copied().unwrap_or(0)
    }

    pub fn minor(&self) -> u32 {
        self.parts.get(1).copied().unwrap_or(0)
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for CompilerVersion {
    type Err = RecipeError;

    fn from_str(s: &str) -> Result<Self> {
        let parts = s
            .split('.')
            .map(|p| p.parse::<u32>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| RecipeError::InvalidSetting {
                key: "compiler.version".to_string(),
                value: s.to_string(),
                reason: "expected a dotted numeric version".to_string(),
            })?;

        Ok(Self {
            raw: s.to_string(),
            parts,
        })
    }
}

impl PartialEq for CompilerVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CompilerVersion {}

impl PartialOrd for CompilerVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CompilerVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        for i in 0..len {
            let a = self.parts.get(i).copied().unwrap_or(0);
            let b = other.parts.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                non_eq => return non_eq,
            }
        }
        Ordering::Equal
    }
}

impl fmt::Display for CompilerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Compiler identity with its sub-settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Compiler {
    VisualStudio {
        version: CompilerVersion,
        runtime: Runtime,
    },
    Gcc {
        version: CompilerVersion,
        libcxx: Option<String>,
    },
    Clang {
        version: CompilerVersion,
        libcxx: Option<String>,
    },
    AppleClang {
        version: CompilerVersion,
        libcxx: Option<String>,
    },
}

impl Compiler {
    pub fn name(&self) -> &'static str {
        match self {
            Self::VisualStudio { .. } => "Visual Studio",
            Self::Gcc { .. } => "gcc",
            Self::Clang { .. } => "clang",
            Self::AppleClang { .. } => "apple-clang",
        }
    }

    pub fn version(&self) -> &CompilerVersion {
        match self {
            Self::VisualStudio { version, .. }
            | Self::Gcc { version, .. }
            | Self::Clang { version, .. }
            | Self::AppleClang { version, .. } => version,
        }
    }

    pub fn libcxx(&self) -> Option<&str> {
        match self {
            Self::VisualStudio { .. } => None,
            Self::Gcc { libcxx, .. } | Self::Clang { libcxx, .. } | Self::AppleClang { libcxx, .. } => {
                libcxx.as_deref()
            }
        }
    }

    pub fn is_visual_studio(&self) -> bool {
        matches!(self, Self::VisualStudio { .. })
    }

    fn parse(values: &BTreeMap<String, String>) -> Result<Self> {
        let name = require(values, "compiler")?;
        let version: CompilerVersion = require(values, "compiler.version")?.parse()?;
        let libcxx = values.get("compiler.libcxx").cloned();

        match name {
            "Visual Studio" => {
                let runtime = values
                    .get("compiler.runtime")
                    .map(|r| r.parse())
                    .transpose()?
                    .unwrap_or(Runtime::MD);
                Ok(Self::VisualStudio { version, runtime })
            }
            "gcc" => Ok(Self::Gcc { version, libcxx }),
            "clang" => Ok(Self::Clang { version, libcxx }),
            "apple-clang" => Ok(Self::AppleClang { version, libcxx }),
            other => Err(RecipeError::InvalidSetting {
                key: "compiler".to_string(),
                value: other.to_string(),
                reason: "expected Visual Studio, gcc, clang or apple-clang".to_string(),
            }),
        }
    }
}

impl fmt::Display for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name(), self.version())
    }
}

/// Complete platform descriptor for one build
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    pub os: Os,
    pub compiler: Compiler,
    pub arch: Arch,
    pub build_type: BuildType,
    /// OS of the build machine (`os_build`)
    pub os_build: Os,
    /// Architecture of the build machine (`arch_build`)
    pub arch_build: Arch,
}

impl Settings {
    /// Parse settings from flat `key=value` pairs
    ///
    /// `os_build` and `arch_build` default to the host this tool runs on,
    /// falling back to the target values when the host is not recognised.
    pub fn from_map(values: &BTreeMap<String, String>) -> Result<Self> {
        let os = Os::parse(
            require(values, "os")?,
            values.get("os.api_level").map(String::as_str),
        )?;
        let compiler = Compiler::parse(values)?;
        let arch: Arch = require(values, "arch")?.parse()?;
        let build_type = values
            .get("build_type")
            .map(|b| b.parse())
            .transpose()?
            .unwrap_or(BuildType::Release);

        let os_build = match values.get("os_build") {
            Some(name) => Os::parse_build(name)?,
            None => host_os().unwrap_or(os),
        };
        let arch_build = match values.get("arch_build") {
            Some(arch) => arch.parse()?,
            None => Arch::host().unwrap_or(arch),
        };

        let settings = Self {
            os,
            compiler,
            arch,
            build_type,
            os_build,
            arch_build,
        };
        tracing::debug!(
            "Settings: os={} compiler={} arch={} build_type={} cross={}",
            settings.os,
            settings.compiler,
            settings.arch,
            settings.build_type.as_str(),
            settings.is_cross_building()
        );
        Ok(settings)
    }

    /// Target differs from the build machine
    pub fn is_cross_building(&self) -> bool {
        !self.os.same_family(&self.os_build) || self.arch != self.arch_build
    }

    /// Flat `key=value` view, the inverse of [`Settings::from_map`]
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert("os".to_string(), self.os.name().to_string());
        if let Os::Android { api_level } = self.os {
            map.insert("os.api_level".to_string(), api_level.to_string());
        }
        map.insert("compiler".to_string(), self.compiler.name().to_string());
        map.insert(
            "compiler.version".to_string(),
            self.compiler.version().to_string(),
        );
        match &self.compiler {
            Compiler::VisualStudio { runtime, .. } => {
                map.insert("compiler.runtime".to_string(), runtime.as_str().to_string());
            }
            other => {
                if let Some(libcxx) = other.libcxx() {
                    map.insert("compiler.libcxx".to_string(), libcxx.to_string());
                }
            }
        }
        map.insert("arch".to_string(), self.arch.to_string());
        map.insert("build_type".to_string(), self.build_type.as_str().to_string());
        map.insert("os_build".to_string(), self.os_build.name().to_string());
        map.insert("arch_build".to_string(), self.arch_build.to_string());
        map
    }
}

/// OS of the machine running this tool
pub fn host_os() -> Option<Os> {
    #[cfg(target_os = "windows")]
    {
        Some(Os::Windows)
    }

    #[cfg(target_os = "linux")]
    {
        Some(Os::Linux)
    }

    #[cfg(target_os = "macos")]
    {
        Some(Os::Macos)
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

fn require<'a>(values: &'a BTreeMap<String, String>, key: &str) -> Result<&'a str> {
    values
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| RecipeError::MissingSetting(key.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_visual_studio() {
        let settings = Settings::from_map(&map(&[
            ("os", "Windows"),
            ("compiler", "Visual Studio"),
            ("compiler.version", "15"),
            ("compiler.runtime", "MTd"),
            ("arch", "x86_64"),
            ("build_type", "Debug"),
            ("os_build", "Windows"),
            ("arch_build", "x86_64"),
        ]))
        .unwrap();

        assert_eq!(settings.os, Os::Windows);
        assert!(settings.compiler.is_visual_studio());
        assert_eq!(settings.compiler.version().major(), 15);
        assert_eq!(settings.build_type, BuildType::Debug);
        assert!(!settings.is_cross_building());
        match settings.compiler {
            Compiler::VisualStudio { runtime, .. } => assert!(runtime.is_static()),
            _ => panic!("expected Visual Studio"),
        }
    }

    #[test]
    fn test_android_requires_api_level() {
        let err = Settings::from_map(&map(&[
            ("os", "Android"),
            ("compiler", "clang"),
            ("compiler.version", "8"),
            ("arch", "armv8"),
        ]))
        .unwrap_err();
        assert!(matches!(err, RecipeError::MissingSetting(ref k) if k == "os.api_level"));
    }

    #[test]
    fn test_android_is_cross_building() {
        let settings = Settings::from_map(&map(&[
            ("os", "Android"),
            ("os.api_level", "21"),
            ("compiler", "clang"),
            ("compiler.version", "8"),
            ("arch", "armv8"),
            ("os_build", "Linux"),
            ("arch_build", "x86_64"),
        ]))
        .unwrap();
        assert!(settings.is_cross_building());
        assert_eq!(settings.os, Os::Android { api_level: 21 });
    }

    #[test]
    fn test_android_build_machine() {
        let settings = Settings::from_map(&map(&[
            ("os", "Android"),
            ("os.api_level", "24"),
            ("compiler", "clang"),
            ("compiler.version", "8"),
            ("arch", "armv8"),
            ("os_build", "Android"),
            ("arch_build", "armv8"),
        ]))
        .unwrap();
        assert!(settings.os_build.same_family(&settings.os));
        assert!(!settings.is_cross_building());
        assert_eq!(settings.to_map()["os_build"], "Android");
    }

    #[test]
    fn test_msvc_architectures() {
        assert_eq!(Arch::X86.msvc_folder(), Some("x86"));
        assert_eq!(Arch::X86.msvc_platform(), Some("Win32"));
        assert_eq!(Arch::X86_64.msvc_platform(), Some("x64"));
        assert_eq!(Arch::Armv7hf.msvc_folder(), Some("ARM"));
        assert_eq!(Arch::Armv8.msvc_platform(), Some("ARM64"));
        assert_eq!(Arch::Armv5.msvc_platform(), None);
    }

    #[test]
    fn test_arch_mismatch_is_cross_building() {
        let settings = Settings::from_map(&map(&[
            ("os", "Linux"),
            ("compiler", "gcc"),
            ("compiler.version", "9"),
            ("arch", "armv8"),
            ("os_build", "Linux"),
            ("arch_build", "x86_64"),
        ]))
        .unwrap();
        assert!(settings.is_cross_building());
    }

    #[test]
    fn test_compiler_version_ordering() {
        let v: CompilerVersion = "14".parse().unwrap();
        let w: CompilerVersion = "14.0".parse().unwrap();
        let x: CompilerVersion = "3.9".parse().unwrap();
        assert_eq!(v, v.clone());
        assert_eq!(v.cmp(&w), Ordering::Equal);
        assert_eq!(v, w);
        assert_ne!(v, x);
        assert!(x < v);
        assert_eq!(x.minor(), 9);
        assert!("abc".parse::<CompilerVersion>().is_err());
    }

    #[test]
    fn test_unknown_values_rejected() {
        assert!("sparc".parse::<Arch>().is_err());
        assert!("Fast".parse::<BuildType>().is_err());
        let err = Settings::from_map(&map(&[
            ("os", "Plan9"),
            ("compiler", "gcc"),
            ("compiler.version", "9"),
            ("arch", "x86_64"),
        ]))
        .unwrap_err();
        assert!(matches!(err, RecipeError::InvalidSetting { ref key, .. } if key == "os"));
    }

    #[test]
    fn test_to_map_round_trips() {
        let original = map(&[
            ("os", "Linux"),
            ("compiler", "gcc"),
            ("compiler.version", "9"),
            ("compiler.libcxx", "libstdc++11"),
            ("arch", "x86_64"),
            ("build_type", "Release"),
            ("os_build", "Linux"),
            ("arch_build", "x86_64"),
        ]);
        let settings = Settings::from_map(&original).unwrap();
        assert_eq!(settings.to_map(), original);
    }
}
