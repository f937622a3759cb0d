//! CMake invocation: configure, build and install
//!
//! The target platform reaches CMake through generator and toolchain
//! arguments derived from the settings: `-A` for Visual Studio, the NDK
//! toolchain file for Android, `CMAKE_SYSTEM_*` for other cross builds.

use crate::definitions::{BuildEnv, Definitions, android_abi};
use crate::error::{RecipeError, Result};
use crate::layout::Layout;
use crate::settings::{Arch, BuildType, Compiler, Os, Settings};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::PathBuf;
use std::process::Command;

/// NDK toolchain file, relative to the NDK root
const ANDROID_TOOLCHAIN: &str = "build/cmake/android.toolchain.cmake";

/// A configured CMake project ready to build
#[derive(Debug, Clone)]
pub struct CMake {
    pub source_dir: PathBuf,
    pub build_dir: PathBuf,
    pub install_prefix: PathBuf,
    pub build_type: BuildType,
    /// Generator, toolchain and compiler arguments for the target
    pub platform_args: Vec<String>,
    pub definitions: Definitions,
    /// Parallel build jobs, CMake's default when unset
    pub jobs: Option<usize>,
    /// Extra environment for every cmake invocation
    pub env: BTreeMap<String, String>,
}

impl CMake {
    pub fn new(
        layout: &Layout,
        settings: &Settings,
        definitions: Definitions,
        env: &BuildEnv,
    ) -> Self {
        Self {
            source_dir: layout.source_folder(),
            build_dir: layout.build_folder(),
            install_prefix: layout.package_folder.clone(),
            build_type: settings.build_type,
            platform_args: platform_args(settings, env),
            definitions,
            jobs: None,
            env: BTreeMap::new(),
        }
    }

    /// Arguments of the configure step
    pub fn configure_args(&self) -> Vec<String> {
        let mut args = vec![
            "-S".to_string(),
            self.source_dir.display().to_string(),
            "-B".to_string(),
            self.build_dir.display().to_string(),
        ];
        args.extend(self.platform_args.iter().cloned());
        args.extend(self.definitions.to_args());
        args.push(format!("-DCMAKE_BUILD_TYPE={}", self.build_type.as_str()));
        args.push(format!(
            "-DCMAKE_INSTALL_PREFIX={}",
            self.install_prefix.display()
        ));
        args
    }

    /// Arguments of a build step, optionally for one target
    pub fn build_args(&self, target: Option<&str>) -> Vec<String> {
        let mut args = vec![
            "--build".to_string(),
            self.build_dir.display().to_string(),
            "--config".to_string(),
            self.build_type.as_str().to_string(),
        ];
        if let Some(target) = target {
            args.push("--target".to_string());
            args.push(target.to_string());
        }
        if let Some(jobs) = self.jobs {
            args.push("--parallel".to_string());
            args.push(jobs.to_string());
        }
        args
    }

    pub fn configure(&self) -> Result<()> {
        std::fs::create_dir_all(&self.build_dir)?;
        self.run("cmake configure", &self.configure_args())
    }

    pub fn build(&self) -> Result<()> {
        self.run("cmake build", &self.build_args(None))
    }

    pub fn install(&self) -> Result<()> {
        self.run("cmake install", &self.build_args(Some("install")))
    }

    fn run(&self, step: &str, args: &[String]) -> Result<()> {
        tracing::info!("Running cmake {}", args.join(" "));
        let output = Command::new("cmake").args(args).envs(&self.env).output()?;
        if !output.status.success() {
            return Err(RecipeError::ToolFailed {
                tool: step.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        tracing::debug!("{} finished", step);
        Ok(())
    }
}

/// Arguments that point CMake at the target platform and compiler
pub fn platform_args(settings: &Settings, env: &BuildEnv) -> Vec<String> {
    let mut args = Vec::new();

    if let Os::Android { api_level } = settings.os {
        match &env.android_ndk_home {
            Some(ndk) => args.push(define(
                "CMAKE_TOOLCHAIN_FILE",
                ndk.join(ANDROID_TOOLCHAIN).display(),
            )),
            None => {
                tracing::warn!("ANDROID_NDK_HOME is not set; relying on CMake's NDK discovery");
                args.push(define("CMAKE_SYSTEM_NAME", "Android"));
                args.push(define("CMAKE_SYSTEM_VERSION", api_level));
                args.push(define("CMAKE_ANDROID_ARCH_ABI", android_arch_abi(settings.arch)));
            }
        }
        return args;
    }

    if settings.compiler.is_visual_studio() {
        if let Some(platform) = settings.arch.msvc_platform() {
            args.push("-A".to_string());
            args.push(platform.to_string());
        }
        return args;
    }

    let same_os = settings.os.same_family(&settings.os_build);
    let multilib = same_os && settings.arch == Arch::X86 && settings.arch_build == Arch::X86_64;
    if settings.is_cross_building() && !multilib {
        args.push(define("CMAKE_SYSTEM_NAME", system_name(&settings.os)));
        args.push(define("CMAKE_SYSTEM_PROCESSOR", system_processor(settings.arch)));
    }

    if !env.compiler_from_env {
        let compilers = match settings.compiler {
            Compiler::Gcc { .. } => Some(("gcc", "g++")),
            Compiler::Clang { .. } => Some(("clang", "clang++")),
            Compiler::AppleClang { .. } | Compiler::VisualStudio { .. } => None,
        };
        if let Some((cc, cxx)) = compilers {
            args.push(define("CMAKE_C_COMPILER", cc));
            args.push(define("CMAKE_CXX_COMPILER", cxx));
        }
    }

    let mut c_flags = Vec::new();
    let mut cxx_flags = Vec::new();
    if multilib {
        c_flags.push("-m32");
        cxx_flags.push("-m32");
    }
    if settings.compiler.libcxx() == Some("libc++") {
        cxx_flags.push("-stdlib=libc++");
    }
    if !c_flags.is_empty() {
        args.push(define("CMAKE_C_FLAGS", c_flags.join(" ")));
    }
    if !cxx_flags.is_empty() {
        args.push(define("CMAKE_CXX_FLAGS", cxx_flags.join(" ")));
    }

    args
}

fn define(key: &str, value: impl Display) -> String {
    format!("-D{}={}", key, value)
}

/// `CMAKE_SYSTEM_NAME` of a target OS
fn system_name(os: &Os) -> &'static str {
    match os {
        Os::Windows => "Windows",
        Os::Linux => "Linux",
        Os::Macos => "Darwin",
        Os::Ios => "iOS",
        Os::Android { .. } => "Android",
    }
}

/// `CMAKE_SYSTEM_PROCESSOR` of a target architecture
fn system_processor(arch: Arch) -> &'static str {
    match arch {
        Arch::X86 => "i686",
        Arch::X86_64 => "x86_64",
        Arch::Armv8 => "aarch64",
        Arch::Armv5 | Arch::Armv6 | Arch::Armv7 | Arch::Armv7hf => "arm",
    }
}

/// `CMAKE_ANDROID_ARCH_ABI` for CMake's built-in Android support
fn android_arch_abi(arch: Arch) -> &'static str {
    match arch {
        Arch::Armv7 | Arch::Armv7hf => "armeabi-v7a",
        other => android_abi(other),
    }
}
