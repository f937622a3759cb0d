//! System libraries and frameworks consumers need when linking OpenCV

use crate::configure::{Configuration, ParallelBackend};
use crate::settings::{Compiler, Os};
use serde::Serialize;

const LINUX_SYSTEM_LIBS: &[&str] = &["pthread", "m", "dl"];

const MACOS_FRAMEWORKS: &[&str] = &[
    "OpenCL",
    "Accelerate",
    "CoreMedia",
    "CoreVideo",
    "CoreGraphics",
    "AVFoundation",
    "QuartzCore",
    "Cocoa",
];

const WINDOWS_SYSTEM_LIBS: &[&str] = &["Vfw32"];

/// Platform link requirements
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkInfo {
    pub system_libs: Vec<String>,
    pub frameworks: Vec<String>,
    /// pkg-config modules whose flags must be added (GUI toolkits)
    pub pkg_config_modules: Vec<String>,
}

impl LinkInfo {
    /// `-framework X` linker flags
    pub fn framework_flags(&self) -> Vec<String> {
        self.frameworks
            .iter()
            .map(|f| format!("-framework {}", f))
            .collect()
    }
}

/// Link requirements for the configured platform and toolkit
pub fn resolve(config: &Configuration) -> LinkInfo {
    let mut info = platform(config);
    if !config.options.shared {
        info.system_libs.extend(static_runtime_libs(config));
    }
    info
}

fn platform(config: &Configuration) -> LinkInfo {
    let to_owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

    match config.settings.os {
        Os::Linux => LinkInfo {
            system_libs: to_owned(LINUX_SYSTEM_LIBS),
            frameworks: Vec::new(),
            pkg_config_modules: config
                .options
                .gtk
                .map(|gtk| vec![gtk.pkg_config_module().to_string()])
                .unwrap_or_default(),
        },
        Os::Macos => LinkInfo {
            frameworks: to_owned(MACOS_FRAMEWORKS),
            ..LinkInfo::default()
        },
        Os::Windows => LinkInfo {
            system_libs: to_owned(WINDOWS_SYSTEM_LIBS),
            ..LinkInfo::default()
        },
        Os::Android { .. } | Os::Ios => LinkInfo::default(),
    }
}

/// Runtimes a static OpenCV pulls into the consumer's link
fn static_runtime_libs(config: &Configuration) -> Vec<String> {
    let opts = &config.options;
    let mut libs = Vec::new();

    if let Some(cuda) = opts.cuda {
        libs.push("cudart");
        if cuda.cublas {
            libs.push("cublas");
        }
        if cuda.cufft {
            libs.push("cufft");
        }
    }

    // MSVC links vcomp through a pragma in the objects
    if opts.parallel == Some(ParallelBackend::Openmp) {
        match config.settings.compiler {
            Compiler::Gcc { .. } => libs.push("gomp"),
            Compiler::Clang { .. } | Compiler::AppleClang { .. } => libs.push("omp"),
            Compiler::VisualStudio { .. } => {}
        }
    }

    libs.into_iter().map(String::from).collect()
}
