//! pkg-config queries for system toolkits (GTK)

use crate::error::{RecipeError, Result};
use serde::Serialize;
use std::process::Command;

/// Link flags reported by pkg-config for one module
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PkgConfigFlags {
    /// Library names without the `-l` prefix
    pub libs: Vec<String>,
    /// Library directories without the `-L` prefix
    pub lib_dirs: Vec<String>,
    /// Remaining linker flags (`-pthread`, `-Wl,...`)
    pub other: Vec<String>,
}

impl PkgConfigFlags {
    /// Merge the output of `--libs-only-l`, `--libs-only-L` and
    /// `--libs-only-other`
    pub fn parse(libs_only_l: &str, libs_only_big_l: &str, libs_only_other: &str) -> Self {
        Self {
            libs: strip_prefixed(libs_only_l, "-l"),
            lib_dirs: strip_prefixed(libs_only_big_l, "-L"),
            other: libs_only_other
                .split_whitespace()
                .map(str::to_string)
                .collect(),
        }
    }
}

fn strip_prefixed(output: &str, prefix: &str) -> Vec<String> {
    output
        .split_whitespace()
        .filter_map(|token| token.strip_prefix(prefix))
        .filter(|rest| !rest.is_empty())
        .map(str::to_string)
        .collect()
}

/// Ask pkg-config for the link flags of a module
pub fn query(module: &str) -> Result<PkgConfigFlags> {
    let libs = run(module, "--libs-only-l")?;
    let dirs = run(module, "--libs-only-L")?;
    let other = run(module, "--libs-only-other")?;
    let flags = PkgConfigFlags::parse(&libs, &dirs, &other);
    tracing::debug!(
        "pkg-config {}: {} libs, {} dirs, {} other flags",
        module,
        flags.libs.len(),
        flags.lib_dirs.len(),
        flags.other.len()
    );
    Ok(flags)
}

fn run(module: &str, flag: &str) -> Result<String> {
    let output = Command::new("pkg-config").arg(flag).arg(module).output()?;
    if !output.status.success() {
        return Err(RecipeError::ToolFailed {
            tool: format!("pkg-config {} {}", flag, module),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
