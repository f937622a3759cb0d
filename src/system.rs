//! System package requirements on Linux distributions.
//!
//! GTK is not packaged as a recipe dependency; highgui links the
//! distribution's development package instead. This module names those
//! packages for apt and yum based systems and installs missing ones.

use crate::configure::{Configuration, GtkVersion};
use crate::error::{RecipeError, Result};
use crate::settings::{Arch, Os};
use std::process::Command;

/// Distribution package manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageTool {
    Apt,
    Yum,
}

impl PackageTool {
    /// Detect the package manager of the machine running this tool
    pub fn detect() -> Option<Self> {
        if tool_available("apt-get") {
            Some(Self::Apt)
        } else if tool_available("yum") {
            Some(Self::Yum)
        } else {
            None
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Apt => "apt-get",
            Self::Yum => "yum",
        }
    }

    /// Multiarch suffix appended to package names
    fn arch_suffix(&self, arch: Arch) -> &'static str {
        match (self, arch) {
            (Self::Apt, Arch::X86) => ":i386",
            (Self::Apt, Arch::X86_64) => ":amd64",
            (Self::Yum, Arch::X86) => ".i686",
            (Self::Yum, Arch::X86_64) => ".x86_64",
            _ => "",
        }
    }

    fn gtk_package(&self, gtk: GtkVersion) -> &'static str {
        match (self, gtk) {
            (Self::Apt, GtkVersion::Gtk2) => "libgtk2.0-dev",
            (Self::Apt, GtkVersion::Gtk3) => "libgtk-3-dev",
            (Self::Yum, GtkVersion::Gtk2) => "gtk2-devel",
            (Self::Yum, GtkVersion::Gtk3) => "gtk3-devel",
        }
    }

    fn is_installed(&self, package: &str) -> bool {
        let output = match self {
            Self::Apt => Command::new("dpkg-query")
                .args(["-W", "-f=${Status}", package])
                .output(),
            Self::Yum => Command::new("rpm").args(["-q", package]).output(),
        };
        match output {
            Ok(output) if output.status.success() => match self {
                Self::Apt => String::from_utf8_lossy(&output.stdout).contains("ok installed"),
                Self::Yum => true,
            },
            _ => false,
        }
    }

    fn install_command(&self, package: &str, sudo: bool) -> Command {
        let mut args: Vec<&str> = Vec::new();
        if sudo {
            args.push(self.name());
        }
        match self {
            Self::Apt => args.extend(["install", "-y", "--no-install-recommends", package]),
            Self::Yum => args.extend(["install", "-y", package]),
        }

        let program = if sudo { "sudo" } else { self.name() };
        let mut command = Command::new(program);
        command.args(args);
        command
    }
}

/// System packages the configuration needs from the given package tool
///
/// Empty unless the target is Linux and the build machine is Linux.
pub fn packages(config: &Configuration, tool: PackageTool) -> Vec<String> {
    let settings = &config.settings;
    if settings.os != Os::Linux || settings.os_build != Os::Linux {
        return Vec::new();
    }

    let suffix = tool.arch_suffix(settings.arch);
    config
        .options
        .gtk
        .map(|gtk| vec![format!("{}{}", tool.gtk_package(gtk), suffix)])
        .unwrap_or_default()
}

/// Install the packages that are not installed yet
///
/// Returns the packages that were installed.
pub fn install(tool: PackageTool, packages: &[String], sudo: bool) -> Result<Vec<String>> {
    let mut installed = Vec::new();
    for package in packages {
        if tool.is_installed(package) {
            tracing::info!("System package {} is already installed", package);
            continue;
        }

        tracing::info!("Installing system package {} with {}", package, tool.name());
        let output = tool
            .install_command(package, sudo)
            .output()
            .map_err(|e| RecipeError::SystemPackage(format!("{}: {}", package, e)))?;
        if !output.status.success() {
            return Err(RecipeError::SystemPackage(format!(
                "{} ({}): {}",
                package,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        installed.push(package.clone());
    }
    Ok(installed)
}

fn tool_available(program: &str) -> bool {
    Command::new(program)
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}
