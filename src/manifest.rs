//! Package manifest: what consumers need to compile and link against OpenCV.
//!
//! The manifest merges three sources:
//! - the artifact descriptor (library names and folders),
//! - platform link info (system libraries and frameworks),
//! - pkg-config output for system toolkits such as GTK.

use crate::artifacts::ArtifactDescriptor;
use crate::error::Result;
use crate::linkinfo::LinkInfo;
use crate::pkgconfig::PkgConfigFlags;
use crate::requirements::DependencyDeclaration;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const MANIFEST_FILE: &str = "package_manifest.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageManifest {
    pub name: String,
    pub version: String,
    /// Link names, in link order
    pub libs: Vec<String>,
    pub libdirs: Vec<String>,
    pub bindirs: Vec<String>,
    pub includedirs: Vec<String>,
    pub sharedlinkflags: Vec<String>,
    pub exelinkflags: Vec<String>,
    /// Dependency references
    pub requires: Vec<String>,
}

impl PackageManifest {
    pub fn new(
        name: &str,
        version: &str,
        artifacts: &ArtifactDescriptor,
        link_info: &LinkInfo,
        pkg_config: &[PkgConfigFlags],
        requirements: &[DependencyDeclaration],
    ) -> Self {
        let mut libs = artifacts.libs.clone();
        libs.extend(link_info.system_libs.iter().cloned());

        let mut libdirs = artifacts.lib_dirs.clone();
        let mut linkflags = link_info.framework_flags();

        for flags in pkg_config {
            extend_unique(&mut libs, &flags.libs);
            extend_unique(&mut libdirs, &flags.lib_dirs);
            extend_unique(&mut linkflags, &flags.other);
        }

        Self {
            name: name.to_string(),
            version: version.to_string(),
            libs,
            libdirs,
            bindirs: artifacts.bin_dirs.clone(),
            includedirs: artifacts.include_dirs.clone(),
            sharedlinkflags: linkflags.clone(),
            exelinkflags: linkflags,
            requires: requirements
                .iter()
                .map(|r| r.reference.to_string())
                .collect(),
        }
    }

    pub fn read(folder: &Path) -> Result<Self> {
        let path = folder.join(MANIFEST_FILE);
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn write(&self, folder: &Path) -> Result<()> {
        let path = folder.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write manifest: {}", path.display()))?;
        Ok(())
    }
}

fn extend_unique(target: &mut Vec<String>, items: &[String]) {
    for item in items {
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}
