//! Recipe metadata and the resolved build plan.
//!
//! A [`Plan`] is everything the pure mapping stages derive from one
//! configuration. Commands build a plan first and then act on it, so
//! `inspect` shows exactly what `build` would do.

use crate::artifacts::{self, ArtifactDescriptor};
use crate::configure::Configuration;
use crate::definitions::{self, BuildEnv, Definitions, DependencyRoots};
use crate::layout::Layout;
use crate::linkinfo::{self, LinkInfo};
use crate::patch::{self, FilePatch};
use crate::requirements::{self, DependencyDeclaration};
use crate::source::SourceArchive;
use serde::Serialize;

/// Static description of the packaged library
#[derive(Debug, Clone, Serialize)]
pub struct RecipeInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub license: &'static str,
    pub homepage: &'static str,
    pub url: &'static str,
    pub description: &'static str,
    pub topics: &'static [&'static str],
    source_sha256: &'static str,
    contrib_sha256: &'static str,
}

impl RecipeInfo {
    pub fn opencv() -> Self {
        Self {
            name: "opencv",
            version: "4.0.1",
            license: "BSD-3-Clause",
            homepage: "https://github.com/opencv/opencv",
            url: "https://github.com/conan-community/conan-opencv",
            description: "OpenCV is an open source computer vision and machine learning \
                          software library.",
            topics: &[
                "opencv",
                "computer-vision",
                "image-processing",
                "deep-learning",
            ],
            source_sha256: "7b86a0ee804244e0c407321f895b15e4a7162e9c5c0d2efc85f1cadec4011af4",
            contrib_sha256: "0d8acbad4b7074cfaafd906a7419c23629179d5e98894714402090b192ef8237",
        }
    }

    /// `name/version` reference of this package
    pub fn reference(&self) -> String {
        format!("{}/{}", self.name, self.version)
    }

    /// Archives to fetch; contrib only when it is enabled
    pub fn source_archives(&self, config: &Configuration, layout: &Layout) -> Vec<SourceArchive> {
        let mut archives = vec![SourceArchive {
            name: self.name.to_string(),
            url: format!("{}/archive/{}.tar.gz", self.homepage, self.version),
            sha256: self.source_sha256.to_string(),
            top_dir: format!("opencv-{}", self.version),
            target: layout.source_folder(),
        }];

        if config.options.contrib.is_some() {
            archives.push(SourceArchive {
                name: "opencv_contrib".to_string(),
                url: format!(
                    "https://github.com/opencv/opencv_contrib/archive/{}.tar.gz",
                    self.version
                ),
                sha256: self.contrib_sha256.to_string(),
                top_dir: format!("opencv_contrib-{}", self.version),
                target: layout.contrib_folder(),
            });
        }

        archives
    }
}

/// Everything derived from one configuration
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub reference: String,
    pub package_id: String,
    pub configuration: Configuration,
    pub requirements: Vec<DependencyDeclaration>,
    pub definitions: Definitions,
    pub artifacts: ArtifactDescriptor,
    pub link_info: LinkInfo,
    #[serde(skip)]
    pub patches: Vec<FilePatch>,
}

impl Plan {
    pub fn new(
        info: &RecipeInfo,
        configuration: Configuration,
        layout: &Layout,
        roots: &DependencyRoots,
        env: &BuildEnv,
    ) -> Self {
        let requirements = requirements::select(&configuration);
        let definitions = definitions::translate(&configuration, layout, roots, env);
        let artifacts = artifacts::describe(info.version, &configuration);
        let link_info = linkinfo::resolve(&configuration);
        let patches = patch::patches(&configuration);

        tracing::debug!(
            "Plan for {}: {} requirements, {} definitions, {} libraries",
            info.reference(),
            requirements.len(),
            definitions.len(),
            artifacts.libs.len()
        );

        Self {
            reference: info.reference(),
            package_id: configuration.package_id(),
            configuration,
            requirements,
            definitions,
            artifacts,
            link_info,
            patches,
        }
    }
}
