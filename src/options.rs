//! Option schema: every build option the recipe accepts.
//!
//! The schema is an immutable value. It lists each option's legal values, its
//! default, the platforms it applies to, the option it depends on and whether
//! it survives cross-compilation. Resolution against user input happens in
//! [`crate::configure`].

use crate::error::{RecipeError, Result};
use crate::settings::Os;
use serde::Serialize;
use std::fmt;

/// Which target platforms an option exists on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Applicability {
    All,
    /// Only on the named OS families
    Only(&'static [&'static str]),
    /// Removed on the named OS families
    Except(&'static [&'static str]),
}

impl Applicability {
    pub fn applies_to(&self, os: &Os) -> bool {
        match self {
            Self::All => true,
            Self::Only(names) => names.contains(&os.name()),
            Self::Except(names) => !names.contains(&os.name()),
        }
    }
}

impl fmt::Display for Applicability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all platforms"),
            Self::Only(names) => write!(f, "only {}", names.join(", ")),
            Self::Except(names) => write!(f, "not on {}", names.join(", ")),
        }
    }
}

/// Declaration of one build option
#[derive(Debug, Clone, Serialize)]
pub struct OptionDecl {
    pub name: &'static str,
    pub legal: &'static [&'static str],
    pub default: &'static str,
    pub applicability: Applicability,
    /// Options that must all be enabled for this one to be enabled
    pub requires: &'static [&'static str],
    /// Forced off when cross-compiling
    pub cross_incompatible: bool,
    pub help: &'static str,
}

impl OptionDecl {
    fn flag(name: &'static str, default: bool, help: &'static str) -> Self {
        Self {
            name,
            legal: BOOL_VALUES,
            default: if default { "True" } else { "False" },
            applicability: Applicability::All,
            requires: &[],
            cross_incompatible: false,
            help,
        }
    }

    fn only(mut self, applicability: Applicability) -> Self {
        self.applicability = applicability;
        self
    }

    fn requires(mut self, prerequisites: &'static [&'static str]) -> Self {
        self.requires = prerequisites;
        self
    }

    fn cross_incompatible(mut self) -> Self {
        self.cross_incompatible = true;
        self
    }

    /// Normalize a user-supplied value to its canonical spelling
    ///
    /// Matching ignores ASCII case, so `true`, `none` and `TBB` are accepted.
    pub fn normalize(&self, value: &str) -> Result<&'static str> {
        let value = value.trim();
        self.legal
            .iter()
            .find(|legal| legal.eq_ignore_ascii_case(value))
            .copied()
            .ok_or_else(|| RecipeError::InvalidOptionValue {
                option: self.name.to_string(),
                value: value.to_string(),
                legal: self.legal.join(", "),
            })
    }
}

pub const BOOL_VALUES: &[&str] = &["True", "False"];

/// Pairs of options that may not both be enabled
pub type Conflict = (&'static str, &'static str);

/// The complete, immutable option schema
#[derive(Debug, Clone, Serialize)]
pub struct OptionSchema {
    options: Vec<OptionDecl>,
    conflicts: Vec<Conflict>,
}

impl OptionSchema {
    /// Canonical schema for the OpenCV recipe
    pub fn opencv() -> Self {
        const NOT_WINDOWS: Applicability = Applicability::Except(&["Windows"]);
        const LINUX_ONLY: Applicability = Applicability::Only(&["Linux"]);
        const CUDA_PLATFORMS: Applicability = Applicability::Except(&["Macos", "Android", "iOS"]);

        let options = vec![
            OptionDecl::flag("shared", false, "Build shared libraries"),
            OptionDecl::flag("fPIC", true, "Position-independent code").only(NOT_WINDOWS),
            OptionDecl::flag("contrib", false, "Build the opencv_contrib modules"),
            OptionDecl::flag("contrib_freetype", false, "Contrib freetype module")
                .requires(&["contrib"]),
            OptionDecl::flag("contrib_sfm", false, "Contrib structure-from-motion module")
                .requires(&["contrib", "eigen"]),
            OptionDecl::flag("jpeg", true, "JPEG support through libjpeg"),
            OptionDecl::flag("jpeg_turbo", false, "JPEG support through libjpeg-turbo"),
            OptionDecl::flag("tiff", true, "TIFF support"),
            OptionDecl::flag("webp", true, "WebP support"),
            OptionDecl::flag("png", true, "PNG support"),
            OptionDecl::flag("jasper", true, "JPEG 2000 support through jasper"),
            OptionDecl::flag("openexr", true, "OpenEXR HDR image support").cross_incompatible(),
            OptionDecl::flag("eigen", false, "Eigen interoperability"),
            OptionDecl {
                name: "gtk",
                legal: &["None", "2", "3"],
                default: "3",
                applicability: LINUX_ONLY,
                requires: &[],
                cross_incompatible: false,
                help: "GTK major version for highgui",
            },
            OptionDecl::flag("nonfree", false, "Enable patented algorithms"),
            OptionDecl {
                name: "parallel",
                legal: &["False", "tbb", "openmp"],
                default: "False",
                applicability: Applicability::All,
                requires: &[],
                cross_incompatible: false,
                help: "Parallel framework backend",
            },
            OptionDecl::flag("cuda", false, "CUDA acceleration").only(CUDA_PLATFORMS),
            OptionDecl::flag("cublas", false, "cuBLAS support")
                .only(CUDA_PLATFORMS)
                .requires(&["cuda"]),
            OptionDecl::flag("cufft", false, "cuFFT support")
                .only(CUDA_PLATFORMS)
                .requires(&["cuda"]),
        ];

        // jasper links libjpeg; mixing in libjpeg-turbo fails its version check
        let conflicts = vec![("jpeg", "jpeg_turbo"), ("jasper", "jpeg_turbo")];

        Self { options, conflicts }
    }

    pub fn iter(&self) -> impl Iterator<Item = &OptionDecl> {
        self.options.iter()
    }

    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    /// Look up an option, suggesting the closest name when it is unknown
    pub fn get(&self, name: &str) -> Result<&OptionDecl> {
        self.options
            .iter()
            .find(|decl| decl.name == name)
            .ok_or_else(|| RecipeError::UnknownOption {
                name: name.to_string(),
                suggestion: self.suggest(name),
            })
    }

    fn suggest(&self, name: &str) -> Option<String> {
        self.options
            .iter()
            .map(|decl| (decl.name, strsim::jaro_winkler(name, decl.name)))
            .filter(|(_, score)| *score > 0.8)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(best, _)| best.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_legal() {
        let schema = OptionSchema::opencv();
        for decl in schema.iter() {
            assert!(
                decl.legal.contains(&decl.default),
                "default of {} is not legal",
                decl.name
            );
        }
    }

    #[test]
    fn test_prerequisites_and_conflicts_name_known_options() {
        let schema = OptionSchema::opencv();
        for decl in schema.iter() {
            for req in decl.requires {
                assert!(schema.get(req).is_ok(), "{} requires unknown {}", decl.name, req);
            }
        }
        for (a, b) in schema.conflicts() {
            assert!(schema.get(a).is_ok());
            assert!(schema.get(b).is_ok());
        }
    }

    #[test]
    fn test_unknown_option_suggests_closest() {
        let schema = OptionSchema::opencv();
        let err = schema.get("jpg").unwrap_err();
        match err {
            RecipeError::UnknownOption { name, suggestion } => {
                assert_eq!(name, "jpg");
                assert_eq!(suggestion.as_deref(), Some("jpeg"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = schema.get("zzzzzz").unwrap_err();
        assert!(matches!(err, RecipeError::UnknownOption { suggestion: None, .. }));
    }

    #[test]
    fn test_normalize_values() {
        let schema = OptionSchema::opencv();
        let jpeg = schema.get("jpeg").unwrap();
        assert_eq!(jpeg.normalize("true").unwrap(), "True");
        assert_eq!(jpeg.normalize("FALSE").unwrap(), "False");
        assert!(jpeg.normalize("yes").is_err());

        let gtk = schema.get("gtk").unwrap();
        assert_eq!(gtk.normalize("2").unwrap(), "2");
        let err = gtk.normalize("4").unwrap_err();
        assert_eq!(err.option(), Some("gtk"));
    }

    #[test]
    fn test_applicability() {
        let schema = OptionSchema::opencv();
        let fpic = schema.get("fPIC").unwrap();
        assert!(!fpic.applicability.applies_to(&Os::Windows));
        assert!(fpic.applicability.applies_to(&Os::Linux));

        let gtk = schema.get("gtk").unwrap();
        assert!(gtk.applicability.applies_to(&Os::Linux));
        assert!(!gtk.applicability.applies_to(&Os::Macos));

        let cuda = schema.get("cuda").unwrap();
        assert!(!cuda.applicability.applies_to(&Os::Android { api_level: 21 }));
        assert!(cuda.applicability.applies_to(&Os::Windows));
    }

    #[test]
    fn test_sfm_requires_contrib_and_eigen() {
        let schema = OptionSchema::opencv();
        let sfm = schema.get("contrib_sfm").unwrap();
        assert_eq!(sfm.requires, &["contrib", "eigen"]);
    }
}
