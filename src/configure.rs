//! Option resolution: raw `name=value` pairs to a typed configuration.
//!
//! This is the only place option combinations are checked. The resulting
//! [`Configuration`] uses tagged variants, so later stages cannot see an
//! invalid combination. Resolution order:
//!
//! 1. Reject unsupported compilers before anything else happens.
//! 2. Validate every supplied name and value against the [`OptionSchema`].
//! 3. Drop options that do not exist on the target platform.
//! 4. Force cross-build-incompatible options off when cross-compiling.
//! 5. Reject explicitly enabled options whose prerequisite is off.
//! 6. Reject enabled conflicting pairs.

use crate::error::{RecipeError, Result};
use crate::options::OptionSchema;
use crate::settings::{Compiler, Settings};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};

/// Minimum Visual Studio major version (2015)
const MIN_VISUAL_STUDIO: u32 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JpegBackend {
    Libjpeg,
    LibjpegTurbo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GtkVersion {
    Gtk2,
    Gtk3,
}

impl GtkVersion {
    /// pkg-config module name
    pub fn pkg_config_module(&self) -> &'static str {
        match self {
            Self::Gtk2 => "gtk+-2.0",
            Self::Gtk3 => "gtk+-3.0",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParallelBackend {
    Tbb,
    Openmp,
}

/// Enabled contrib modules with their optional sub-modules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Contrib {
    pub freetype: bool,
    pub sfm: bool,
}

/// Enabled CUDA acceleration with its optional libraries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Cuda {
    pub cublas: bool,
    pub cufft: bool,
}

/// Typed option values after resolution
///
/// `None` means disabled or not available on the target platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Options {
    pub shared: bool,
    pub fpic: Option<bool>,
    pub contrib: Option<Contrib>,
    pub jpeg: Option<JpegBackend>,
    pub tiff: bool,
    pub webp: bool,
    pub png: bool,
    pub jasper: bool,
    pub openexr: bool,
    pub eigen: bool,
    pub gtk: Option<GtkVersion>,
    pub nonfree: bool,
    pub parallel: Option<ParallelBackend>,
    pub cuda: Option<Cuda>,
}

/// A validated option set bound to the settings it was resolved for
#[derive(Debug, Clone, Serialize)]
pub struct Configuration {
    pub settings: Settings,
    pub options: Options,
    /// Effective value of every option that exists on the target platform
    values: BTreeMap<&'static str, &'static str>,
}

impl Configuration {
    /// Resolve raw options against the schema for the given settings
    pub fn resolve(
        schema: &OptionSchema,
        settings: Settings,
        raw: &BTreeMap<String, String>,
    ) -> Result<Self> {
        check_compiler(&settings)?;

        let mut explicit = BTreeMap::new();
        for (name, value) in raw {
            let decl = schema.get(name)?;
            explicit.insert(decl.name, decl.normalize(value)?);
        }

        let mut values = BTreeMap::new();
        for decl in schema.iter() {
            if !decl.applicability.applies_to(&settings.os) {
                if explicit.contains_key(decl.name) {
                    tracing::warn!(
                        "Option '{}' does not apply to {} and is ignored",
                        decl.name,
                        settings.os
                    );
                }
                continue;
            }

            let mut value = explicit.get(decl.name).copied().unwrap_or(decl.default);
            if decl.cross_incompatible && settings.is_cross_building() && is_enabled(value) {
                tracing::warn!(
                    "Option '{}' is not supported when cross-building and is disabled",
                    decl.name
                );
                value = "False";
            }
            values.insert(decl.name, value);
        }

        let mut dropped = BTreeSet::new();
        for decl in schema.iter() {
            if !values.get(decl.name).is_some_and(|v| is_enabled(v)) {
                continue;
            }
            let missing = decl
                .requires
                .iter()
                .find(|prerequisite| !values.get(*prerequisite).is_some_and(|v| is_enabled(v)));
            let Some(prerequisite) = missing else {
                continue;
            };
            if explicit.contains_key(decl.name) {
                return Err(RecipeError::MissingPrerequisite {
                    option: decl.name.to_string(),
                    prerequisite: prerequisite.to_string(),
                });
            }
            dropped.insert(decl.name);
        }
        for name in dropped {
            values.insert(name, "False");
        }

        for &(first, second) in schema.conflicts() {
            let on = |name: &str| values.get(name).is_some_and(|v| is_enabled(v));
            if on(first) && on(second) {
                return Err(RecipeError::ConflictingOptions {
                    first: first.to_string(),
                    second: second.to_string(),
                });
            }
        }

        let options = Options::from_values(&values);
        tracing::debug!("Resolved options: {:?}", options);

        Ok(Self {
            settings,
            options,
            values,
        })
    }

    /// Effective option values, sorted by name
    pub fn values(&self) -> &BTreeMap<&'static str, &'static str> {
        &self.values
    }

    pub fn is_cross_building(&self) -> bool {
        self.settings.is_cross_building()
    }

    /// Stable identifier of this settings and options combination
    pub fn package_id(&self) -> String {
        let mut hasher = Sha256::new();
        for (key, value) in self.settings.to_map() {
            if key == "os_build" || key == "arch_build" {
                continue;
            }
            hasher.update(format!("{}={}\n", key, value));
        }
        for (key, value) in &self.values {
            hasher.update(format!("{}={}\n", key, value));
        }
        format!("{:x}", hasher.finalize())
    }
}

impl Options {
    fn from_values(values: &BTreeMap<&'static str, &'static str>) -> Self {
        let flag = |name: &str| values.get(name).is_some_and(|v| is_enabled(v));

        let contrib = flag("contrib").then(|| Contrib {
            freetype: flag("contrib_freetype"),
            sfm: flag("contrib_sfm"),
        });
        let cuda = flag("cuda").then(|| Cuda {
            cublas: flag("cublas"),
            cufft: flag("cufft"),
        });
        let jpeg = if flag("jpeg") {
            Some(JpegBackend::Libjpeg)
        } else if flag("jpeg_turbo") {
            Some(JpegBackend::LibjpegTurbo)
        } else {
            None
        };
        let gtk = match values.get("gtk").copied() {
            Some("2") => Some(GtkVersion::Gtk2),
            Some("3") => Some(GtkVersion::Gtk3),
            _ => None,
        };
        let parallel = match values.get("parallel").copied() {
            Some("tbb") => Some(ParallelBackend::Tbb),
            Some("openmp") => Some(ParallelBackend::Openmp),
            _ => None,
        };

        Self {
            shared: flag("shared"),
            fpic: values.get("fPIC").map(|v| is_enabled(v)),
            contrib,
            jpeg,
            tiff: flag("tiff"),
            webp: flag("webp"),
            png: flag("png"),
            jasper: flag("jasper"),
            openexr: flag("openexr"),
            eigen: flag("eigen"),
            gtk,
            nonfree: flag("nonfree"),
            parallel,
            cuda,
        }
    }
}

fn check_compiler(settings: &Settings) -> Result<()> {
    let compiler = &settings.compiler;
    let Compiler::VisualStudio { version, .. } = compiler else {
        return Ok(());
    };
    if version.major() < MIN_VISUAL_STUDIO {
        return Err(RecipeError::UnsupportedCompiler {
            compiler: compiler.name().to_string(),
            version: version.to_string(),
            reason: "OpenCV 4.x requires Visual Studio 2015 and higher".to_string(),
        });
    }
    if settings.arch.msvc_platform().is_none() {
        return Err(RecipeError::UnsupportedCompiler {
            compiler: compiler.name().to_string(),
            version: version.to_string(),
            reason: format!("Visual Studio cannot target {}", settings.arch),
        });
    }
    Ok(())
}

/// Anything other than `False`/`None` turns an option on
fn is_enabled(value: &str) -> bool {
    value != "False" && value != "None"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linux() -> Settings {
        settings(&[("os", "Linux"), ("compiler", "gcc"), ("compiler.version", "9")])
    }

    fn settings(pairs: &[(&str, &str)]) -> Settings {
        let mut map: BTreeMap<String, String> = [
            ("arch", "x86_64"),
            ("build_type", "Release"),
            ("os_build", "Linux"),
            ("arch_build", "x86_64"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        for (k, v) in pairs {
            map.insert(k.to_string(), v.to_string());
        }
        Settings::from_map(&map).unwrap()
    }

    fn options(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config =
            Configuration::resolve(&OptionSchema::opencv(), linux(), &BTreeMap::new()).unwrap();
        let opts = &config.options;
        assert!(!opts.shared);
        assert_eq!(opts.fpic, Some(true));
        assert_eq!(opts.jpeg, Some(JpegBackend::Libjpeg));
        assert!(opts.tiff && opts.webp && opts.png && opts.jasper && opts.openexr);
        assert_eq!(opts.gtk, Some(GtkVersion::Gtk3));
        assert_eq!(opts.contrib, None);
        assert_eq!(opts.parallel, None);
        assert_eq!(opts.cuda, None);
    }

    #[test]
    fn test_old_visual_studio_rejected() {
        let vs12 = settings(&[
            ("os", "Windows"),
            ("compiler", "Visual Studio"),
            ("compiler.version", "12"),
            ("os_build", "Windows"),
        ]);
        let err = Configuration::resolve(&OptionSchema::opencv(), vs12, &BTreeMap::new())
            .unwrap_err();
        assert!(matches!(err, RecipeError::UnsupportedCompiler { .. }));
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_visual_studio_rejects_old_arm() {
        let armv6 = settings(&[
            ("os", "Windows"),
            ("compiler", "Visual Studio"),
            ("compiler.version", "15"),
            ("os_build", "Windows"),
            ("arch", "armv6"),
        ]);
        let err = Configuration::resolve(&OptionSchema::opencv(), armv6, &BTreeMap::new())
            .unwrap_err();
        assert!(matches!(err, RecipeError::UnsupportedCompiler { .. }));
    }

    #[test]
    fn test_windows_drops_fpic_and_gtk() {
        let vs15 = settings(&[
            ("os", "Windows"),
            ("compiler", "Visual Studio"),
            ("compiler.version", "15"),
            ("os_build", "Windows"),
        ]);
        let config = Configuration::resolve(
            &OptionSchema::opencv(),
            vs15,
            &options(&[("fPIC", "True"), ("gtk", "2")]),
        )
        .unwrap();
        assert_eq!(config.options.fpic, None);
        assert_eq!(config.options.gtk, None);
        assert!(!config.values().contains_key("fPIC"));
        assert!(!config.values().contains_key("gtk"));
    }

    #[test]
    fn test_cross_build_disables_openexr() {
        let cross = settings(&[
            ("os", "Linux"),
            ("compiler", "gcc"),
            ("compiler.version", "9"),
            ("arch", "armv8"),
        ]);
        let config = Configuration::resolve(
            &OptionSchema::opencv(),
            cross,
            &options(&[("openexr", "True")]),
        )
        .unwrap();
        assert!(config.is_cross_building());
        assert!(!config.options.openexr);
    }

    #[test]
    fn test_prerequisite_missing_is_error() {
        let err = Configuration::resolve(
            &OptionSchema::opencv(),
            linux(),
            &options(&[("cublas", "True")]),
        )
        .unwrap_err();
        assert!(matches!(err, RecipeError::MissingPrerequisite { .. }));
        assert_eq!(err.option(), Some("cublas"));

        let err = Configuration::resolve(
            &OptionSchema::opencv(),
            linux(),
            &options(&[("contrib_sfm", "True")]),
        )
        .unwrap_err();
        assert_eq!(err.option(), Some("contrib_sfm"));
    }

    #[test]
    fn test_prerequisite_satisfied() {
        let config = Configuration::resolve(
            &OptionSchema::opencv(),
            linux(),
            &options(&[
                ("cuda", "True"),
                ("cufft", "True"),
                ("contrib", "True"),
                ("contrib_freetype", "True"),
            ]),
        )
        .unwrap();
        assert_eq!(
            config.options.cuda,
            Some(Cuda {
                cublas: false,
                cufft: true
            })
        );
        assert_eq!(
            config.options.contrib,
            Some(Contrib {
                freetype: true,
                sfm: false
            })
        );
    }

    #[test]
    fn test_sfm_needs_eigen() {
        let schema = OptionSchema::opencv();
        let err = Configuration::resolve(
            &schema,
            linux(),
            &options(&[("contrib", "True"), ("contrib_sfm", "True")]),
        )
        .unwrap_err();
        match err {
            RecipeError::MissingPrerequisite {
                option,
                prerequisite,
            } => {
                assert_eq!(option, "contrib_sfm");
                assert_eq!(prerequisite, "eigen");
            }
            other => panic!("unexpected error: {other}"),
        }

        let config = Configuration::resolve(
            &schema,
            linux(),
            &options(&[("contrib", "True"), ("contrib_sfm", "True"), ("eigen", "True")]),
        )
        .unwrap();
        assert_eq!(config.options.contrib.map(|c| c.sfm), Some(true));
        assert!(config.options.eigen);
    }

    #[test]
    fn test_conflicting_jpeg_backends() {
        let err = Configuration::resolve(
            &OptionSchema::opencv(),
            linux(),
            &options(&[("jpeg", "True"), ("jpeg_turbo", "True")]),
        )
        .unwrap_err();
        match err {
            RecipeError::ConflictingOptions { first, second } => {
                assert_eq!(first, "jpeg");
                assert_eq!(second, "jpeg_turbo");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_jpeg_turbo_conflicts_with_jasper() {
        let err = Configuration::resolve(
            &OptionSchema::opencv(),
            linux(),
            &options(&[("jpeg", "False"), ("jpeg_turbo", "True")]),
        )
        .unwrap_err();
        assert!(matches!(err, RecipeError::ConflictingOptions { .. }));

        let config = Configuration::resolve(
            &OptionSchema::opencv(),
            linux(),
            &options(&[("jpeg", "False"), ("jpeg_turbo", "True"), ("jasper", "False")]),
        )
        .unwrap();
        assert_eq!(config.options.jpeg, Some(JpegBackend::LibjpegTurbo));
    }

    #[test]
    fn test_unknown_and_invalid_values() {
        let err = Configuration::resolve(
            &OptionSchema::opencv(),
            linux(),
            &options(&[("tif", "True")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("did you mean 'tiff'"));

        let err = Configuration::resolve(
            &OptionSchema::opencv(),
            linux(),
            &options(&[("parallel", "cilk")]),
        )
        .unwrap_err();
        assert_eq!(err.option(), Some("parallel"));
    }

    #[test]
    fn test_package_id_is_stable_and_option_sensitive() {
        let schema = OptionSchema::opencv();
        let a = Configuration::resolve(&schema, linux(), &BTreeMap::new()).unwrap();
        let b = Configuration::resolve(&schema, linux(), &BTreeMap::new()).unwrap();
        let c = Configuration::resolve(&schema, linux(), &options(&[("png", "False")])).unwrap();
        assert_eq!(a.package_id(), b.package_id());
        assert_ne!(a.package_id(), c.package_id());
        assert_eq!(a.package_id().len(), 64);
    }
}
