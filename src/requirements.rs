//! Dependency selection: which packages the configuration needs.
//!
//! Each enabled feature maps to its package declarations. Declarations are
//! typed ([`Dependency`]) rather than keyed by string. Versions are pinned in
//! one table here.

use crate::configure::{Configuration, JpegBackend, ParallelBackend};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Every third-party package the recipe may depend on
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Dependency {
    Zlib,
    Libjpeg,
    LibjpegTurbo,
    Libtiff,
    Libwebp,
    Libpng,
    Jasper,
    Openexr,
    Eigen,
    Tbb,
    Freetype,
    Harfbuzz,
    Gflags,
    Glog,
}

impl Dependency {
    pub const ALL: &'static [Dependency] = &[
        Self::Zlib,
        Self::Libjpeg,
        Self::LibjpegTurbo,
        Self::Libtiff,
        Self::Libwebp,
        Self::Libpng,
        Self::Jasper,
        Self::Openexr,
        Self::Eigen,
        Self::Tbb,
        Self::Freetype,
        Self::Harfbuzz,
        Self::Gflags,
        Self::Glog,
    ];

    /// Look up a dependency by package name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|d| d.name() == name)
    }

    /// Package name as known to the package manager
    pub fn name(&self) -> &'static str {
        match self {
            Self::Zlib => "zlib",
            Self::Libjpeg => "libjpeg",
            Self::LibjpegTurbo => "libjpeg-turbo",
            Self::Libtiff => "libtiff",
            Self::Libwebp => "libwebp",
            Self::Libpng => "libpng",
            Self::Jasper => "jasper",
            Self::Openexr => "openexr",
            Self::Eigen => "eigen",
            Self::Tbb => "tbb",
            Self::Freetype => "freetype",
            Self::Harfbuzz => "harfbuzz",
            Self::Gflags => "gflags",
            Self::Glog => "glog",
        }
    }

    /// Pinned `name/version@user/channel` reference
    pub fn reference(&self) -> &'static str {
        match self {
            Self::Zlib => "zlib/1.2.11@conan/stable",
            Self::Libjpeg => "libjpeg/9c@bincrafters/stable",
            Self::LibjpegTurbo => "libjpeg-turbo/1.5.2@bincrafters/stable",
            Self::Libtiff => "libtiff/4.0.9@bincrafters/stable",
            Self::Libwebp => "libwebp/1.0.0@bincrafters/stable",
            Self::Libpng => "libpng/1.6.34@bincrafters/stable",
            Self::Jasper => "jasper/2.0.14@conan/stable",
            Self::Openexr => "openexr/2.3.0@conan/stable",
            Self::Eigen => "eigen/3.3.7@conan/stable",
            Self::Tbb => "tbb/2019_u9@conan/stable",
            Self::Freetype => "freetype/2.9.1@bincrafters/stable",
            Self::Harfbuzz => "harfbuzz/2.4.0@bincrafters/stable",
            Self::Gflags => "gflags/2.2.2@bincrafters/stable",
            Self::Glog => "glog/0.4.0@bincrafters/stable",
        }
    }

    /// Version component of the pinned reference
    pub fn version(&self) -> &'static str {
        let reference = self.reference();
        let name_version = reference.split('@').next().unwrap_or(reference);
        name_version.split('/').nth(1).unwrap_or("")
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reference())
    }
}

/// One requirement emitted by the recipe
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyDeclaration {
    pub dependency: Dependency,
    pub reference: &'static str,
    /// Options forwarded to the dependency's own recipe
    pub options: BTreeMap<String, String>,
}

impl DependencyDeclaration {
    fn new(dependency: Dependency) -> Self {
        Self {
            dependency,
            reference: dependency.reference(),
            options: BTreeMap::new(),
        }
    }

    fn with_option(mut self, name: &str, value: impl ToString) -> Self {
        self.options.insert(name.to_string(), value.to_string());
        self
    }
}

impl fmt::Display for DependencyDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reference)?;
        if !self.options.is_empty() {
            let opts: Vec<String> = self
                .options
                .iter()
                .map(|(k, v)| format!("{}:{}={}", self.dependency.name(), k, v))
                .collect();
            write!(f, " ({})", opts.join(", "))?;
        }
        Ok(())
    }
}

/// Select the dependency declarations for a configuration
///
/// The order is fixed: zlib first, then codecs, then optional features.
pub fn select(config: &Configuration) -> Vec<DependencyDeclaration> {
    let opts = &config.options;
    let jpeg_on = opts.jpeg.is_some();
    let python_bool = |b: bool| if b { "True" } else { "False" };

    let mut deps = vec![DependencyDeclaration::new(Dependency::Zlib)];

    match opts.jpeg {
        Some(JpegBackend::Libjpeg) => deps.push(DependencyDeclaration::new(Dependency::Libjpeg)),
        Some(JpegBackend::LibjpegTurbo) => {
            deps.push(DependencyDeclaration::new(Dependency::LibjpegTurbo))
        }
        None => {}
    }
    if opts.tiff {
        deps.push(
            DependencyDeclaration::new(Dependency::Libtiff).with_option("jpeg", python_bool(jpeg_on)),
        );
    }
    if opts.webp {
        deps.push(DependencyDeclaration::new(Dependency::Libwebp));
    }
    if opts.png {
        deps.push(DependencyDeclaration::new(Dependency::Libpng));
    }
    if opts.jasper {
        deps.push(
            DependencyDeclaration::new(Dependency::Jasper).with_option("jpeg", python_bool(jpeg_on)),
        );
    }
    if opts.openexr {
        deps.push(DependencyDeclaration::new(Dependency::Openexr));
    }
    if opts.eigen {
        deps.push(DependencyDeclaration::new(Dependency::Eigen));
    }
    if opts.parallel == Some(ParallelBackend::Tbb) {
        deps.push(
            DependencyDeclaration::new(Dependency::Tbb).with_option("shared", python_bool(opts.shared)),
        );
    }
    if let Some(contrib) = opts.contrib {
        if contrib.freetype {
            deps.push(DependencyDeclaration::new(Dependency::Freetype));
            deps.push(DependencyDeclaration::new(Dependency::Harfbuzz));
        }
        if contrib.sfm {
            deps.push(DependencyDeclaration::new(Dependency::Gflags));
            deps.push(DependencyDeclaration::new(Dependency::Glog));
        }
    }

    tracing::debug!(
        "Selected {} requirements: {}",
        deps.len(),
        deps.iter()
            .map(|d| d.reference)
            .collect::<Vec<_>>()
            .join(", ")
    );
    deps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::OptionSchema;
    use crate::settings::Settings;

    fn resolve(os: &str, arch: &str, pairs: &[(&str, &str)]) -> Configuration {
        let settings: BTreeMap<String, String> = [
            ("os", os),
            ("compiler", "gcc"),
            ("compiler.version", "9"),
            ("arch", arch),
            ("build_type", "Release"),
            ("os_build", "Linux"),
            ("arch_build", "x86_64"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let options = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Configuration::resolve(
            &OptionSchema::opencv(),
            Settings::from_map(&settings).unwrap(),
            &options,
        )
        .unwrap()
    }

    fn names(deps: &[DependencyDeclaration]) -> Vec<&'static str> {
        deps.iter().map(|d| d.dependency.name()).collect()
    }

    #[test]
    fn test_default_requirements() {
        let deps = select(&resolve("Linux", "x86_64", &[]));
        assert_eq!(
            names(&deps),
            vec!["zlib", "libjpeg", "libtiff", "libwebp", "libpng", "jasper", "openexr"]
        );
    }

    #[test]
    fn test_jpeg_only_example() {
        let deps = select(&resolve(
            "Linux",
            "x86_64",
            &[("jpeg", "True"), ("tiff", "False"), ("gtk", "None")],
        ));
        let jpeg: Vec<_> = deps
            .iter()
            .filter(|d| matches!(d.dependency, Dependency::Libjpeg | Dependency::LibjpegTurbo))
            .collect();
        assert_eq!(jpeg.len(), 1);
        assert!(deps.iter().all(|d| d.dependency != Dependency::Libtiff));
        assert!(deps.iter().all(|d| !d.dependency.name().contains("gtk")));
    }

    #[test]
    fn test_cross_build_drops_openexr() {
        let deps = select(&resolve("Linux", "armv8", &[("openexr", "True")]));
        assert!(deps.iter().all(|d| d.dependency != Dependency::Openexr));
    }

    #[test]
    fn test_disabled_options_declare_nothing() {
        let deps = select(&resolve(
            "Linux",
            "x86_64",
            &[
                ("jpeg", "False"),
                ("tiff", "False"),
                ("webp", "False"),
                ("png", "False"),
                ("jasper", "False"),
                ("openexr", "False"),
            ],
        ));
        assert_eq!(names(&deps), vec!["zlib"]);
    }

    #[test]
    fn test_optional_features() {
        let deps = select(&resolve(
            "Linux",
            "x86_64",
            &[
                ("eigen", "True"),
                ("parallel", "tbb"),
                ("contrib", "True"),
                ("contrib_freetype", "True"),
                ("contrib_sfm", "True"),
            ],
        ));
        let names = names(&deps);
        for expected in ["eigen", "tbb", "freetype", "harfbuzz", "gflags", "glog"] {
            assert!(names.contains(&expected), "missing {}", expected);
        }

        let openmp = select(&resolve("Linux", "x86_64", &[("parallel", "openmp")]));
        assert!(openmp.iter().all(|d| d.dependency != Dependency::Tbb));
    }

    #[test]
    fn test_forwarded_options() {
        let deps = select(&resolve("Linux", "x86_64", &[("jpeg", "False")]));
        let tiff = deps
            .iter()
            .find(|d| d.dependency == Dependency::Libtiff)
            .unwrap();
        assert_eq!(tiff.options.get("jpeg").map(String::as_str), Some("False"));
        assert_eq!(tiff.to_string(), "libtiff/4.0.9@bincrafters/stable (libtiff:jpeg=False)");
    }

    #[test]
    fn test_reference_parts() {
        assert_eq!(Dependency::Openexr.version(), "2.3.0");
        assert_eq!(Dependency::Tbb.version(), "2019_u9");
        assert_eq!(Dependency::Libjpeg.name(), "libjpeg");
    }

    #[test]
    fn test_from_name() {
        assert_eq!(Dependency::from_name("openexr"), Some(Dependency::Openexr));
        assert_eq!(Dependency::from_name("libjpeg-turbo"), Some(Dependency::LibjpegTurbo));
        assert_eq!(Dependency::from_name("ffmpeg"), None);
        assert!(Dependency::ALL.iter().all(|d| Dependency::from_name(d.name()) == Some(*d)));
    }
}
