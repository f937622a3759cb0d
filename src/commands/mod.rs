//! Command implementations for the cvr CLI
//!
//! - **inspect**: read-only views of the option schema, plan and manifest
//! - **fetch**: source retrieval and system requirements
//! - **build**: CMake build and packaging

pub mod build;
pub mod fetch;
pub mod inspect;

pub use build::{build, package};
pub use fetch::{source, system_requirements};
pub use inspect::{inspect, manifest, options};

use crate::GlobalArgs;
use opencv_recipe::definitions::{BuildEnv, DependencyRoots};
use opencv_recipe::profile::Profile;
use opencv_recipe::requirements::Dependency;
use opencv_recipe::settings::{Arch, host_os};
use opencv_recipe::{
    Configuration, Layout, OptionSchema, Plan, RecipeError, RecipeInfo, Result, Settings,
};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Resolved inputs of one command run
pub struct Session {
    pub info: RecipeInfo,
    pub layout: Layout,
    pub plan: Plan,
    /// Profile `[env]` entries, passed to external tools
    pub env: BTreeMap<String, String>,
    pub build_env: BuildEnv,
}

impl Session {
    /// Load the profile, merge command line overrides and resolve the plan
    pub fn load(args: &GlobalArgs) -> Result<Self> {
        let profile = match args.profile.clone().or_else(Profile::default_path) {
            Some(path) => Profile::load(&path)?,
            None => Profile::default(),
        };

        let (mut settings, options) = profile.merge(&args.settings, &args.options)?;
        fill_host_defaults(&mut settings);

        let info = RecipeInfo::opencv();
        let configuration =
            Configuration::resolve(&OptionSchema::opencv(), Settings::from_map(&settings)?, &options)?;

        let package_folder = args
            .package_folder
            .clone()
            .unwrap_or_else(|| args.workdir.join("package"));
        let layout = Layout::new(args.workdir.clone(), package_folder);

        let roots = dependency_roots(&args.dep_roots)?;
        let build_env = profile.build_env();
        let plan = Plan::new(&info, configuration, &layout, &roots, &build_env);

        Ok(Self {
            info,
            layout,
            plan,
            env: profile.env,
            build_env,
        })
    }
}

/// Target the host when os or arch are not given
fn fill_host_defaults(settings: &mut BTreeMap<String, String>) {
    if !settings.contains_key("os")
        && let Some(os) = host_os()
    {
        settings.insert("os".to_string(), os.name().to_string());
    }
    if !settings.contains_key("arch")
        && let Some(arch) = Arch::host()
    {
        settings.insert("arch".to_string(), arch.as_str().to_string());
    }
}

fn dependency_roots(pairs: &[(String, String)]) -> Result<DependencyRoots> {
    let mut roots = DependencyRoots::new();
    for (name, path) in pairs {
        let dependency =
            Dependency::from_name(name).ok_or_else(|| RecipeError::InvalidSetting {
                key: "dep-root".to_string(),
                value: name.clone(),
                reason: "not a dependency of this recipe".to_string(),
            })?;
        roots.insert(dependency, PathBuf::from(path));
    }
    Ok(roots)
}
