//! Library interface for opencv-recipe (cvr)
//!
//! Maps a platform descriptor and a set of build options to everything a
//! package manager needs to build and consume OpenCV: dependency
//! declarations, CMake definitions, artifact names and platform link flags.
//!
//! ```no_run
//! use opencv_recipe::{Configuration, Layout, OptionSchema, Plan, RecipeInfo, Settings};
//! use opencv_recipe::definitions::{BuildEnv, DependencyRoots};
//! use std::collections::BTreeMap;
//!
//! fn main() -> opencv_recipe::Result<()> {
//!     let mut settings = BTreeMap::new();
//!     settings.insert("os".to_string(), "Linux".to_string());
//!     settings.insert("arch".to_string(), "x86_64".to_string());
//!     settings.insert("compiler".to_string(), "gcc".to_string());
//!     settings.insert("compiler.version".to_string(), "9".to_string());
//!
//!     let config = Configuration::resolve(
//!         &OptionSchema::opencv(),
//!         Settings::from_map(&settings)?,
//!         &BTreeMap::new(),
//!     )?;
//!     let plan = Plan::new(
//!         &RecipeInfo::opencv(),
//!         config,
//!         &Layout::new("build", "package"),
//!         &DependencyRoots::new(),
//!         &BuildEnv::from_env(),
//!     );
//!     for requirement in &plan.requirements {
//!         println!("{}", requirement);
//!     }
//!     Ok(())
//! }
//! ```

pub mod artifacts;
pub mod cmake;
pub mod configure;
pub mod definitions;
pub mod error;
pub mod layout;
pub mod linkinfo;
pub mod manifest;
pub mod options;
pub mod patch;
pub mod pkgconfig;
pub mod profile;
pub mod receipt;
pub mod recipe;
pub mod relocate;
pub mod requirements;
pub mod settings;
pub mod source;
pub mod system;

// Re-export commonly used types
pub use configure::Configuration;
pub use error::{RecipeError, Result};
pub use layout::Layout;
pub use options::OptionSchema;
pub use recipe::{Plan, RecipeInfo};
pub use settings::Settings;
