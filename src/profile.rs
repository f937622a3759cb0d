//! Build profiles: settings, options and environment in one TOML file.
//!
//! ```toml
//! [settings]
//! os = "Linux"
//! arch = "x86_64"
//! compiler = "gcc"
//! "compiler.version" = "9"
//! "compiler.libcxx" = "libstdc++11"
//! build_type = "Release"
//!
//! [options]
//! shared = true
//! gtk = 2
//! parallel = "tbb"
//!
//! [env]
//! ANDROID_NDK_HOME = "/opt/android-ndk"
//! ```
//!
//! Sub-settings use quoted dotted keys. Nested tables are flattened the same
//! way, so `[settings.os]` with `api_level = 21` becomes `os.api_level`.
//! Values given on the command line override the profile.

use crate::definitions::BuildEnv;
use crate::error::{RecipeError, Result};
use anyhow::Context;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming the default profile
pub const PROFILE_ENV: &str = "CVR_PROFILE";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Profile {
    #[serde(default)]
    settings: toml::Table,
    #[serde(default)]
    options: toml::Table,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl Profile {
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read profile {}", path.display()))?;
        let profile = Self::parse(&content)?;
        tracing::debug!("Loaded profile {}", path.display());
        Ok(profile)
    }

    /// Profile named by `CVR_PROFILE`, if set
    pub fn default_path() -> Option<PathBuf> {
        std::env::var_os(PROFILE_ENV)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
    }

    /// Flat settings map
    pub fn settings(&self) -> Result<BTreeMap<String, String>> {
        flatten("settings", &self.settings)
    }

    /// Flat options map, booleans spelled `True`/`False`
    pub fn options(&self) -> Result<BTreeMap<String, String>> {
        flatten("options", &self.options)
    }

    /// Merge command line assignments over the profile
    pub fn merge(
        &self,
        settings: &[(String, String)],
        options: &[(String, String)],
    ) -> Result<(BTreeMap<String, String>, BTreeMap<String, String>)> {
        let mut merged_settings = self.settings()?;
        merged_settings.extend(settings.iter().cloned());
        let mut merged_options = self.options()?;
        merged_options.extend(options.iter().cloned());
        Ok((merged_settings, merged_options))
    }

    /// Build environment with profile variables taking precedence
    pub fn build_env(&self) -> BuildEnv {
        let mut env = BuildEnv::from_env();
        if let Some(ndk) = self.env.get("ANDROID_NDK_HOME") {
            env.android_ndk_home = Some(PathBuf::from(ndk));
        }
        if self.env.contains_key("CC") || self.env.contains_key("CXX") {
            env.compiler_from_env = true;
        }
        env
    }
}

fn flatten(section: &str, table: &toml::Table) -> Result<BTreeMap<String, String>> {
    let mut out = BTreeMap::new();
    flatten_into(section, "", table, &mut out)?;
    Ok(out)
}

fn flatten_into(
    section: &str,
    prefix: &str,
    table: &toml::Table,
    out: &mut BTreeMap<String, String>,
) -> Result<()> {
    for (key, value) in table {
        let key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        let rendered = match value {
            toml::Value::String(s) => s.clone(),
            toml::Value::Integer(i) => i.to_string(),
            toml::Value::Float(f) => f.to_string(),
            toml::Value::Boolean(true) => "True".to_string(),
            toml::Value::Boolean(false) => "False".to_string(),
            toml::Value::Table(nested) => {
                flatten_into(section, &key, nested, out)?;
                continue;
            }
            other => {
                return Err(RecipeError::InvalidSetting {
                    key: format!("{}.{}", section, key),
                    value: other.to_string(),
                    reason: "expected a string, number or boolean".to_string(),
                });
            }
        };
        out.insert(key, rendered);
    }
    Ok(())
}
