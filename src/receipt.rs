//! Package receipt generation and metadata.
//!
//! Every package folder produced by `cvr package` carries a
//! `RECIPE_RECEIPT.json` describing how it was built:
//!
//! ```text
//! <package>/
//!   RECIPE_RECEIPT.json     # Settings, options and requirements of this build
//!   include/
//!   lib/
//!   licenses/LICENSE
//! ```
//!
//! The receipt lets a later run tell whether an existing package folder
//! matches the requested configuration (same `package_id`) without
//! rebuilding it.
//!
//! # Examples
//!
//! ```no_run
//! use opencv_recipe::receipt::RecipeReceipt;
//! use std::path::Path;
//!
//! fn main() -> opencv_recipe::Result<()> {
//!     let receipt = RecipeReceipt::read(Path::new("/work/package"))?;
//!
//!     println!("Built with: {}", receipt.tool_version);
//!     println!("Package id: {}", receipt.package_id);
//!     println!("Requirements: {}", receipt.requires.len());
//!
//!     Ok(())
//! }
//! ```

use crate::error::Result;
use crate::recipe::Plan;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const RECEIPT_FILE: &str = "RECIPE_RECEIPT.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeReceipt {
    pub tool_version: String,
    /// `name/version` of the package
    pub reference: String,
    pub package_id: String,
    #[serde(default)]
    pub settings: BTreeMap<String, String>,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
    #[serde(default)]
    pub requires: Vec<String>,
    /// Unix timestamp of the packaging step
    pub time: i64,
}

impl RecipeReceipt {
    /// Read an existing RECIPE_RECEIPT.json file
    pub fn read(package_folder: &Path) -> Result<Self> {
        let receipt_path = package_folder.join(RECEIPT_FILE);
        let contents = fs::read_to_string(&receipt_path)
            .with_context(|| format!("Failed to read receipt: {}", receipt_path.display()))?;

        let receipt: Self =
            serde_json::from_str(&contents).context("Failed to parse RECIPE_RECEIPT.json")?;

        Ok(receipt)
    }

    /// Create a receipt for a packaged plan
    pub fn new(plan: &Plan) -> Self {
        Self {
            tool_version: format!("cvr/{}", env!("CARGO_PKG_VERSION")),
            reference: plan.reference.clone(),
            package_id: plan.package_id.clone(),
            settings: plan.configuration.settings.to_map(),
            options: plan
                .configuration
                .values()
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            requires: plan
                .requirements
                .iter()
                .map(|r| r.reference.to_string())
                .collect(),
            time: chrono::Utc::now().timestamp(),
        }
    }

    /// Write receipt to RECIPE_RECEIPT.json
    pub fn write(&self, package_folder: &Path) -> Result<()> {
        let receipt_path = package_folder.join(RECEIPT_FILE);
        let json =
            serde_json::to_string_pretty(self).context("Failed to serialize recipe receipt")?;

        fs::write(&receipt_path, json)
            .with_context(|| format!("Failed to write receipt: {}", receipt_path.display()))?;

        Ok(())
    }

    /// Installation time in the local timezone, for display
    pub fn installed_at(&self) -> Option<chrono::DateTime<chrono::Local>> {
        chrono::DateTime::from_timestamp(self.time, 0).map(|utc| utc.with_timezone(&chrono::Local))
    }
}
