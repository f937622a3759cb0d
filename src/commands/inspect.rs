//! Read-only commands: option schema, resolved plan and package manifest.

use super::Session;
use crate::GlobalArgs;
use colored::Colorize;
use opencv_recipe::manifest::PackageManifest;
use opencv_recipe::pkgconfig::{self, PkgConfigFlags};
use opencv_recipe::{OptionSchema, Result};

/// List every build option with its legal values and default
pub fn options() -> Result<()> {
    let schema = OptionSchema::opencv();

    println!("{}", "==> Options".bold().green());
    for decl in schema.iter() {
        println!(
            "{} {} (default: {})",
            decl.name.bold(),
            format!("[{}]", decl.legal.join(", ")).dimmed(),
            decl.default.cyan()
        );
        println!("  {}", decl.help);

        let mut notes = Vec::new();
        if decl.applicability != opencv_recipe::options::Applicability::All {
            notes.push(decl.applicability.to_string());
        }
        if !decl.requires.is_empty() {
            notes.push(format!("requires {}", decl.requires.join(", ")));
        }
        if decl.cross_incompatible {
            notes.push("disabled when cross-building".to_string());
        }
        if !notes.is_empty() {
            println!("  {}", notes.join("; ").dimmed());
        }
    }

    println!();
    println!("{}", "==> Conflicts".bold().green());
    for (first, second) in schema.conflicts() {
        println!("{} and {} cannot both be enabled", first.bold(), second.bold());
    }

    Ok(())
}

/// Show what a build with the given inputs would do
pub fn inspect(args: &GlobalArgs, json: bool) -> Result<()> {
    let session = Session::load(args)?;
    let plan = &session.plan;

    if json {
        println!("{}", serde_json::to_string_pretty(plan)?);
        return Ok(());
    }

    println!("{}", format!("==> {}", plan.reference).bold().green());
    println!("{}", session.info.description);
    println!("{}: {}", "Package id".bold(), plan.package_id);
    if plan.configuration.is_cross_building() {
        println!("{}: yes", "Cross-building".bold().yellow());
    }

    println!();
    println!("{}", "==> Settings".bold().green());
    for (key, value) in plan.configuration.settings.to_map() {
        println!("{} = {}", key, value.cyan());
    }

    println!();
    println!("{}", "==> Options".bold().green());
    for (key, value) in plan.configuration.values() {
        println!("{} = {}", key, value.cyan());
    }

    println!();
    println!("{}", "==> Requirements".bold().green());
    for requirement in &plan.requirements {
        println!("{}", requirement);
    }

    println!();
    println!("{}", "==> CMake definitions".bold().green());
    for (key, value) in plan.definitions.iter() {
        println!("{}={}", key, value);
    }

    println!();
    println!("{}", "==> Libraries".bold().green());
    println!("{}", plan.artifacts.libs.join(" "));
    println!("{}: {}", "Include dirs".bold(), plan.artifacts.include_dirs.join(", "));
    println!("{}: {}", "Lib dirs".bold(), plan.artifacts.lib_dirs.join(", "));
    println!("{}: {}", "Bin dirs".bold(), plan.artifacts.bin_dirs.join(", "));

    let link = &plan.link_info;
    if !link.system_libs.is_empty() {
        println!("{}: {}", "System libs".bold(), link.system_libs.join(", "));
    }
    if !link.frameworks.is_empty() {
        println!("{}: {}", "Frameworks".bold(), link.frameworks.join(", "));
    }
    if !link.pkg_config_modules.is_empty() {
        println!("{}: {}", "pkg-config".bold(), link.pkg_config_modules.join(", "));
    }
    if !plan.patches.is_empty() {
        println!(
            "{}: {} source patches",
            "Patches".bold(),
            plan.patches.len().to_string().dimmed()
        );
    }

    Ok(())
}

/// Print the package manifest as JSON
pub fn manifest(args: &GlobalArgs, query_pkg_config: bool) -> Result<()> {
    let session = Session::load(args)?;
    let manifest = build_manifest(&session, query_pkg_config)?;
    println!("{}", serde_json::to_string_pretty(&manifest)?);
    Ok(())
}

/// Assemble the manifest, asking pkg-config for toolkit flags when requested
pub(super) fn build_manifest(session: &Session, query_pkg_config: bool) -> Result<PackageManifest> {
    let plan = &session.plan;
    let flags: Vec<PkgConfigFlags> = if query_pkg_config {
        plan.link_info
            .pkg_config_modules
            .iter()
            .map(|module| pkgconfig::query(module))
            .collect::<Result<_>>()?
    } else {
        Vec::new()
    };

    Ok(PackageManifest::new(
        session.info.name,
        session.info.version,
        &plan.artifacts,
        &plan.link_info,
        &flags,
        &plan.requirements,
    ))
}
