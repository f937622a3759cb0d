//! CMake build and packaging

use super::Session;
use super::inspect::build_manifest;
use crate::GlobalArgs;
use anyhow::Context;
use colored::Colorize;
use opencv_recipe::cmake::CMake;
use opencv_recipe::receipt::RecipeReceipt;
use opencv_recipe::{Result, relocate};
use std::fs;

fn cmake(session: &Session, jobs: Option<usize>) -> Result<CMake> {
    let source_folder = session.layout.source_folder();
    if !source_folder.is_dir() {
        return Err(anyhow::anyhow!(
            "Sources not found in {}; run `cvr source` first",
            source_folder.display()
        )
        .into());
    }

    let plan = &session.plan;
    let mut cmake = CMake::new(
        &session.layout,
        &plan.configuration.settings,
        plan.definitions.clone(),
        &session.build_env,
    );
    cmake.jobs = jobs;
    cmake.env = session.env.clone();
    Ok(cmake)
}

/// Configure and build
pub fn build(args: &GlobalArgs, jobs: Option<usize>) -> Result<()> {
    let session = Session::load(args)?;
    let cmake = cmake(&session, jobs)?;

    println!(
        "{} Building {} ({})",
        "==>".bold().green(),
        session.plan.reference.bold(),
        session.plan.configuration.settings.build_type.as_str()
    );
    cmake.configure()?;
    println!("  {} Configured", "✓".green());
    cmake.build()?;
    println!("  {} Built", "✓".green());

    Ok(())
}

/// Install into the package folder, then write license, receipt and manifest
pub fn package(args: &GlobalArgs) -> Result<()> {
    let session = Session::load(args)?;
    let layout = &session.layout;
    let cmake = cmake(&session, None)?;

    println!(
        "{} Packaging {} into {}",
        "==>".bold().green(),
        session.plan.reference.bold(),
        layout.package_folder.display()
    );

    let licenses = layout.package_path("licenses");
    fs::create_dir_all(&licenses)
        .with_context(|| format!("Failed to create {}", licenses.display()))?;
    fs::copy(layout.source_folder().join("LICENSE"), licenses.join("LICENSE"))
        .context("Failed to copy LICENSE")?;

    cmake.install()?;
    println!("  {} Installed", "✓".green());

    let relocated = relocate::relocate_package(&layout.package_folder)?;
    println!(
        "  {} Relocated {} CMake file(s)",
        "✓".green(),
        relocated.len().to_string().dimmed()
    );

    RecipeReceipt::new(&session.plan).write(&layout.package_folder)?;
    build_manifest(&session, true)?.write(&layout.package_folder)?;
    println!("  {} Wrote receipt and manifest", "✓".green());

    Ok(())
}
