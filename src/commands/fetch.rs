//! Source retrieval and system requirements

use super::Session;
use crate::GlobalArgs;
use colored::Colorize;
use opencv_recipe::system::{self, PackageTool};
use opencv_recipe::{Result, patch, source};

/// Download, verify, extract and patch the sources
pub async fn source(args: &GlobalArgs) -> Result<()> {
    let session = Session::load(args)?;
    let layout = &session.layout;
    let plan = &session.plan;

    let archives = session.info.source_archives(&plan.configuration, layout);
    println!(
        "{} Fetching {} archive(s) for {}",
        "==>".bold().green(),
        archives.len(),
        plan.reference.bold()
    );

    source::fetch_all(&archives, &layout.root, &source::cache_dir()).await?;
    for archive in &archives {
        println!(
            "  {} {} -> {}",
            "✓".green(),
            archive.name,
            archive.target.display().to_string().dimmed()
        );
    }

    let source_folder = layout.source_folder();
    if source::prune_vendored(&source_folder, &plan.configuration.settings.os)? {
        println!("  {} Removed bundled 3rdparty sources", "✓".green());
    }

    patch::apply(&source_folder, &plan.patches)?;
    if !plan.patches.is_empty() {
        println!(
            "  {} Applied {} patch(es)",
            "✓".green(),
            plan.patches.len()
        );
    }

    Ok(())
}

/// Show the system packages the build needs, installing them on request
pub fn system_requirements(args: &GlobalArgs, install: bool, sudo: bool) -> Result<()> {
    let session = Session::load(args)?;

    let Some(tool) = PackageTool::detect() else {
        println!("{} No supported package tool found (apt-get, yum)", "⚠".yellow());
        return Ok(());
    };

    let packages = system::packages(&session.plan.configuration, tool);
    if packages.is_empty() {
        println!("No system packages required");
        return Ok(());
    }

    if !install {
        println!("{}", format!("==> System packages ({})", tool.name()).bold().green());
        for package in &packages {
            println!("{}", package);
        }
        return Ok(());
    }

    let installed = system::install(tool, &packages, sudo)?;
    if installed.is_empty() {
        println!("{} All system packages already installed", "✓".green());
    }
    for package in installed {
        println!("  {} Installed {}", "✓".green(), package.bold());
    }

    Ok(())
}
