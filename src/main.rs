mod colors;
mod commands;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cvr")]
#[command(author, version, about = "Build and package OpenCV from source", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    global: GlobalArgs,
}

/// Inputs shared by every command
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// TOML profile with [settings], [options] and [env] (default: $CVR_PROFILE)
    #[arg(long, global = true)]
    pub profile: Option<PathBuf>,

    /// Setting override, e.g. -s compiler.version=9
    #[arg(short = 's', long = "setting", value_name = "KEY=VALUE", value_parser = parse_key_value, global = true)]
    pub settings: Vec<(String, String)>,

    /// Option override, e.g. -o shared=True
    #[arg(short = 'o', long = "option", value_name = "KEY=VALUE", value_parser = parse_key_value, global = true)]
    pub options: Vec<(String, String)>,

    /// Root folder of an installed dependency, e.g. --dep-root openexr=/opt/openexr
    #[arg(long = "dep-root", value_name = "NAME=PATH", value_parser = parse_key_value, global = true)]
    pub dep_roots: Vec<(String, String)>,

    /// Folder for sources and build files
    #[arg(long, default_value = ".", global = true)]
    pub workdir: PathBuf,

    /// Install prefix (default: <workdir>/package)
    #[arg(long, global = true)]
    pub package_folder: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the build options and their legal values
    Options,

    /// Show the resolved requirements, CMake definitions and artifacts
    Inspect {
        /// Output the full plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Download, verify, extract and patch the sources
    Source,

    /// Show or install the system packages the build needs
    SystemRequirements {
        /// Install missing packages
        #[arg(long)]
        install: bool,

        /// Run the package tool through sudo
        #[arg(long)]
        sudo: bool,
    },

    /// Configure and build with CMake
    Build {
        /// Parallel build jobs
        #[arg(short, long)]
        jobs: Option<usize>,
    },

    /// Install into the package folder and write receipt and manifest
    Package,

    /// Print the package manifest
    Manifest {
        /// Skip pkg-config queries for system toolkits
        #[arg(long)]
        no_pkg_config: bool,
    },
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{}'", s));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.global.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    colors::init_colors();

    let result = match cli.command {
        Some(Commands::Options) => commands::options(),
        Some(Commands::Inspect { json }) => commands::inspect(&cli.global, json),
        Some(Commands::Source) => commands::source(&cli.global).await,
        Some(Commands::SystemRequirements { install, sudo }) => {
            commands::system_requirements(&cli.global, install, sudo)
        }
        Some(Commands::Build { jobs }) => commands::build(&cli.global, jobs),
        Some(Commands::Package) => commands::package(&cli.global),
        Some(Commands::Manifest { no_pkg_config }) => {
            commands::manifest(&cli.global, !no_pkg_config)
        }
        None => {
            println!("{} cvr - build and package OpenCV from source", "==>".bold().green());
            println!("\nRun {} to see available commands.", "cvr --help".cyan());
            Ok(())
        }
    };

    if let Err(err) = result {
        if err.is_configuration_error() {
            eprintln!("{} Invalid configuration: {}", "✗".red(), err);
        } else {
            eprintln!("{} {}", "✗".red(), err);
        }
        std::process::exit(1);
    }

    Ok(())
}
