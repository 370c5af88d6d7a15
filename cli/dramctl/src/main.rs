//! dramctl: validate, plan and build externally generated DRAM controller cores.

mod commands;
mod manifest;

use std::io;
use std::path::PathBuf;
use std::process;

use anyhow::anyhow;
use clap::{Parser, Subcommand, ValueEnum};
use dramctl_build::ShellRunner;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dramctl", version, about = "DRAM controller core integration")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). Ignored when RUST_LOG is set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate every core of a manifest
    Check {
        /// Core manifest (TOML)
        manifest: PathBuf,
    },
    /// Render build plans without running them
    Plan {
        /// Core manifest (TOML)
        manifest: PathBuf,
        /// Build with a simulation model in place of the PHY
        #[arg(long)]
        sim: bool,
        /// Write the rendered files into this directory
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Run the generator for every core and read back the control bus
    Build {
        /// Core manifest (TOML)
        manifest: PathBuf,
        /// Build with a simulation model in place of the PHY
        #[arg(long)]
        sim: bool,
        /// Directory the build scripts run in
        #[arg(long, default_value = "build/litedram")]
        build_dir: PathBuf,
        /// Report format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// List the built-in DRAM module catalog
    Modules,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

impl Format {
    fn as_str(self) -> &'static str {
        match self {
            Format::Text => "text",
            Format::Json => "json",
        }
    }
}

fn init_tracing(verbose: u8) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            let level = match verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            };
            EnvFilter::new(level)
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
}

fn main() {
    let cli = Cli::parse();

    let result = init_tracing(cli.verbose).and_then(|()| run(cli));
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Check { manifest } => commands::check::run(&manifest, &mut out),
        Commands::Plan { manifest, sim, out: dir } => {
            commands::plan::run(&manifest, sim, dir.as_deref(), &mut out)
        }
        Commands::Build {
            manifest,
            sim,
            build_dir,
            format,
        } => commands::build::run(
            &manifest,
            sim,
            &build_dir,
            format.as_str(),
            &ShellRunner,
            &mut out,
        ),
        Commands::Modules => commands::modules::run(&mut out),
    }
}
