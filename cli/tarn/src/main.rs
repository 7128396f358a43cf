//! tarn CLI — add and install npm packages.

mod commands;
mod settings;

use std::io;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tarn_install::Request;
use tracing_subscriber::EnvFilter;

use settings::{Settings, REGISTRY_ENV};

#[derive(Parser)]
#[command(name = "tarn", version, about = "A minimal npm package installer")]
struct Cli {
    /// Registry URL, or a local registry directory
    #[arg(long, global = true)]
    registry: Option<String>,
    /// Project directory holding package.json (default: current directory)
    #[arg(long, global = true)]
    project_dir: Option<PathBuf>,
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a dependency at its latest published version
    Add {
        /// Package name
        name: String,
        /// Record under devDependencies
        #[arg(long, short = 'D')]
        dev: bool,
    },
    /// Download and extract every dependency listed in package.json
    Install,
    /// Ask for a command interactively
    Prompt,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let project_dir = match cli.project_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let settings = Settings::load(
        &project_dir,
        cli.registry.as_deref(),
        std::env::var(REGISTRY_ENV).ok(),
    )?;
    tracing::debug!(
        "using registry {} and manifest {}",
        settings.registry,
        settings.installer.manifest_path.display()
    );
    let installer = settings.installer()?;
    let mut stdout = io::stdout();

    match cli.command {
        Commands::Add { name, dev } => {
            commands::dispatch(&installer, Request::Register { name, dev }, &mut stdout)
        }
        Commands::Install => commands::dispatch(&installer, Request::Materialize, &mut stdout),
        Commands::Prompt => {
            let stdin = io::stdin();
            commands::prompt::run(&installer, &mut stdin.lock(), &mut stdout)
        }
    }
}
