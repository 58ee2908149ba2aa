//! # mesonup CLI Entry Point
//!
//! Parses CLI arguments using clap and routes commands to the appropriate
//! handlers. Anything that is not a mesonup subcommand is forwarded to meson:
//! `mesonup setup build` fetches the externals, builds ninja if needed and
//! then runs `meson setup build`.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use colored::*;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use mesonup::commands;
use mesonup::config::Config;
use mesonup::error;

#[derive(Parser)]
#[command(name = "mesonup")]
#[command(about = "Fetch pinned externals, build ninja and run meson", version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
#[command(allow_external_subcommands = true)]
struct Cli {
    /// Source root containing `externals/` [default: current directory]
    #[arg(long, global = true, env = "MESONUP_ROOT")]
    root: Option<PathBuf>,

    /// Python interpreter used to run meson
    #[arg(long, global = true, env = "MESONUP_PYTHON")]
    python: Option<String>,

    /// Download archives even inside a git work tree
    #[arg(long, global = true)]
    archives: bool,

    /// Show debug diagnostics
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch or initialise all externals without running meson
    Fetch,
    /// Show the state of every external
    Status {
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove archive-installed externals, leftover archives and ninja
    Clean {
        /// Also remove externals that were not installed from archives
        #[arg(long)]
        all: bool,
    },
    /// Generate shell completions
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
    #[command(external_subcommand)]
    External(Vec<String>),
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("mesonup=debug")
    } else {
        EnvFilter::try_from_env("MESONUP_LOG").unwrap_or_else(|_| EnvFilter::new("mesonup=warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn resolve_root(root: Option<PathBuf>) -> Result<PathBuf> {
    let root = match root {
        Some(r) => r,
        None => std::env::current_dir().context("Could not determine current directory")?,
    };
    root.canonicalize()
        .with_context(|| format!("Source root {} does not exist", root.display()))
}

fn run(cli: Cli) -> Result<()> {
    if let Some(Commands::Completions { shell }) = &cli.command {
        let mut cmd = Cli::command();
        let bin_name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, bin_name, &mut std::io::stdout());
        return Ok(());
    }

    let root = resolve_root(cli.root)?;
    let config = Config::load(&root, cli.python)?;

    match cli.command {
        Some(Commands::Fetch) => commands::bootstrap::handle_fetch(&config, cli.archives),
        Some(Commands::Status { json }) => commands::status::handle_status(&config, json),
        Some(Commands::Clean { all }) => commands::clean::handle_clean(&config, all),
        Some(Commands::Completions { .. }) => Ok(()),
        Some(Commands::External(args)) => {
            let code = commands::bootstrap::handle_run(&config, &args, cli.archives)?;
            std::process::exit(code);
        }
        None => {
            let code = commands::bootstrap::handle_run(&config, &[], cli.archives)?;
            std::process::exit(code);
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {:#}", "error:".red().bold(), err);
            ExitCode::from(error::exit_code_for(&err))
        }
    }
}
