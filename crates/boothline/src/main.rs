//! Boothline - Lead Capture Kiosk
//!
//! Trade-show companion: collects visitor contact data at a booth,
//! persists it to a durable local table, optionally mirrors appends to a
//! spreadsheet, and supports listing, atomic edit, delete and export.

use anyhow::{bail, Result};
use boothline_store::LeadSource;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

mod cli;
mod config;
mod logging;

use cli::add::AddArgs;
use cli::scan::ScanArgs;
use config::BoothlineConfig;

#[derive(Parser, Debug)]
#[command(name = "boothline", about = "Lead capture for trade-show kiosks")]
struct Cli {
    /// Enable verbose logging (info/debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Config file (default: $BOOTHLINE_HOME/boothline.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default config file
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Capture a lead typed at the kiosk
    Add {
        /// Visitor's full name
        #[arg(long)]
        name: String,

        #[arg(long, default_value = "")]
        email: String,

        #[arg(long, default_value = "")]
        phone: String,

        #[arg(long, default_value = "")]
        company: String,

        #[arg(long, default_value = "")]
        note: String,

        /// The visitor agreed to be contacted (required to persist)
        #[arg(long)]
        consent: bool,

        /// Capture channel: manual, qr or nfc
        #[arg(long, default_value = "manual")]
        source: LeadSource,
    },

    /// Capture a lead from decoded QR payload text
    Scan {
        /// File containing the decoded payload, or `-` for stdin
        payload: PathBuf,

        /// The visitor agreed to be contacted (required to persist)
        #[arg(long)]
        consent: bool,

        /// Show the recognized fields without saving
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the collected leads
    List {
        /// Machine-readable output
        #[arg(long)]
        json: bool,
    },

    /// Apply a human-edited copy of the table in one atomic step
    Edit {
        /// Edited CSV, same schema as the exported table
        edited: PathBuf,
    },

    /// Remove one lead by row id
    Delete { row_id: u64 },

    /// Copy the table for spreadsheet consumers
    Export { dest: PathBuf },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("warning: logging unavailable: {e:#}");
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Commands::Init { force } = &cli.command {
        return init_config(cli.config.clone(), *force);
    }

    let config = BoothlineConfig::load_or_default(cli.config.as_deref())?;
    let store = cli::open_store(&config)?;

    match cli.command {
        Commands::Init { .. } => unreachable!("handled above"),
        Commands::Add {
            name,
            email,
            phone,
            company,
            note,
            consent,
            source,
        } => cli::add::run(
            &store,
            AddArgs {
                name,
                email,
                phone,
                company,
                note,
                consent,
                source,
            },
        ),
        Commands::Scan {
            payload,
            consent,
            dry_run,
        } => cli::scan::run(
            &store,
            ScanArgs {
                payload,
                consent,
                dry_run,
            },
        ),
        Commands::List { json } => cli::list::run(&store, json),
        Commands::Edit { edited } => cli::edit::run(&store, &edited),
        Commands::Delete { row_id } => cli::delete::run(&store, row_id),
        Commands::Export { dest } => cli::export::run(&store, &dest),
    }
}

fn init_config(explicit: Option<PathBuf>, force: bool) -> Result<()> {
    let path = explicit.unwrap_or_else(config::default_config_path);
    if path.exists() && !force {
        bail!(
            "config already exists: {} (use --force to overwrite)",
            path.display()
        );
    }
    BoothlineConfig::default().save(&path)?;
    println!("Wrote config to {}", path.display());
    Ok(())
}
