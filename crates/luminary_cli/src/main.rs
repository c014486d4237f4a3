//! # luminary
//!
//! Exports Beehive editor projects to assembly data for the Luminary
//! engine, scans engine source for entity and component definitions, and
//! links compiled entity scripts against the global offset table.

mod export;
mod link;
mod scan;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "luminary", about = "Luminary game object exporter and script linker")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write archetypes, prefabs, scenes, script headers and the offset table
    Export(export::ExportArgs),

    /// Print the entities and components defined in engine source as JSON
    Scan {
        /// Directory of .asm/.s files, searched recursively
        dir: PathBuf,
    },

    /// Patch a compiled script binary using its symbol dump
    Link(link::LinkArgs),
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "luminary=info".into()),
        )
        .init();

    let args = Args::parse();
    let result = match args.command {
        Command::Export(args) => export::run(&args),
        Command::Scan { dir } => scan::run(&dir),
        Command::Link(args) => link::run(&args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
