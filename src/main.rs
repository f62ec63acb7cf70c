mod analysis;
mod config;
mod format;
mod manager;
mod sheet;
mod stats;
mod store;

use crate::manager::Manager;
use crate::sheet::NavKey;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about)]
struct CLI {
    #[arg(long)]
    lab_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Init,

    Set {
        #[arg(long)]
        cell: String,

        #[arg(long, allow_hyphen_values = true)]
        value: String,
    },

    Show,

    Move {
        #[arg(long)]
        cell: String,

        #[arg(long, value_enum)]
        key: NavKey,
    },

    Analyze,
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#?}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = CLI::parse();
    log::info!("{args:#?}");

    let mgr = Manager::new(args.lab_dir).context("failed to construct mgr")?;

    match args.command {
        Command::Init => mgr.init_cells()?,
        Command::Set { cell, value } => mgr.set_cell(&cell, &value)?,
        Command::Show => print!("{}", mgr.show_cells()?),
        Command::Move { cell, key } => println!("{}", mgr.move_from(&cell, key)?),
        Command::Analyze => mgr.analyze_cells()?,
    }

    Ok(())
}
