//! # datapress command-line entry point
//!
//! ```bash
//! datapress pack --dataset abuse --out out/ reports-jan.csv reports-feb.csv
//! datapress report --dataset abuse out/abuse.json.zst --top 5
//! datapress verify out/abuse.json.zst.receipt.json
//! ```
//!
//! The secret comes from `--secret`, then the config file, then
//! `DATAPRESS_SECRET`.

#![warn(clippy::all, rust_2018_idioms)]
#![expect(clippy::print_stdout)]

mod cli;

use anyhow::Result;
use clap::Parser as _;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    let log_dir = if cli.log_to_file {
        Some(datapress::logging::default_log_dir()?)
    } else {
        None
    };
    datapress::logging::init(log_dir.as_deref())?;

    cli::run(cli)
}
