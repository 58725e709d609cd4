//! Binary crate for the `station` command-line tool.
//!
//! This crate focuses on:
//! - Loading `.env` and initialising logging
//! - Parsing CLI arguments and prompting for input
//! - Human-friendly output formatting

use clap::Parser;
use env_logger::Builder;
use log::LevelFilter;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    Builder::new().filter_level(LevelFilter::Info).parse_default_env().init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
