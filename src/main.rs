//! # bulk-pr CLI
//!
//! Binary entry point for the `bulk-pr` command-line tool. It parses the
//! arguments with `clap`, sets up logging and hands off to the command
//! implementations, which call into the `bulk_pr` library.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
