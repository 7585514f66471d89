//! deferhtml - optimize HTML documents from the command line.

use anyhow::Result;
use clap::{ColorChoice, Parser};
use deferhtml::cli::{self, Cli};
use deferhtml::logger;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    cli::optimize::run(&cli)
}
