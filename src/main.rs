//! Main entry point for the recbin CLI application.

use anyhow::Context;
use clap::Parser;
use recbin::{app::App, cli::Args, cli::Config};
use simplelog::{ColorChoice, TermLogger, TerminalMode};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::from_args(args).context("Invalid command line")?;

    let _ = TermLogger::init(
        config.log_level,
        simplelog::Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );

    let app = App::new(config).context("Failed to set up decoder")?;
    app.run().context("Failed to build Recycle Bin timeline")
}
