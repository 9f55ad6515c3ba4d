use clap::Parser;
use glyphpad::cli::Cli;
use glyphpad::{Config, commands};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = Config::load()?;
    commands::dispatch(cli.command, &config)
}
