use anyhow::Result;
use clap::Parser;

use respcache::{cli::Cli, logging, run, settings::Settings};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(&cli)?;
    logging::init_logger(settings.log)?;
    let stdout = std::io::stdout();
    run(&settings, &cli.command, &mut stdout.lock())
}
