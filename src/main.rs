use anyhow::Context;
use clap::Parser;
use downtidy::cli::{Cli, Settings, run};
use downtidy::config::Config;
use downtidy::logging::init_logger;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("Error loading configuration")?;
    let settings = Settings::resolve(&cli, &config)?;

    let _guard = init_logger(&settings.log_file, settings.verbose).with_context(|| {
        format!(
            "Could not open log file {}",
            settings.log_file.display()
        )
    })?;

    run(&settings, &config)?;
    Ok(())
}
