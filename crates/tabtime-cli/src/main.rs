use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tabtime_cli::commands::{patterns, tabs, verify};
use tabtime_cli::{Cli, Commands, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let mut stdout = std::io::stdout();

    match &cli.command {
        Some(Commands::Tabs) => {
            let config = load_config(&cli)?;
            tabs::run(&mut stdout, &config)?;
        }
        Some(Commands::Verify { condition }) => {
            let config = load_config(&cli)?;
            verify::run(&mut stdout, &config, condition)?;
        }
        Some(Commands::Patterns) => {
            let config = load_config(&cli)?;
            patterns::run(&mut stdout, &config)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    let config =
        Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}
