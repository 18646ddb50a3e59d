//! Tasklift CLI - Extract action items from notes, documents and email threads.

use anyhow::Context;
use clap::Parser;
use tasklift_cli::cli::CliFormat;
use tasklift_cli::commands;
use tasklift_cli::config::Settings;
use tasklift_cli::{Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let Cli {
        format,
        no_color,
        config: config_path,
        command,
    } = Cli::parse();

    match command {
        Command::Config(args) => {
            let formatter = formatter(format, no_color, &Settings::default());
            commands::execute_config(args, config_path.as_deref(), &formatter)?;
        }
        Command::Extract(args) => {
            let config = Config::load(config_path.as_deref())
                .context("Failed to load configuration")?;
            let formatter = formatter(format, no_color, &config.settings);
            commands::execute_extract(args, &config, &formatter).await?;
        }
        Command::Thread(args) => {
            let config = Config::load(config_path.as_deref())
                .context("Failed to load configuration")?;
            let formatter = formatter(format, no_color, &config.settings);
            commands::execute_thread(args, &config, &formatter)?;
        }
    }

    Ok(())
}

fn formatter(format: Option<CliFormat>, no_color: bool, settings: &Settings) -> Formatter {
    let format = format.map(Into::into).unwrap_or(settings.format);
    Formatter::new(format, !no_color && settings.color)
}
