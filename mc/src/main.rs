use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tracing::{info, warn};

use mapcompiler::cli::{Cli, Mode};
use mapcompiler::compiler;
use mapcompiler::config::Config;
use mapcompiler::store::ArtifactStore;

fn parse_level(level: Option<&str>) -> tracing::Level {
    match level.map(str::to_uppercase).as_deref() {
        None | Some("INFO") => tracing::Level::INFO,
        Some("TRACE") => tracing::Level::TRACE,
        Some("DEBUG") => tracing::Level::DEBUG,
        Some("WARN") | Some("WARNING") => tracing::Level::WARN,
        Some("ERROR") => tracing::Level::ERROR,
        Some(_) => {
            eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", level.unwrap_or_default());
            tracing::Level::INFO
        }
    }
}

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Priority: CLI --log-level > config file > INFO
    let level = parse_level(cli_log_level.or(config_log_level));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!(domain = %cli.domain, tier = %cli.target, mode = ?cli.mode, "mapcompiler starting");

    let written = compiler::run(&config, &cli.input, cli.file_type, &cli.domain, cli.target)
        .with_context(|| format!("Failed to compile {}", cli.input.display()))?;

    let dir = ArtifactStore::open(&config.output_dir).tier_dir(&cli.domain, cli.target);
    for file_name in &written {
        println!("{} {}", "✓".green(), dir.join(file_name).display());
    }
    println!(
        "{} Generated {} files for {} {}",
        "✓".green(),
        written.len(),
        cli.domain.cyan(),
        cli.target
    );

    if cli.mode == Mode::Live {
        warn!("Upload of generated configuration is handled outside mapcompiler");
        println!("{} Live mode: upload {} with the deployment pipeline", "→".yellow(), dir.display());
    }

    Ok(())
}
