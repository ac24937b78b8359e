//! layerkit CLI entry point.

use clap::Parser;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use layerkit_cli::commands::{dispatch, Cli, LogFormat};
use layerkit_core::LayerkitConfig;

fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => LayerkitConfig::load_from(path),
        None => LayerkitConfig::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    init_tracing(&cli, &config);

    if let Err(e) = dispatch(cli, &config) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins; otherwise `--verbose` or the configured level.
fn init_tracing(cli: &Cli, config: &LayerkitConfig) {
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        config.log_level.into()
    };
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match cli.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}
