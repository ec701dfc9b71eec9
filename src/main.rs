use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use wbtcv::cli::{self, Cli};
use wbtcv::config::WbtcvConfig;

/// `RUST_LOG` wins; otherwise the level from the config file, if readable.
fn log_filter(config_path: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = std::fs::read_to_string(config_path)
            .ok()
            .and_then(|raw| toml::from_str::<WbtcvConfig>(&raw).ok())
            .map(|c| c.node.log_level)
            .unwrap_or_else(|| "info".to_string());
        EnvFilter::new(level)
    })
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(&cli.config))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = cli::run(cli) {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
