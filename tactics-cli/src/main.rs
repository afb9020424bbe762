//! # Tactics
//!
//! Command-line renderer and layout store for the tactical board.

use clap::Parser;
use tactics_cli::{CliArgs, CliConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = CliArgs::parse();
    let config = CliConfig::from(args);
    if let Some(ref dir) = config.data_dir {
        tracing::debug!("Layout store: {}", dir.display());
    }

    tactics_cli::run(&config)
}

/// Log to stderr, filtered by `RUST_LOG`; JSON lines when
/// `RUST_LOG_FORMAT=json`.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tactics_core=debug,tactics_renderer=debug".into());
    let json = std::env::var("RUST_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
