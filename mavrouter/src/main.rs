//! `mavrouter` — link together MAVLink endpoints over a single learned, routed bus.

use clap::Parser;

use mavrouter::cli::Cli;
use mavrouter::config::Config;
use mavrouter::{app, error};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match Config::from_cli(cli) {
        Ok(config) => config,
        Err(err) => fail(err),
    };

    init_logging(config.quiet);

    app::run(config).await;
}

fn init_logging(quiet: bool) {
    let default_level = if quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

/// Prints a configuration error to stderr and exits `1`, per spec §6's exit-code contract.
fn fail(err: error::ConfigError) -> ! {
    eprintln!("ERROR: {err}");
    std::process::exit(1);
}
