use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use lekiwi_teleop::config::Config;

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(LevelFilter::INFO.into()))
        .init();

    let config = Config::parse();

    if let Err(e) = lekiwi_teleop::runtime::run(config).await {
        eprintln!("Teleop error: {}", e);
        std::process::exit(1);
    }
}
