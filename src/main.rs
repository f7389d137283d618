use clap::Parser;

use creo_stats::config::Config;

/// Entry point for the Creo Stats collector.
///
/// Relays container stats from the Docker daemon to the configured metrics sink. The log
/// level is controlled through `RUST_LOG`.
///
/// # Examples
///
/// ```bash
/// STAT_URL=statsd://127.0.0.1:8125 RESOLUTION=5 cargo run
/// ```
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let config = Config::parse();
    creo_stats::run(config).await
}
