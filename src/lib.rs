//! Creo Stats: relays container resource usage and lifecycle events from the Docker
//! daemon to a metrics sink.
//!
//! The [`monitor`] attaches to the stats stream of every running container, samples it
//! at a fixed resolution and forwards the flattened [`stats`] to an [`adapter`]. Lifecycle
//! events are counted as `Container.<Status>` on the same adapter.

pub mod adapter;
pub mod config;
pub mod container;
pub mod docker;
pub mod error;
pub mod monitor;
pub mod stats;

use adapter::{Adapter, LogAdapter, StatsdAdapter};
use config::{Config, Sink};
use docker::DockerClient;
use monitor::MonitorBuilder;

/// Runs the collector until it is interrupted.
///
/// Connects to the Docker daemon, selects the adapter named by the sink URL and runs
/// the [`monitor::Monitor`]. Ctrl-C triggers an orderly shutdown that waits for all
/// attachments.
///
/// # Errors
///
/// Possible errors include:
/// - An unsupported Docker host or sink URL.
/// - An invalid template or an unreachable StatsD address.
/// - Failure to list running containers or to subscribe to container events.
/// - The container event feed ending.
pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = DockerClient::from_host(&config.docker_host)?;
    let hostname = config::hostname();
    log::debug!("Hostname: {}", &hostname);

    let template = config.template.as_deref();
    match config.sink()? {
        Sink::Log => {
            let adapter = LogAdapter::stdout(template, hostname)?;
            run_monitor(runtime, adapter, &config).await
        }
        Sink::Statsd { addr } => {
            log::info!("Sending metrics to statsd at {}", addr);
            let adapter = StatsdAdapter::connect(addr.as_str(), template, hostname)?;
            run_monitor(runtime, adapter, &config).await
        }
    }
}

async fn run_monitor<A: Adapter>(
    runtime: DockerClient,
    adapter: A,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut builder = MonitorBuilder::new(runtime).adapter(adapter);
    builder
        .set_filter(config.filter())
        .set_resolution(config.resolution());
    let monitor = builder.build();

    let token = monitor.shutdown_token();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                log::info!("Received interrupt, shutting down");
                token.cancel();
            }
            Err(err) => log::error!("failed to listen for interrupt: {}", err),
        }
    });

    if let Err(err) = monitor.run().await {
        log::error!("{}", err);
        monitor.shutdown().await;
        return Err(err.into());
    }

    Ok(())
}
