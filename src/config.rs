//! Command line and environment configuration.

use std::path::Path;

use clap::Parser;
use url::Url;

use crate::docker::DEFAULT_DOCKER_HOST;
use crate::monitor::{EventFilter, Resolution};

const HOSTNAME_FILES: [&str; 2] = ["/etc/hostname", "/proc/sys/kernel/hostname"];

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid sink url `{url}`: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("unsupported sink `{0}`, expected `log://` or `statsd://<host>:<port>`")]
    UnsupportedSink(String),
    #[error("statsd sink `{0}` needs both host and port")]
    MissingStatsdAddress(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Relays container stats and lifecycle events to a metrics sink.
#[derive(Parser, Debug, Clone)]
#[command(name = "creo-stats")]
#[command(about = "Relay container stats and lifecycle events to a metrics sink")]
pub struct Config {
    /// Metric sink, `log://` or `statsd://<host>:<port>`
    #[arg(long, env = "STAT_URL", default_value = "log://")]
    pub url: String,

    /// Template for log lines or statsd metric names
    #[arg(long, env = "STAT_TEMPLATE")]
    pub template: Option<String>,

    /// Comma-separated event statuses to handle instead of the default set
    #[arg(long, env = "STAT_WHITELIST", value_delimiter = ',')]
    pub whitelist: Vec<String>,

    /// Sampling resolution in seconds, 0 selects the default, capped at one day
    #[arg(long, env = "RESOLUTION", default_value_t = Resolution::DEFAULT_SECS)]
    pub resolution: u64,

    /// Docker daemon address
    #[arg(long, env = "DOCKER_HOST", default_value = DEFAULT_DOCKER_HOST)]
    pub docker_host: String,
}

/// The configured metric destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sink {
    Log,
    Statsd { addr: String },
}

impl Config {
    /// Resolves the sink URL.
    ///
    /// # Errors
    ///
    /// Fails if the URL does not parse, names an unknown scheme, or is a `statsd://` URL
    /// without host and port.
    pub fn sink(&self) -> Result<Sink> {
        let url = Url::parse(&self.url).map_err(|source| Error::InvalidUrl {
            url: self.url.clone(),
            source,
        })?;

        match url.scheme() {
            "log" => Ok(Sink::Log),
            "statsd" => {
                let host = url.host_str().filter(|host| !host.is_empty());
                match (host, url.port()) {
                    (Some(host), Some(port)) => Ok(Sink::Statsd {
                        addr: format!("{host}:{port}"),
                    }),
                    _ => Err(Error::MissingStatsdAddress(self.url.clone())),
                }
            }
            _ => Err(Error::UnsupportedSink(self.url.clone())),
        }
    }

    pub fn filter(&self) -> EventFilter {
        EventFilter::new(&self.whitelist)
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::from_secs(self.resolution)
    }
}

/// Returns the hostname of this machine, or `localhost` if it cannot be determined.
pub fn hostname() -> String {
    hostname_from(&HOSTNAME_FILES)
}

fn hostname_from<P: AsRef<Path>>(files: &[P]) -> String {
    files
        .iter()
        .filter_map(|file| std::fs::read_to_string(file).ok())
        .map(|content| content.trim().to_owned())
        .find(|name| !name.is_empty())
        .unwrap_or_else(|| "localhost".to_owned())
}
