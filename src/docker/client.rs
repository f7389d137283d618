use std::path::PathBuf;

use tokio::sync::mpsc;

use crate::container::ContainerID;
use crate::stats::Stats;

use super::models::{ContainerInspect, ContainerSummary, EventMessage};
use super::transport::{self, UnixConnector};
use super::{ContainerDetails, Error, Event, Result, Runtime};

/// The Docker endpoint used when none is configured.
pub const DEFAULT_DOCKER_HOST: &str = "unix:///var/run/docker.sock";

/// `filters={"type":["container"]}`, percent-encoded.
const EVENTS_PATH: &str = "/events?filters=%7B%22type%22%3A%5B%22container%22%5D%7D";

/// Capacity of the channels feeding events and stats to consumers.
const STREAM_BUFFER: usize = 16;

/// A [`Runtime`] backed by the Docker Engine API.
#[derive(Debug, Clone)]
pub struct DockerClient {
    connector: UnixConnector,
}

impl DockerClient {
    /// Creates a client talking to the daemon socket at `socket_path`.
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            connector: UnixConnector::new(socket_path),
        }
    }

    /// Creates a client from a `DOCKER_HOST`-style address.
    ///
    /// Accepts `unix:///path/to/docker.sock` or a bare absolute socket path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedHost`] for any other address.
    ///
    /// # Examples
    ///
    /// ```
    /// # use creo_stats::docker::DockerClient;
    /// assert!(DockerClient::from_host("unix:///var/run/docker.sock").is_ok());
    /// assert!(DockerClient::from_host("tcp://127.0.0.1:2375").is_err());
    /// ```
    pub fn from_host(host: &str) -> Result<Self> {
        socket_path_from_host(host).map(Self::new)
    }
}

fn socket_path_from_host(host: &str) -> Result<PathBuf> {
    let path = host.strip_prefix("unix://").unwrap_or(host);
    if path.starts_with('/') {
        Ok(PathBuf::from(path))
    } else {
        Err(Error::UnsupportedHost(host.to_owned()))
    }
}

impl Runtime for DockerClient {
    async fn list_running_containers(&self) -> Result<Vec<ContainerID>> {
        let containers: Vec<ContainerSummary> =
            transport::get_json(&self.connector, "/containers/json").await?;
        log::debug!("Found {} running containers", containers.len());

        containers
            .into_iter()
            .map(|c| ContainerID::new(c.id).map_err(Error::from))
            .collect()
    }

    async fn inspect_container(&self, id: &ContainerID) -> Result<ContainerDetails> {
        let path = format!("/containers/{id}/json");
        let inspect: ContainerInspect = transport::get_json(&self.connector, &path).await?;
        inspect.try_into()
    }

    async fn subscribe_events(&self) -> Result<mpsc::Receiver<Event>> {
        transport::get_stream(
            &self.connector,
            EVENTS_PATH,
            STREAM_BUFFER,
            EventMessage::into_event,
        )
        .await
    }

    async fn open_stats_stream(&self, id: &ContainerID) -> Result<mpsc::Receiver<Stats>> {
        let path = format!("/containers/{id}/stats?stream=1");
        transport::get_stream(&self.connector, &path, STREAM_BUFFER, Some::<Stats>).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_path_from_host() {
        assert_eq!(
            socket_path_from_host(DEFAULT_DOCKER_HOST).unwrap(),
            PathBuf::from("/var/run/docker.sock")
        );
        assert_eq!(
            socket_path_from_host("/run/user/1000/docker.sock").unwrap(),
            PathBuf::from("/run/user/1000/docker.sock")
        );
    }

    #[test]
    fn test_unsupported_hosts() {
        for host in ["tcp://127.0.0.1:2375", "unix://", "docker.sock", ""] {
            match socket_path_from_host(host) {
                Err(Error::UnsupportedHost(h)) => assert_eq!(h, host),
                other => panic!("Expected UnsupportedHost for `{host}`, got {other:?}"),
            }
        }
    }
}
