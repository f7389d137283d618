//! Access to the container runtime.
//!
//! [`Runtime`] is the capability the monitor depends on: listing and inspecting
//! containers, and opening the lifecycle event feed and per-container stats feeds.
//! [`DockerClient`] implements it against the Docker Engine API on a unix socket.
//!
//! Feeds are bounded [`tokio::sync::mpsc`] receivers. Dropping a receiver ends the task
//! producing into it together with the underlying HTTP connection.

mod client;
mod decode;
mod models;
mod transport;

use std::path::PathBuf;

use tokio::sync::mpsc;

use crate::container::ContainerID;
use crate::stats::Stats;

pub use client::{DEFAULT_DOCKER_HOST, DockerClient};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unsupported docker host `{0}`, expected `unix://<path>`")]
    UnsupportedHost(String),
    #[error("failed to connect to socket `{path}`: {source}")]
    SocketConnect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to establish http connection: {0}")]
    Handshake(#[source] hyper::Error),
    #[error("failed to build request: {0}")]
    Request(#[from] hyper::http::Error),
    #[error("failed to send request `{path}`: {source}")]
    Send {
        path: String,
        #[source]
        source: hyper::Error,
    },
    #[error("request `{path}` failed with status {status}: {message}")]
    Status {
        path: String,
        status: u16,
        message: String,
    },
    #[error("failed to read response body of `{path}`: {source}")]
    Body {
        path: String,
        #[source]
        source: hyper::Error,
    },
    #[error("failed to decode response of `{path}`: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    InvalidContainerID(#[from] crate::container::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Container metadata as reported by an inspection call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerDetails {
    pub id: ContainerID,
    /// The raw name, including the leading `/` reported by Docker.
    pub name: String,
    pub env: Vec<String>,
}

/// A container lifecycle occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: ContainerID,
    /// The lifecycle status, e.g. `start` or `die`.
    pub status: String,
}

impl Event {
    pub fn new(id: ContainerID, status: impl Into<String>) -> Self {
        Self {
            id,
            status: status.into(),
        }
    }
}

/// The container runtime operations the monitor relies on.
pub trait Runtime: Send + Sync + 'static {
    /// Lists the IDs of all currently running containers.
    fn list_running_containers(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<ContainerID>>> + Send;

    /// Resolves the metadata of a container. Fails if the container is unknown.
    fn inspect_container(
        &self,
        id: &ContainerID,
    ) -> impl std::future::Future<Output = Result<ContainerDetails>> + Send;

    /// Subscribes to the container lifecycle event feed.
    ///
    /// The feed is not expected to end during normal operation.
    fn subscribe_events(
        &self,
    ) -> impl std::future::Future<Output = Result<mpsc::Receiver<Event>>> + Send;

    /// Opens the continuous stats feed of a container.
    ///
    /// The feed ends when the container stops or is removed.
    fn open_stats_stream(
        &self,
        id: &ContainerID,
    ) -> impl std::future::Future<Output = Result<mpsc::Receiver<Stats>>> + Send;
}
