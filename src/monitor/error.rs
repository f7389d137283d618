use crate::container::ContainerID;
use crate::docker;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to list running containers: {0}")]
    Startup(#[source] docker::Error),
    #[error("failed to subscribe to container events: {0}")]
    Subscription(#[source] docker::Error),
    #[error("container event feed stopped unexpectedly")]
    UnexpectedStop,
    #[error("failed to inspect container `{id}`: {source}")]
    Inspection {
        id: ContainerID,
        #[source]
        source: docker::Error,
    },
    #[error("failed to open stats stream of container `{id}`: {source}")]
    StreamOpen {
        id: ContainerID,
        #[source]
        source: docker::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
