use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

mod error;

pub use error::{Error, Result};

/// The maximum allowed length for a [`ContainerID`].
const CONTAINER_ID_MAX_LEN: usize = 255;

/// A validated container identifier as assigned by the container runtime.
///
/// # Examples
///
/// ```
/// # use creo_stats::container::{ContainerID, Error};
/// let raw_id = "abc123abc123abc123abc123abc123abc123abc123abc123abc123abc123abcd";
/// let container_id = ContainerID::new(raw_id).unwrap();
/// assert_eq!(container_id.as_ref(), "abc123abc123abc123abc123abc123abc123abc123abc123abc123abc123abcd");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerID(Arc<str>);

impl ContainerID {
    /// Creates a new `ContainerID` from the given raw id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidContainerID`] if the input is empty or its length exceeds
    /// [`CONTAINER_ID_MAX_LEN`].
    ///
    /// # Examples
    ///
    /// ```
    /// # use creo_stats::container::ContainerID;
    /// assert!(ContainerID::new("4f66ad9a0b2e").is_ok());
    /// assert!(ContainerID::new("").is_err());
    /// ```
    pub fn new(src: impl AsRef<str>) -> Result<Self> {
        let src = src.as_ref();
        if src.is_empty() || src.len() > CONTAINER_ID_MAX_LEN {
            return Err(Error::InvalidContainerID(src.to_owned()));
        }

        Ok(Self(src.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ContainerID {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ContainerID {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolved metadata of a container, as registered by the monitor.
///
/// A `Container` never changes once registered; metadata updates made to the
/// container at runtime are not reflected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    id: ContainerID,
    name: String,
    env: Vec<String>,
}

impl Container {
    /// Constructs a [`Container`].
    ///
    /// # Arguments
    ///
    /// * `id` - The runtime-assigned identifier.
    /// * `name` - The display name, already normalized (see [`normalize_name`]).
    /// * `env` - The environment of the container as ordered `KEY=VALUE` entries.
    pub fn new(id: ContainerID, name: impl Into<String>, env: Vec<String>) -> Self {
        Self {
            id,
            name: name.into(),
            env,
        }
    }

    pub fn id(&self) -> &ContainerID {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn env(&self) -> &[String] {
        self.env.as_slice()
    }

    /// Returns the value of the first `key=...` entry of the container environment.
    ///
    /// # Examples
    ///
    /// ```
    /// # use creo_stats::container::{Container, ContainerID};
    /// let id = ContainerID::new("4f66ad9a0b2e").unwrap();
    /// let c = Container::new(id, "web", vec!["SOURCE=web.1".to_owned(), "EMPTY=".to_owned()]);
    /// assert_eq!(c.env_var("SOURCE"), Some("web.1"));
    /// assert_eq!(c.env_var("EMPTY"), Some(""));
    /// assert_eq!(c.env_var("MISSING"), None);
    /// ```
    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env.iter().find_map(|entry| {
            let (k, v) = entry.split_once('=')?;
            (k == key).then_some(v)
        })
    }
}

/// Strips a single leading path separator from a runtime-reported container name.
///
/// Docker reports names as `/web`; only the first leading `/` is removed.
pub fn normalize_name(name: &str) -> &str {
    name.strip_prefix('/').unwrap_or(name)
}
