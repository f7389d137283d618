//! Docker Engine API payloads.
//!
//! Only the fields the monitor uses are modelled; everything else is ignored.

use serde::Deserialize;

use crate::container::ContainerID;
use crate::stats::null_as_default;

use super::{ContainerDetails, Event, Result};

/// An entry of `GET /containers/json`.
#[derive(Debug, Deserialize)]
pub(super) struct ContainerSummary {
    #[serde(rename = "Id")]
    pub id: String,
}

/// The response of `GET /containers/{id}/json`.
#[derive(Debug, Deserialize)]
pub(super) struct ContainerInspect {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Config", default, deserialize_with = "null_as_default")]
    pub config: ContainerConfig,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct ContainerConfig {
    #[serde(rename = "Env", default, deserialize_with = "null_as_default")]
    pub env: Vec<String>,
}

impl TryFrom<ContainerInspect> for ContainerDetails {
    type Error = super::Error;

    fn try_from(value: ContainerInspect) -> Result<Self> {
        Ok(Self {
            id: ContainerID::new(&value.id)?,
            name: value.name,
            env: value.config.env,
        })
    }
}

/// A message of `GET /events`.
///
/// Older API versions report `status` and `id`; newer ones only `Action` and `Actor.ID`.
#[derive(Debug, Default, Deserialize)]
pub(super) struct EventMessage {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "Type", default)]
    pub kind: Option<String>,
    #[serde(rename = "Action", default)]
    pub action: Option<String>,
    #[serde(rename = "Actor", default)]
    pub actor: Option<Actor>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct Actor {
    #[serde(rename = "ID", default)]
    pub id: Option<String>,
}

impl EventMessage {
    /// Converts the message into a container [`Event`].
    ///
    /// Returns `None` for non-container events and messages without a usable container ID.
    pub(super) fn into_event(self) -> Option<Event> {
        if self.kind.as_deref().is_some_and(|kind| kind != "container") {
            return None;
        }

        let status = self.status.or(self.action)?;
        let raw_id = self.id.or_else(|| self.actor.and_then(|actor| actor.id))?;
        match ContainerID::new(&raw_id) {
            Ok(id) => Some(Event::new(id, normalize_status(&status))),
            Err(err) => {
                log::debug!("skipping `{}` event: {}", status, err);
                None
            }
        }
    }
}

/// Strips the details Docker appends to some statuses, e.g. `exec_start: sh -c ls`.
fn normalize_status(status: &str) -> &str {
    status
        .split_once(':')
        .map_or(status, |(status, _)| status)
        .trim()
}
