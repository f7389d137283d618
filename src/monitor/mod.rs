//! The monitor: container registry, lifecycle orchestration and metric stream attachments.
//!
//! A [`Monitor`] first attaches to every running container, then follows the runtime's
//! lifecycle event feed. Handled events are counted as `Container.<Status>` and drive the
//! attachments:
//!
//! | status              | effect                                              |
//! |---------------------|-----------------------------------------------------|
//! | `start`, `restart`  | attach, unless a live attachment exists             |
//! | `die`               | cancel the attachment                               |
//! | `destroy`           | cancel the attachment and evict from the registry   |
//!
//! Each attachment forwards at most one stats record per [`Resolution`] to the adapter
//! and drops the rest. Attachments run independently; a panic in one ends only that one.

mod attachment;
mod error;
mod events;
mod registry;
mod ticker;
mod watcher;


pub use error::{Error, Result};
pub use events::{DEFAULT_WHITELIST, EventFilter, notification_name};
pub use registry::Registry;
pub use ticker::{Resolution, Ticker};
pub use watcher::{Monitor, MonitorBuilder};
