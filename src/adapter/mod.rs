//! Sinks for container telemetry.
//!
//! An [`Adapter`] receives flattened resource samples and lifecycle counters. Exactly
//! one adapter is chosen when the monitor is built; [`NullAdapter`] discards everything
//! and is what a monitor uses when nothing else is configured.
//!
//! Available adapters:
//!
//! - [`LogAdapter`] — writes one templated line per metric, l2met style by default.
//! - [`StatsdAdapter`] — sends gauges and counters to a StatsD server over UDP.

mod log;
mod statsd;
mod template;

use crate::container::Container;

pub use self::log::{L2MET_TEMPLATE, LogAdapter};
pub use statsd::{STATSD_TEMPLATE, StatsdAdapter};
pub use template::{Metric, Template, TemplateError};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid template: {0}")]
    Template(#[from] TemplateError),
    #[error("failed to write metric: {0}")]
    Write(#[from] std::io::Error),
    #[error("failed to send metric to statsd: {0}")]
    Statsd(#[from] cadence::MetricError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// A destination for container metrics.
///
/// Calls are made concurrently from every attachment and from the event loop without
/// any serialization on the caller side; implementations guard their own state. Calls
/// must return quickly, as a slow call stalls the metric stream of the calling container.
pub trait Adapter: Send + Sync + 'static {
    /// Records a point-in-time reading.
    fn sample(&self, container: &Container, name: &str, value: u64) -> Result<()>;

    /// Records a monotonic increment.
    fn incr(&self, container: &Container, name: &str, value: u64) -> Result<()>;
}

/// An [`Adapter`] that discards all metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAdapter;

impl Adapter for NullAdapter {
    fn sample(&self, _container: &Container, _name: &str, _value: u64) -> Result<()> {
        Ok(())
    }

    fn incr(&self, _container: &Container, _name: &str, _value: u64) -> Result<()> {
        Ok(())
    }
}
