use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::adapter::{Adapter, NullAdapter};
use crate::container::{Container, ContainerID};
use crate::docker::{Event, Runtime};
use crate::error::ResultOkLogExt;

use super::attachment::Attachments;
use super::events::{EventFilter, notification_name};
use super::registry::Registry;
use super::ticker::Resolution;
use super::{Error, Result};

/// Builder for a [`Monitor`].
///
/// # Examples
///
/// ```no_run
/// # use creo_stats::adapter::LogAdapter;
/// # use creo_stats::docker::DockerClient;
/// # use creo_stats::monitor::{EventFilter, MonitorBuilder, Resolution};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let adapter = LogAdapter::stdout(None, "node-1")?;
/// let mut builder = MonitorBuilder::new(DockerClient::new("/var/run/docker.sock")).adapter(adapter);
/// builder
///     .set_resolution(Resolution::from_secs(5))
///     .set_filter(EventFilter::new(["start", "die"]));
/// let monitor = builder.build();
/// monitor.run().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MonitorBuilder<R, A = NullAdapter> {
    runtime: R,
    adapter: A,
    filter: EventFilter,
    resolution: Resolution,
    shutdown: CancellationToken,
}

impl<R: Runtime> MonitorBuilder<R> {
    pub fn new(runtime: R) -> Self {
        Self {
            runtime,
            adapter: NullAdapter,
            filter: EventFilter::default(),
            resolution: Resolution::default(),
            shutdown: CancellationToken::new(),
        }
    }
}

impl<R: Runtime, A: Adapter> MonitorBuilder<R, A> {
    /// Replaces the sink all metrics are forwarded to.
    pub fn adapter<B: Adapter>(self, adapter: B) -> MonitorBuilder<R, B> {
        MonitorBuilder {
            runtime: self.runtime,
            adapter,
            filter: self.filter,
            resolution: self.resolution,
            shutdown: self.shutdown,
        }
    }

    pub fn set_filter(&mut self, filter: EventFilter) -> &mut Self {
        self.filter = filter;
        self
    }

    pub fn set_resolution(&mut self, resolution: Resolution) -> &mut Self {
        self.resolution = resolution;
        self
    }

    pub fn build(self) -> Monitor<R, A> {
        Monitor {
            runtime: Arc::new(self.runtime),
            adapter: Arc::new(self.adapter),
            registry: Registry::default(),
            attachments: Attachments::new(self.shutdown.clone()),
            filter: self.filter,
            resolution: self.resolution,
            shutdown: self.shutdown,
        }
    }
}

/// Watches container lifecycle events and keeps one metric stream attachment per
/// running container.
#[derive(Debug)]
pub struct Monitor<R, A = NullAdapter> {
    runtime: Arc<R>,
    adapter: Arc<A>,
    registry: Registry,
    attachments: Attachments,
    filter: EventFilter,
    resolution: Resolution,
    shutdown: CancellationToken,
}

impl<R: Runtime> Monitor<R> {
    /// Creates a monitor with default settings that discards all metrics.
    pub fn new(runtime: R) -> Self {
        MonitorBuilder::new(runtime).build()
    }
}

impl<R: Runtime, A: Adapter> Monitor<R, A> {
    /// Attaches to all running containers, then follows the lifecycle event feed.
    ///
    /// Returns `Ok(())` once the shutdown token is cancelled and all attachments have
    /// finished.
    ///
    /// # Errors
    ///
    /// - [`Error::Startup`] if the running containers cannot be listed.
    /// - [`Error::Subscription`] if the event feed cannot be opened.
    /// - [`Error::UnexpectedStop`] if the event feed ends.
    pub async fn run(&self) -> Result<()> {
        let ids = self
            .runtime
            .list_running_containers()
            .await
            .map_err(Error::Startup)?;
        let mut attached = 0;
        for id in &ids {
            let registered = self
                .registry
                .get_or_register(self.runtime.as_ref(), id)
                .await
                .ok_log();
            if let Some((container, _)) = registered {
                if self.attach(container) {
                    attached += 1;
                }
            }
        }
        log::info!("attached to {} of {} running containers", attached, ids.len());

        let mut events = self
            .runtime
            .subscribe_events()
            .await
            .map_err(Error::Subscription)?;
        loop {
            let event = tokio::select! {
                _ = self.shutdown.cancelled() => {
                    self.shutdown().await;
                    return Ok(());
                }
                event = events.recv() => event,
            };
            match event {
                Some(event) => self.handle_event(event).await,
                None => break,
            }
        }

        Err(Error::UnexpectedStop)
    }

    /// Cancels all attachments and waits for them to finish.
    pub async fn shutdown(&self) {
        self.attachments.shutdown().await;
        log::info!("monitor stopped");
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn is_attached(&self, id: &ContainerID) -> bool {
        self.attachments.is_attached(id)
    }

    /// Returns the number of live attachments.
    pub fn attachment_count(&self) -> usize {
        self.attachments.len()
    }

    async fn handle_event(&self, event: Event) {
        log::debug!("received `{}` event for container {}", event.status, event.id);
        if !self.filter.handles(&event.status) {
            log::trace!("ignoring `{}` event", event.status);
            return;
        }

        let Some((container, _)) = self
            .registry
            .get_or_register(self.runtime.as_ref(), &event.id)
            .await
            .ok_log()
        else {
            return;
        };

        let name = notification_name(&event.status);
        self.adapter
            .incr(&container, &name, 1)
            .ok_log_context(format_args!("failed to count `{}` of `{}`", name, container.name()));

        match event.status.as_str() {
            "start" | "restart" => {
                self.attach(container);
            }
            "die" => {
                self.attachments.detach(container.id());
            }
            "destroy" => {
                self.attachments.detach(container.id());
                self.registry.remove(container.id()).await;
                log::debug!("evicted container `{}`", container.name());
            }
            _ => {}
        }
    }

    fn attach(&self, container: Arc<Container>) -> bool {
        self.attachments
            .attach(&self.runtime, &self.adapter, container, self.resolution)
    }
}
