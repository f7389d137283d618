use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::FutureExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::adapter::Adapter;
use crate::container::{Container, ContainerID};
use crate::docker::Runtime;
use crate::error::ResultOkLogExt;
use crate::stats::Stats;

use super::Error;
use super::ticker::{Resolution, Ticker};

#[derive(Debug)]
struct Handle {
    generation: u64,
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl Handle {
    fn is_live(&self) -> bool {
        !self.token.is_cancelled() && !self.task.is_finished()
    }
}

/// The table of running metric stream attachments, at most one per container.
#[derive(Debug)]
pub(super) struct Attachments {
    handles: Arc<DashMap<ContainerID, Handle>>,
    generation: AtomicU64,
    tracker: TaskTracker,
    shutdown: CancellationToken,
}

impl Attachments {
    pub(super) fn new(shutdown: CancellationToken) -> Self {
        Self {
            handles: Arc::default(),
            generation: AtomicU64::new(0),
            tracker: TaskTracker::new(),
            shutdown,
        }
    }

    /// Spawns an attachment for `container` unless a live one exists.
    ///
    /// Returns `true` if a new attachment was spawned.
    pub(super) fn attach<R: Runtime, A: Adapter>(
        &self,
        runtime: &Arc<R>,
        adapter: &Arc<A>,
        container: Arc<Container>,
        resolution: Resolution,
    ) -> bool {
        if self.shutdown.is_cancelled() {
            return false;
        }

        // the shard stays locked until the new handle is stored
        match self.handles.entry(container.id().clone()) {
            Entry::Occupied(mut entry) => {
                if entry.get().is_live() {
                    log::debug!("container `{}` is already attached", container.name());
                    return false;
                }
                entry.insert(self.spawn(runtime, adapter, container, resolution));
            }
            Entry::Vacant(entry) => {
                entry.insert(self.spawn(runtime, adapter, container, resolution));
            }
        }

        true
    }

    /// Cancels the attachment of `id`. Returns `false` if there was none.
    pub(super) fn detach(&self, id: &ContainerID) -> bool {
        match self.handles.remove(id) {
            Some((_, handle)) => {
                handle.token.cancel();
                true
            }
            None => false,
        }
    }

    pub(super) fn is_attached(&self, id: &ContainerID) -> bool {
        self.handles.get(id).is_some_and(|handle| handle.is_live())
    }

    pub(super) fn len(&self) -> usize {
        self.handles.iter().filter(|handle| handle.is_live()).count()
    }

    /// Cancels all attachments and waits for them to finish.
    pub(super) async fn shutdown(&self) {
        self.shutdown.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }

    fn spawn<R: Runtime, A: Adapter>(
        &self,
        runtime: &Arc<R>,
        adapter: &Arc<A>,
        container: Arc<Container>,
        resolution: Resolution,
    ) -> Handle {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let token = self.shutdown.child_token();
        let attachment = Attachment {
            runtime: Arc::clone(runtime),
            adapter: Arc::clone(adapter),
            container: Arc::clone(&container),
            resolution,
            token: token.clone(),
        };
        let handles = Arc::clone(&self.handles);

        let task = self.tracker.spawn(async move {
            if let Err(panic) = AssertUnwindSafe(attachment.run()).catch_unwind().await {
                log::error!(
                    "attachment of container `{}` panicked: {}",
                    container.name(),
                    panic_message(&*panic)
                );
            }
            handles.remove_if(container.id(), |_, handle| handle.generation == generation);
            log::info!("detached from container `{}`", container.name());
        });

        Handle {
            generation,
            token,
            task,
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic payload")
}

/// Forwards the throttled stats stream of one container to the adapter.
struct Attachment<R, A> {
    runtime: Arc<R>,
    adapter: Arc<A>,
    container: Arc<Container>,
    resolution: Resolution,
    token: CancellationToken,
}

impl<R: Runtime, A: Adapter> Attachment<R, A> {
    async fn run(self) {
        let id = self.container.id();
        let opened = tokio::select! {
            _ = self.token.cancelled() => return,
            opened = self.runtime.open_stats_stream(id) => opened,
        };
        let mut stats = match opened {
            Ok(stats) => stats,
            Err(source) => {
                let err = Error::StreamOpen {
                    id: id.clone(),
                    source,
                };
                log::error!("{err}");
                return;
            }
        };
        log::info!("attached to container `{}` ({})", self.container.name(), id);

        let mut ticker = Ticker::new(self.resolution);
        loop {
            let record = tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                record = stats.recv() => record,
            };
            let Some(record) = record else {
                log::debug!("stats stream of `{}` closed", self.container.name());
                break;
            };

            if ticker.check() {
                self.forward(&record);
            } else {
                log::trace!("dropping stats of `{}`", self.container.name());
            }
        }
    }

    fn forward(&self, stats: &Stats) {
        for sample in stats.samples() {
            self.adapter
                .sample(&self.container, &sample.name, sample.value)
                .ok_log_context(format_args!(
                    "failed to forward `{}` of `{}`",
                    sample.name,
                    self.container.name()
                ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(panic_message(&*payload), "static message");

        let payload: Box<dyn Any + Send> = Box::new(format!("formatted {}", 1));
        assert_eq!(panic_message(&*payload), "formatted 1");

        let payload: Box<dyn Any + Send> = Box::new(42);
        assert_eq!(panic_message(&*payload), "unknown panic payload");
    }
}
