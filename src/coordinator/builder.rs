use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use super::coordinator::Coordinator;
use crate::{
    config::Config,
    events::{Bus, EventKind},
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for constructing a [`Coordinator`].
pub struct CoordinatorBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl CoordinatorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive every event published by components this
    /// coordinator builds, through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the coordinator.
    ///
    /// This consumes the builder and initializes:
    /// - the event bus
    /// - subscriber workers
    /// - the listener forwarding bus events to subscribers
    ///
    /// Must be called inside a tokio runtime.
    pub fn build(self) -> Coordinator {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));

        // Subscribe before anything can publish.
        let mut rx = bus.subscribe();
        let set = Arc::clone(&subs);
        let listener = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => {
                        let last = ev.kind == EventKind::ShutdownComplete;
                        set.emit(ev);
                        if last {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                }
            }
        });

        Coordinator::new_internal(self.cfg, bus, subs, listener, CancellationToken::new())
    }
}
