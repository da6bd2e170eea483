//! Wiring handed to every component a coordinator builds.

use tokio_util::sync::CancellationToken;

use crate::events::Bus;
use crate::sync::{CompletionBarrier, DoneGuard};

/// What a component's background task needs from its owner.
///
/// - `bus`: where lifecycle events are published
/// - `stop`: cancelled by the component's own stop call or by coordinator shutdown
/// - `guard`: held by the background task and dropped after its final event
pub(crate) struct Scope {
    pub(crate) bus: Bus,
    pub(crate) stop: CancellationToken,
    pub(crate) guard: DoneGuard,
}

impl Scope {
    /// Scope for a component created outside any coordinator.
    pub(crate) fn detached() -> Self {
        Self {
            bus: Bus::default(),
            stop: CancellationToken::new(),
            guard: CompletionBarrier::new().guard(),
        }
    }

    /// Scope with a caller-chosen bus, for components and tests that listen to events.
    #[cfg(test)]
    pub(crate) fn on(bus: Bus) -> Self {
        Self {
            bus,
            ..Self::detached()
        }
    }
}
