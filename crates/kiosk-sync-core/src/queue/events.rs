//! Queue lifecycle events and the observer registry

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::models::{JobId, Voting};

/// Event names observers can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    QueueStart,
    QueueStop,
    SyncJobStart,
    SyncJobSuccess,
    SyncJobFailure,
}

impl EventKind {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::QueueStart => "onQueueStart",
            Self::QueueStop => "onQueueStop",
            Self::SyncJobStart => "onSyncJobStart",
            Self::SyncJobSuccess => "onSyncJobSuccess",
            Self::SyncJobFailure => "onSyncJobFailure",
        }
    }
}

/// Payload of per-job events
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobEventPayload {
    pub job_id: JobId,
    pub voting: Voting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueEvent {
    QueueStart,
    QueueStop,
    SyncJobStart(JobEventPayload),
    SyncJobSuccess(JobEventPayload),
    SyncJobFailure(JobEventPayload),
}

impl QueueEvent {
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::QueueStart => EventKind::QueueStart,
            Self::QueueStop => EventKind::QueueStop,
            Self::SyncJobStart(_) => EventKind::SyncJobStart,
            Self::SyncJobSuccess(_) => EventKind::SyncJobSuccess,
            Self::SyncJobFailure(_) => EventKind::SyncJobFailure,
        }
    }

    /// Job payload of per-job events
    #[must_use]
    pub const fn job(&self) -> Option<&JobEventPayload> {
        match self {
            Self::SyncJobStart(payload)
            | Self::SyncJobSuccess(payload)
            | Self::SyncJobFailure(payload) => Some(payload),
            Self::QueueStart | Self::QueueStop => None,
        }
    }
}

/// Handle returned by a registration, used to remove exactly that registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    id: u64,
    kind: EventKind,
}

impl Subscription {
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        self.kind
    }
}

type Handler = Arc<dyn Fn(&QueueEvent) + Send + Sync>;

struct Registration {
    subscription: Subscription,
    handler: Handler,
}

/// Ordered handler lists per event kind.
///
/// Handlers run synchronously on the emitting task, in registration order.
/// They are called outside the registry lock, so a handler may register or
/// unregister other handlers; the change applies from the next emission.
#[derive(Default)]
pub struct EventRegistry {
    next_id: AtomicU64,
    registrations: RwLock<Vec<Registration>>,
}

impl EventRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&self, kind: EventKind, handler: F) -> Subscription
    where
        F: Fn(&QueueEvent) + Send + Sync + 'static,
    {
        let subscription = Subscription {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            kind,
        };
        self.registrations.write().push(Registration {
            subscription,
            handler: Arc::new(handler),
        });
        subscription
    }

    /// Remove a registration; unknown handles are ignored and return `false`
    pub fn unregister(&self, subscription: &Subscription) -> bool {
        let mut registrations = self.registrations.write();
        let before = registrations.len();
        registrations.retain(|registration| registration.subscription != *subscription);
        registrations.len() != before
    }

    pub fn emit(&self, event: &QueueEvent) {
        let kind = event.kind();
        let handlers: Vec<Handler> = self
            .registrations
            .read()
            .iter()
            .filter(|registration| registration.subscription.kind == kind)
            .map(|registration| Arc::clone(&registration.handler))
            .collect();

        tracing::trace!(event = kind.name(), handlers = handlers.len(), "Emitting queue event");
        for handler in handlers {
            handler(event);
        }
    }
}
