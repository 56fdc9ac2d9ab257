//! In-process instrumentation channel.
//!
//! Drivers publish one [`StatementEvent`] per executed statement under a fixed
//! event name; subscribers registered for that name receive it synchronously,
//! on the publishing task, before the driver hands the statement's result back
//! to its caller.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::{debug, error, trace};

use crate::event::StatementEvent;

/// Event name the sea-orm instrumented connection publishes under.
pub const SQL_EVENT: &str = "sql.sea_orm";

/// Receiver of instrumentation events.
///
/// Implementations must not block for long: they run inline with the
/// statement that produced the event.
pub trait Subscriber: Send + Sync {
    fn call(&self, name: &str, event: &StatementEvent);
}

impl<F> Subscriber for F
where
    F: Fn(&str, &StatementEvent) + Send + Sync,
{
    fn call(&self, name: &str, event: &StatementEvent) {
        self(name, event)
    }
}

struct Entry {
    id: u64,
    name: String,
    subscriber: Arc<dyn Subscriber>,
}

#[derive(Default)]
struct BusInner {
    next_id: AtomicU64,
    entries: RwLock<Vec<Entry>>,
}

impl BusInner {
    fn remove(&self, id: u64) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|e| e.id != id);
        before != entries.len()
    }
}

/// Shared handle to the instrumentation channel. Cloning is cheap.
#[derive(Clone, Default)]
pub struct InstrumentationBus {
    inner: Arc<BusInner>,
}

impl InstrumentationBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `subscriber` for events published under `name`.
    ///
    /// The subscription lasts until the returned handle is dropped or
    /// [`Subscription::unsubscribe`] is called.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, name: &str, subscriber: Arc<dyn Subscriber>) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.entries.write().push(Entry {
            id,
            name: name.to_string(),
            subscriber,
        });
        debug!(event = name, subscription_id = id, "instrumentation subscribe");
        Subscription {
            bus: Arc::downgrade(&self.inner),
            id,
            name: name.to_string(),
        }
    }

    /// Deliver `event` to every subscriber of `name`, in subscription order.
    ///
    /// A panicking subscriber is logged and skipped; it never unwinds into
    /// the publisher.
    pub fn publish(&self, name: &str, event: &StatementEvent) {
        // Snapshot the targets so subscribers may (un)subscribe from inside a callback.
        let targets: Vec<(u64, Arc<dyn Subscriber>)> = self
            .inner
            .entries
            .read()
            .iter()
            .filter(|e| e.name == name)
            .map(|e| (e.id, Arc::clone(&e.subscriber)))
            .collect();

        trace!(
            event = name,
            subscribers = targets.len(),
            category = %event.category(),
            cached = event.is_cached(),
            "instrumentation publish"
        );

        for (id, subscriber) in targets {
            let outcome = catch_unwind(AssertUnwindSafe(|| subscriber.call(name, event)));
            if outcome.is_err() {
                error!(
                    event = name,
                    subscription_id = id,
                    "instrumentation subscriber panicked; event dropped for this subscriber"
                );
            }
        }
    }

    pub fn subscriber_count(&self, name: &str) -> usize {
        self.inner
            .entries
            .read()
            .iter()
            .filter(|e| e.name == name)
            .count()
    }
}

/// RAII registration on an [`InstrumentationBus`].
pub struct Subscription {
    bus: Weak<BusInner>,
    id: u64,
    name: String,
}

impl Subscription {
    pub fn event_name(&self) -> &str {
        &self.name
    }

    /// Remove the subscription now. Equivalent to dropping the handle.
    pub fn unsubscribe(self) {
        drop(self)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            if bus.remove(self.id) {
                debug!(
                    event = %self.name,
                    subscription_id = self.id,
                    "instrumentation unsubscribe"
                );
            }
        }
    }
}
