//! Per-subscription snapshot delivery.

use crate::types::{Document, Entity};
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tracing::warn;

use super::types::SubscriptionId;

/// Callback invoked with each complete typed snapshot.
pub(crate) type UpdateCallback<T> = Box<dyn Fn(Arc<Vec<T>>) + Send + Sync>;

struct GateState<S> {
    /// Latest snapshot not yet handed to the callback.
    pending: Option<S>,
    /// Revision of the newest snapshot accepted so far.
    last_revision: Option<u64>,
    /// Thread currently running the callback, if any.
    running: Option<ThreadId>,
    closed: bool,
}

/// Serializes callback invocations for one subscription.
///
/// At most one callback runs at a time. A snapshot offered while a callback
/// runs replaces any pending one and is delivered by the running thread once
/// its callback returns, so intermediate snapshots are dropped rather than
/// queued. Once [`close`](Self::close) returns, no callback starts again.
pub(crate) struct DeliveryGate<S> {
    state: Mutex<GateState<S>>,
    idle: Condvar,
}

impl<S> DeliveryGate<S> {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(GateState {
                pending: None,
                last_revision: None,
                running: None,
                closed: false,
            }),
            idle: Condvar::new(),
        }
    }

    /// Offer a snapshot tagged with its feed revision.
    ///
    /// Snapshots not newer than one already accepted are ignored.
    pub(crate) fn offer<F>(&self, revision: u64, snapshot: S, run: F)
    where
        F: Fn(S),
    {
        let mut state = self.state.lock();
        if state.closed {
            return;
        }
        if matches!(state.last_revision, Some(last) if revision <= last) {
            return;
        }
        state.last_revision = Some(revision);
        state.pending = Some(snapshot);

        if state.running.is_some() {
            // The running thread picks it up, including a re-entrant offer
            // from inside the callback on this very thread.
            return;
        }
        state.running = Some(thread::current().id());

        while let Some(next) = state.pending.take() {
            if state.closed {
                break;
            }
            MutexGuard::unlocked(&mut state, || {
                if panic::catch_unwind(AssertUnwindSafe(|| run(next))).is_err() {
                    warn!("subscription callback panicked");
                }
            });
        }

        state.pending = None;
        state.running = None;
        self.idle.notify_all();
    }

    /// Stop all future deliveries and wait for an in-flight callback.
    ///
    /// Called from inside the callback itself, it returns immediately and the
    /// current callback is the last one.
    pub(crate) fn close(&self) {
        let me = thread::current().id();
        let mut state = self.state.lock();
        state.closed = true;
        state.pending = None;
        while matches!(state.running, Some(t) if t != me) {
            self.idle.wait(&mut state);
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

/// Type-erased receiver of raw snapshots, as stored by the manager.
pub(crate) trait SnapshotSubscriber: Send + Sync {
    fn id(&self) -> SubscriptionId;

    fn deliver(&self, revision: u64, documents: &[Document]);

    fn close(&self);
}

/// Maps raw snapshots to `T` and hands them to one callback.
pub(crate) struct TypedSubscriber<T: Entity> {
    id: SubscriptionId,
    collection: String,
    gate: DeliveryGate<Arc<Vec<T>>>,
    on_update: UpdateCallback<T>,
}

impl<T: Entity> TypedSubscriber<T> {
    pub(crate) fn new(id: SubscriptionId, collection: &str, on_update: UpdateCallback<T>) -> Self {
        Self {
            id,
            collection: collection.to_string(),
            gate: DeliveryGate::new(),
            on_update,
        }
    }
}

impl<T: Entity> SnapshotSubscriber for TypedSubscriber<T> {
    fn id(&self) -> SubscriptionId {
        self.id
    }

    fn deliver(&self, revision: u64, documents: &[Document]) {
        if self.gate.is_closed() {
            return;
        }
        let entities = Arc::new(map_documents::<T>(&self.collection, documents));
        self.gate
            .offer(revision, entities, |snapshot| (self.on_update)(snapshot));
    }

    fn close(&self) {
        self.gate.close();
    }
}

/// Map a snapshot to entities, dropping documents that do not fit `T`.
pub fn map_documents<T: Entity>(collection: &str, documents: &[Document]) -> Vec<T> {
    documents
        .iter()
        .filter_map(|doc| match T::from_document(doc) {
            Ok(entity) => Some(entity),
            Err(e) => {
                warn!(collection, id = %doc.id, error = %e, "dropping malformed {}", T::KIND);
                None
            }
        })
        .collect()
}
