//! Render-ready local mirrors of one subscription.

use crate::source::SubscribeOptions;
use crate::types::Entity;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;

use super::manager::CatalogSyncManager;
use super::types::{Connectivity, SubscriptionHandle};

struct ViewState<T> {
    items: Arc<Vec<T>>,
    revision: u64,
}

/// An owned, always-complete copy of one collection query.
///
/// Readers see either the previous snapshot or the next one, never a mix.
/// Dropping the view cancels its subscription.
pub struct CatalogView<T: Entity> {
    manager: CatalogSyncManager,
    handle: SubscriptionHandle,
    state: Arc<RwLock<ViewState<T>>>,
    /// Signals that a new revision was published since the last wait.
    updates: Receiver<u64>,
}

impl<T: Entity> CatalogView<T> {
    /// Subscribe and start mirroring.
    pub fn open(manager: &CatalogSyncManager, collection: &str, options: SubscribeOptions) -> Self {
        let state = Arc::new(RwLock::new(ViewState {
            items: Arc::new(Vec::new()),
            revision: 0,
        }));
        // One slot: a pending signal already covers any newer revision.
        let (notify, updates) = bounded(1);

        let writer = Arc::clone(&state);
        let handle = manager.subscribe::<T, _>(collection, options, move |items| {
            let revision = {
                let mut state = writer.write();
                state.items = items;
                state.revision += 1;
                state.revision
            };
            let _ = notify.try_send(revision);
        });

        Self {
            manager: manager.clone(),
            handle,
            state,
            updates,
        }
    }

    /// The last complete list.
    pub fn snapshot(&self) -> Arc<Vec<T>> {
        Arc::clone(&self.state.read().items)
    }

    /// Number of snapshots received so far.
    pub fn revision(&self) -> u64 {
        self.state.read().revision
    }

    /// Whether at least one snapshot (possibly a degraded empty one) arrived.
    pub fn is_loaded(&self) -> bool {
        self.revision() > 0
    }

    pub fn len(&self) -> usize {
        self.state.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().items.is_empty()
    }

    /// Look up an entity by id in the current snapshot.
    pub fn get(&self, id: &str) -> Option<T> {
        self.state
            .read()
            .items
            .iter()
            .find(|item| item.id() == id)
            .cloned()
    }

    /// Block until a snapshot not yet waited for arrives.
    ///
    /// Returns false on timeout.
    pub fn wait_for_update(&self, timeout: Duration) -> bool {
        match self.updates.recv_timeout(timeout) {
            Ok(_) => true,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => false,
        }
    }

    /// Block until the first snapshot is in place.
    pub fn wait_loaded(&self, timeout: Duration) -> bool {
        self.is_loaded() || self.wait_for_update(timeout)
    }

    /// Connectivity of this view's own subscription.
    ///
    /// An empty view that is `Degraded` could not reach the source; an empty
    /// view that is `Connected` mirrors an empty collection.
    pub fn connectivity(&self) -> Connectivity {
        self.manager.status(&self.handle)
    }

    pub fn handle(&self) -> &SubscriptionHandle {
        &self.handle
    }
}

impl<T: Entity> Drop for CatalogView<T> {
    fn drop(&mut self) {
        self.manager.unsubscribe(&self.handle);
    }
}
