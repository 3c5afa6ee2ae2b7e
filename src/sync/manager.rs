//! Catalog sync manager: bridges a push-based source to typed local state.

use crate::source::{FeedId, Query, RemoteSource, SnapshotSink, SubscribeOptions};
use crate::types::{Document, Entity};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};

use super::delivery::{SnapshotSubscriber, TypedSubscriber};
use super::types::{Connectivity, SubscriptionHandle, SubscriptionId};

/// One shared feed and everyone listening to it.
struct Channel {
    /// Distinguishes this channel from earlier ones on the same query.
    generation: u64,
    /// None while the feed is being opened.
    feed: Option<FeedId>,
    /// Incremented on every snapshot.
    revision: u64,
    /// Last complete snapshot.
    latest: Option<Arc<Vec<Document>>>,
    /// Subscribers in registration order.
    subscribers: Vec<Arc<dyn SnapshotSubscriber>>,
}

/// Where a subscription lives.
struct Route {
    query: Query,
    subscriber: Arc<dyn SnapshotSubscriber>,
    /// Why the feed could not be opened, if it could not.
    degraded: Option<String>,
}

struct Inner {
    source: Arc<dyn RemoteSource>,
    /// Open channels by query.
    channels: RwLock<HashMap<Query, Channel>>,
    /// Active subscriptions by ID.
    routes: RwLock<HashMap<SubscriptionId, Route>>,
    connectivity: RwLock<Connectivity>,
    /// Counter for generating subscription IDs.
    next_id: AtomicU64,
    /// Counter for channel generations.
    next_generation: AtomicU64,
}

impl Inner {
    fn on_snapshot(&self, query: &Query, generation: u64, documents: Vec<Document>) {
        let documents = Arc::new(documents);
        let (revision, subscribers) = {
            let mut channels = self.channels.write();
            let Some(channel) = channels
                .get_mut(query)
                .filter(|channel| channel.generation == generation)
            else {
                return;
            };
            channel.revision += 1;
            channel.latest = Some(Arc::clone(&documents));
            (channel.revision, channel.subscribers.clone())
        };

        self.set_connectivity(Connectivity::Connected);
        debug!(
            collection = %query.collection,
            revision,
            documents = documents.len(),
            subscribers = subscribers.len(),
            "snapshot received"
        );

        for subscriber in subscribers {
            subscriber.deliver(revision, &documents);
        }
    }

    fn set_connectivity(&self, status: Connectivity) {
        let mut current = self.connectivity.write();
        if *current != status {
            match &status {
                Connectivity::Degraded { reason } => {
                    warn!(%reason, "remote source unavailable, serving empty catalog")
                }
                Connectivity::Connected => info!("remote source connected"),
                Connectivity::Unknown => {}
            }
            *current = status;
        }
    }
}

/// Owns live subscriptions and republishes typed snapshots.
///
/// Identical queries share one feed on the source. Cloning the manager is
/// cheap and yields a handle to the same state.
#[derive(Clone)]
pub struct CatalogSyncManager {
    inner: Arc<Inner>,
}

impl CatalogSyncManager {
    /// Create a new manager over `source`.
    pub fn new(source: Arc<dyn RemoteSource>) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                channels: RwLock::new(HashMap::new()),
                routes: RwLock::new(HashMap::new()),
                connectivity: RwLock::new(Connectivity::Unknown),
                next_id: AtomicU64::new(1),
                next_generation: AtomicU64::new(1),
            }),
        }
    }

    /// Observe a collection.
    ///
    /// `on_update` receives the complete typed list on every snapshot. If the
    /// feed already has a snapshot it is delivered before this returns. If
    /// the source cannot serve the query, `on_update` gets an empty list and
    /// [`status`](Self::status) reports the failure for this subscription.
    pub fn subscribe<T, F>(
        &self,
        collection: &str,
        options: SubscribeOptions,
        on_update: F,
    ) -> SubscriptionHandle
    where
        T: Entity,
        F: Fn(Arc<Vec<T>>) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::SeqCst));
        let query = Query::new(collection, options);
        let subscriber: Arc<dyn SnapshotSubscriber> = Arc::new(TypedSubscriber::<T>::new(
            id,
            collection,
            Box::new(on_update),
        ));

        self.inner.routes.write().insert(
            id,
            Route {
                query: query.clone(),
                subscriber: Arc::clone(&subscriber),
                degraded: None,
            },
        );

        let (opening, cached) = {
            let mut channels = self.inner.channels.write();
            match channels.get_mut(&query) {
                Some(channel) => {
                    channel.subscribers.push(Arc::clone(&subscriber));
                    let cached = channel
                        .latest
                        .as_ref()
                        .map(|docs| (channel.revision, Arc::clone(docs)));
                    (None, cached)
                }
                None => {
                    let generation = self.inner.next_generation.fetch_add(1, Ordering::SeqCst);
                    channels.insert(
                        query.clone(),
                        Channel {
                            generation,
                            feed: None,
                            revision: 0,
                            latest: None,
                            subscribers: vec![Arc::clone(&subscriber)],
                        },
                    );
                    (Some(generation), None)
                }
            }
        };

        debug!(subscription = id.0, collection, shared = opening.is_none(), "subscribed");

        if let Some((revision, documents)) = cached {
            subscriber.deliver(revision, &documents);
        }
        if let Some(generation) = opening {
            self.open_feed(&query, generation);
        }

        SubscriptionHandle {
            id,
            collection: collection.to_string(),
        }
    }

    /// Open the source feed for the channel of `query` created as `generation`.
    ///
    /// The channel may be gone, or replaced by a newer one, by the time the
    /// source answers; the feed is then closed again rather than adopted.
    fn open_feed(&self, query: &Query, generation: u64) {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let key = query.clone();
        let sink: SnapshotSink = Arc::new(move |documents| {
            if let Some(inner) = weak.upgrade() {
                inner.on_snapshot(&key, generation, documents);
            }
        });

        let opened = query
            .validate()
            .and_then(|()| self.inner.source.subscribe(query, sink));

        match opened {
            Ok(feed) => {
                let orphaned = match self.inner.channels.write().get_mut(query) {
                    Some(channel) if channel.generation == generation => {
                        channel.feed = Some(feed);
                        false
                    }
                    _ => true,
                };
                if orphaned {
                    // Everyone left while the feed was opening.
                    self.inner.source.unsubscribe(feed);
                    debug!(feed = feed.0, collection = %query.collection, "orphaned feed closed");
                } else {
                    self.inner.set_connectivity(Connectivity::Connected);
                    debug!(feed = feed.0, collection = %query.collection, "feed open");
                }
            }
            Err(e) => {
                let reason = e.to_string();
                let stranded = {
                    let mut channels = self.inner.channels.write();
                    let current = channels
                        .get(query)
                        .map_or(false, |channel| channel.generation == generation);
                    if current {
                        channels
                            .remove(query)
                            .map(|channel| channel.subscribers)
                            .unwrap_or_default()
                    } else {
                        Vec::new()
                    }
                };
                {
                    let mut routes = self.inner.routes.write();
                    for subscriber in &stranded {
                        if let Some(route) = routes.get_mut(&subscriber.id()) {
                            route.degraded = Some(reason.clone());
                        }
                    }
                }
                self.inner
                    .set_connectivity(Connectivity::Degraded { reason });
                for subscriber in stranded {
                    subscriber.deliver(0, &[]);
                }
            }
        }
    }

    /// Cancel a subscription.
    ///
    /// Once this returns no further callback fires for it, even for a
    /// snapshot that was already in flight. The shared feed is released with
    /// its last subscriber. Unknown handles are ignored.
    pub fn unsubscribe(&self, handle: &SubscriptionHandle) {
        let Some(route) = self.inner.routes.write().remove(&handle.id) else {
            return;
        };
        route.subscriber.close();

        let released = {
            let mut channels = self.inner.channels.write();
            match channels.get_mut(&route.query) {
                Some(channel) => {
                    channel.subscribers.retain(|s| s.id() != handle.id);
                    if channel.subscribers.is_empty() {
                        channels.remove(&route.query).and_then(|channel| channel.feed)
                    } else {
                        None
                    }
                }
                None => None,
            }
        };

        if let Some(feed) = released {
            self.inner.source.unsubscribe(feed);
            debug!(feed = feed.0, collection = %route.query.collection, "feed released");
        }
        debug!(subscription = handle.id.0, "unsubscribed");
    }

    /// Overall connectivity.
    ///
    /// Degraded while any live subscription failed to open its feed, even if
    /// other feeds keep delivering; otherwise the outcome of the latest feed
    /// attempt or snapshot.
    pub fn connectivity(&self) -> Connectivity {
        let degraded = self
            .inner
            .routes
            .read()
            .values()
            .find_map(|route| route.degraded.clone());
        match degraded {
            Some(reason) => Connectivity::Degraded { reason },
            None => self.inner.connectivity.read().clone(),
        }
    }

    /// Connectivity of one subscription.
    ///
    /// `Degraded` if its feed could not be opened, `Connected` once the feed
    /// is open or has delivered, `Unknown` before that or for a cancelled
    /// handle.
    pub fn status(&self, handle: &SubscriptionHandle) -> Connectivity {
        let query = {
            let routes = self.inner.routes.read();
            let Some(route) = routes.get(&handle.id) else {
                return Connectivity::Unknown;
            };
            if let Some(reason) = &route.degraded {
                return Connectivity::Degraded {
                    reason: reason.clone(),
                };
            }
            route.query.clone()
        };
        match self.inner.channels.read().get(&query) {
            Some(channel) if channel.feed.is_some() || channel.latest.is_some() => {
                Connectivity::Connected
            }
            _ => Connectivity::Unknown,
        }
    }

    /// Get subscription count.
    pub fn subscription_count(&self) -> usize {
        self.inner.routes.read().len()
    }

    /// Number of distinct feeds held open on the source.
    pub fn feed_count(&self) -> usize {
        self.inner
            .channels
            .read()
            .values()
            .filter(|channel| channel.feed.is_some())
            .count()
    }
}
