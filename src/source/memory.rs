//! In-process document source.

use crate::error::{HubError, Result};
use crate::types::Document;
use parking_lot::{ReentrantMutex, RwLock};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::debug;

use super::{FeedId, Query, RemoteSource, SnapshotSink};

/// An open feed.
struct Feed {
    query: Query,
    sink: SnapshotSink,
}

/// Document store that pushes full query snapshots on every write.
///
/// Writes and the snapshots they trigger are serialized, so each feed sees
/// snapshots in write order. A sink may write back into the source from its
/// own thread; the nested write is published before the outer call returns.
pub struct InMemorySource {
    /// Documents by collection, then id.
    collections: RwLock<HashMap<String, BTreeMap<String, Document>>>,
    /// Open feeds by ID.
    feeds: RwLock<HashMap<FeedId, Feed>>,
    next_id: AtomicU64,
    reachable: AtomicBool,
    /// Serializes write-then-publish sequences.
    publish: ReentrantMutex<()>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            feeds: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            reachable: AtomicBool::new(true),
            publish: ReentrantMutex::new(()),
        }
    }

    /// Simulate losing (or regaining) the connection.
    ///
    /// While unreachable, new subscriptions are refused. Open feeds keep
    /// receiving local writes.
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn is_reachable(&self) -> bool {
        self.reachable.load(Ordering::SeqCst)
    }

    /// Insert or replace a document.
    pub fn put(&self, collection: &str, document: Document) {
        let _guard = self.publish.lock();
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .insert(document.id.clone(), document);
        self.publish_collection(collection);
    }

    /// Insert or replace a document from a JSON object.
    pub fn put_json(&self, collection: &str, id: &str, value: Value) -> Result<()> {
        let document = Document::from_value(id, value)?;
        self.put(collection, document);
        Ok(())
    }

    /// Set one field on an existing document.
    pub fn update_field(&self, collection: &str, id: &str, field: &str, value: Value) -> Result<()> {
        let _guard = self.publish.lock();
        {
            let mut collections = self.collections.write();
            let document = collections
                .get_mut(collection)
                .and_then(|docs| docs.get_mut(id))
                .ok_or_else(|| HubError::DocumentNotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                })?;
            document.fields.insert(field.to_string(), value);
        }
        self.publish_collection(collection);
        Ok(())
    }

    /// Delete a document. Returns whether it existed.
    pub fn delete(&self, collection: &str, id: &str) -> bool {
        let _guard = self.publish.lock();
        let removed = self
            .collections
            .write()
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .is_some();
        if removed {
            self.publish_collection(collection);
        }
        removed
    }

    /// Current documents of a collection, in id order.
    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.collections
            .read()
            .get(collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Get feed count.
    pub fn feed_count(&self) -> usize {
        self.feeds.read().len()
    }

    fn evaluate(&self, query: &Query) -> Vec<Document> {
        let collections = self.collections.read();
        match collections.get(&query.collection) {
            Some(docs) => query.apply(docs.values()),
            None => Vec::new(),
        }
    }

    /// Push fresh snapshots to every feed on `collection`.
    ///
    /// Sinks run with no lock held other than the publish guard.
    fn publish_collection(&self, collection: &str) {
        let targets: Vec<(Query, SnapshotSink)> = self
            .feeds
            .read()
            .values()
            .filter(|feed| feed.query.collection == collection)
            .map(|feed| (feed.query.clone(), feed.sink.clone()))
            .collect();

        for (query, sink) in targets {
            let snapshot = self.evaluate(&query);
            sink(snapshot);
        }
    }
}

impl Default for InMemorySource {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteSource for InMemorySource {
    fn subscribe(&self, query: &Query, sink: SnapshotSink) -> Result<FeedId> {
        if !self.is_reachable() {
            return Err(HubError::SourceUnavailable(format!(
                "cannot open feed on {}",
                query.collection
            )));
        }
        query.validate()?;

        let _guard = self.publish.lock();
        let id = FeedId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.feeds.write().insert(
            id,
            Feed {
                query: query.clone(),
                sink: sink.clone(),
            },
        );
        debug!(feed = id.0, collection = %query.collection, "feed opened");

        let snapshot = self.evaluate(query);
        sink(snapshot);
        Ok(id)
    }

    fn unsubscribe(&self, feed: FeedId) {
        if self.feeds.write().remove(&feed).is_some() {
            debug!(feed = feed.0, "feed closed");
        }
    }
}
