//! Remote document sources.
//!
//! A source exposes named collections that can be queried with at most one
//! equality filter, one ordering field and a limit, and pushes a full
//! snapshot of the query result to a sink every time it changes.
//!
//! [`InMemorySource`] is an in-process implementation used for tests,
//! benchmarks and offline demos.

mod memory;

pub use memory::InMemorySource;

use crate::error::{HubError, Result};
use crate::types::Document;
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::Arc;

/// Receives full snapshots for one feed.
pub type SnapshotSink = Arc<dyn Fn(Vec<Document>) + Send + Sync>;

/// Identifier of a live feed opened on a source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FeedId(pub u64);

/// A push-based document source.
pub trait RemoteSource: Send + Sync {
    /// Open a live feed for `query`.
    ///
    /// The sink is called with the full result set every time it changes.
    /// Implementations may call it before returning.
    fn subscribe(&self, query: &Query, sink: SnapshotSink) -> Result<FeedId>;

    /// Close a feed. Unknown ids are ignored.
    fn unsubscribe(&self, feed: FeedId);
}

/// Sort direction for an ordered query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Single-field ordering.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// Value side of an equality filter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FilterValue {
    String(String),
    Integer(i64),
    Bool(bool),
}

impl FilterValue {
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (FilterValue::String(s), Value::String(v)) => s == v,
            (FilterValue::Integer(i), Value::Number(n)) => match n.as_i64() {
                Some(v) => v == *i,
                None => n.as_f64() == Some(*i as f64),
            },
            (FilterValue::Bool(b), Value::Bool(v)) => b == v,
            _ => false,
        }
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::String(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        FilterValue::String(s)
    }
}

impl From<i64> for FilterValue {
    fn from(i: i64) -> Self {
        FilterValue::Integer(i)
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        FilterValue::Bool(b)
    }
}

/// Single-field equality filter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldFilter {
    pub field: String,
    pub value: FilterValue,
}

/// Optional filter, ordering and limit applied to a collection.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SubscribeOptions {
    pub filter: Option<FieldFilter>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl SubscribeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only documents whose `field` equals `value`.
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.filter = Some(FieldFilter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn ascending(self, field: impl Into<String>) -> Self {
        self.order_by(field, Direction::Ascending)
    }

    pub fn descending(self, field: impl Into<String>) -> Self {
        self.order_by(field, Direction::Descending)
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A collection plus its options. Identical queries may share one feed.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Query {
    pub collection: String,
    pub options: SubscribeOptions,
}

impl Query {
    pub fn new(collection: impl Into<String>, options: SubscribeOptions) -> Self {
        Self {
            collection: collection.into(),
            options,
        }
    }

    /// Reject queries no source can serve.
    pub fn validate(&self) -> Result<()> {
        if self.collection.trim().is_empty() {
            return Err(HubError::InvalidQuery("empty collection name".into()));
        }
        if self.options.limit == Some(0) {
            return Err(HubError::InvalidQuery(format!(
                "limit of 0 on {}",
                self.collection
            )));
        }
        if let Some(filter) = &self.options.filter {
            if filter.field.is_empty() {
                return Err(HubError::InvalidQuery("empty filter field".into()));
            }
        }
        if let Some(order) = &self.options.order_by {
            if order.field.is_empty() {
                return Err(HubError::InvalidQuery("empty order field".into()));
            }
        }
        Ok(())
    }

    /// Evaluate the query over a collection's documents.
    ///
    /// Ordered queries drop documents that lack the order field and break
    /// ties by document id.
    pub fn apply<'a, I>(&self, documents: I) -> Vec<Document>
    where
        I: IntoIterator<Item = &'a Document>,
    {
        let mut matched: Vec<&Document> = documents
            .into_iter()
            .filter(|doc| match &self.options.filter {
                Some(filter) => doc
                    .get(&filter.field)
                    .map_or(false, |v| filter.value.matches(v)),
                None => true,
            })
            .collect();

        if let Some(order) = &self.options.order_by {
            matched.retain(|doc| doc.get(&order.field).is_some());
            matched.sort_by(|a, b| {
                let ord = compare_values(
                    a.get(&order.field).unwrap_or(&Value::Null),
                    b.get(&order.field).unwrap_or(&Value::Null),
                );
                let ord = match order.direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                };
                ord.then_with(|| a.id.cmp(&b.id))
            });
        }

        if let Some(limit) = self.options.limit {
            matched.truncate(limit);
        }

        matched.into_iter().cloned().collect()
    }
}

/// Total order over JSON values: null < bool < number < string < array < object.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
