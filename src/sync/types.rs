//! Subscription types for live catalog mirroring.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Handle to cancel a subscription.
///
/// Dropping the handle does not cancel; pass it to
/// [`CatalogSyncManager::unsubscribe`](super::CatalogSyncManager::unsubscribe).
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    pub id: SubscriptionId,
    pub collection: String,
}

/// Whether the remote source could be reached.
///
/// A degraded subscription still delivers an (empty) list, so consumers use
/// this flag to tell "no connection" apart from "collection is empty".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Connectivity {
    /// No feed has been opened yet.
    #[default]
    Unknown,
    /// The last feed attempt succeeded or a snapshot arrived.
    Connected,
    /// The feed could not be opened.
    Degraded { reason: String },
}

impl Connectivity {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Connectivity::Degraded { .. })
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Connectivity::Connected)
    }
}
