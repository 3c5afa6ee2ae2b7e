//! Live catalog synchronization.
//!
//! This module mirrors remote collections into local, typed state:
//! - Full-snapshot replacement on every remote change
//! - Shared feeds for identical queries
//! - At most one in-flight callback per subscription, with superseded
//!   snapshots dropped
//! - Silence after cancellation, even for snapshots already in flight
//! - Empty lists plus a degraded connectivity flag when the source is down
//!
//! # Example
//!
//! ```ignore
//! let manager = CatalogSyncManager::new(source);
//!
//! let handle = manager.subscribe::<Vendor, _>(
//!     "stores",
//!     SubscribeOptions::new().descending("rating").limit(6),
//!     |vendors| println!("{} featured vendors", vendors.len()),
//! );
//!
//! if manager.status(&handle).is_degraded() {
//!     println!("offline, showing an empty catalog");
//! }
//!
//! manager.unsubscribe(&handle);
//! ```

mod catalog;
mod delivery;
mod manager;
mod types;
mod view;

pub use catalog::{search_vendors, Catalog, CatalogConfig};
pub use delivery::map_documents;
pub use manager::CatalogSyncManager;
pub use types::{Connectivity, SubscriptionHandle, SubscriptionId};
pub use view::CatalogView;
