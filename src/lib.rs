//! # Vendor Hub
//!
//! Core of a community commerce directory: live catalog listings mirrored
//! from a remote document store, a multi-vendor cart, and a checkout that
//! sends each vendor its own order.
//!
//! ## Core Concepts
//!
//! - **Sync**: Live, full-snapshot subscriptions to remote collections
//! - **Cart**: Insertion-ordered selections keyed by item, one lock
//! - **Checkout**: Per-vendor partition, order message, out-of-band dispatch
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use vendor_hub::{Catalog, CatalogSyncManager, CartStore, CheckoutDispatcher,
//!     HubConfig, InMemorySource, WhatsAppChannel};
//!
//! let config = HubConfig::from_json_file("hub.json")?;
//! let source = Arc::new(InMemorySource::new());
//! let catalog = Catalog::new(CatalogSyncManager::new(source), config.catalog);
//!
//! let featured = catalog.featured_vendors();
//! featured.wait_loaded(std::time::Duration::from_secs(5));
//!
//! let cart = CartStore::new();
//! // cart.add(item, vendor)?;
//!
//! let dispatcher = CheckoutDispatcher::with_config(
//!     WhatsAppChannel::new(|url: &str| open_in_browser(url)),
//!     config.checkout,
//! );
//! let report = dispatcher.checkout(&cart);
//! ```

pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod source;
pub mod sync;
pub mod types;

// Re-exports
pub use cart::{CartEntry, CartStore};
pub use checkout::{
    CheckoutConfig, CheckoutDispatcher, CheckoutReport, DispatchChannel, DispatchStatus,
    LinkOpener, VendorOrder, VendorOutcome, WhatsAppChannel,
};
pub use config::HubConfig;
pub use error::{HubError, Result};
pub use source::{Direction, InMemorySource, Query, RemoteSource, SubscribeOptions};
pub use sync::{
    search_vendors, Catalog, CatalogConfig, CatalogSyncManager, CatalogView, Connectivity,
    SubscriptionHandle, SubscriptionId,
};
pub use types::{
    Article, CatalogItem, ContactHandle, Document, Entity, ItemId, Professional, Trip, Vendor,
    VendorId,
};
