//! The fixed set of live listings the directory shows.

use crate::source::SubscribeOptions;
use crate::types::{Article, CatalogItem, Professional, Trip, Vendor, VendorId};
use serde::{Deserialize, Serialize};

use super::manager::CatalogSyncManager;
use super::view::CatalogView;

/// Remote collection and field names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CatalogConfig {
    pub vendors: String,
    pub items: String,
    pub articles: String,
    pub professionals: String,
    pub trips: String,
    /// Field on item documents naming their vendor.
    pub item_vendor_field: String,
    /// How many vendors the featured listing shows.
    /// Default: 6
    pub featured_vendors: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            vendors: "stores".into(),
            items: "products".into(),
            articles: "news".into(),
            professionals: "professionals".into(),
            trips: "trips".into(),
            item_vendor_field: "storeId".into(),
            featured_vendors: 6,
        }
    }
}

/// Opens the directory's standard views on a [`CatalogSyncManager`].
#[derive(Clone)]
pub struct Catalog {
    manager: CatalogSyncManager,
    config: CatalogConfig,
}

impl Catalog {
    pub fn new(manager: CatalogSyncManager, config: CatalogConfig) -> Self {
        Self { manager, config }
    }

    pub fn manager(&self) -> &CatalogSyncManager {
        &self.manager
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Best-rated vendors, at most `n`.
    pub fn top_vendors(&self, n: usize) -> CatalogView<Vendor> {
        CatalogView::open(
            &self.manager,
            &self.config.vendors,
            SubscribeOptions::new().descending("rating").limit(n),
        )
    }

    /// The featured listing: `featured_vendors` best-rated vendors.
    pub fn featured_vendors(&self) -> CatalogView<Vendor> {
        self.top_vendors(self.config.featured_vendors)
    }

    /// All vendors, best-rated first.
    pub fn vendors(&self) -> CatalogView<Vendor> {
        CatalogView::open(
            &self.manager,
            &self.config.vendors,
            SubscribeOptions::new().descending("rating"),
        )
    }

    /// Items offered by one vendor.
    pub fn vendor_items(&self, vendor: &VendorId) -> CatalogView<CatalogItem> {
        CatalogView::open(
            &self.manager,
            &self.config.items,
            SubscribeOptions::new().where_eq(self.config.item_vendor_field.as_str(), vendor.as_str()),
        )
    }

    /// Articles, newest first.
    pub fn articles(&self) -> CatalogView<Article> {
        CatalogView::open(
            &self.manager,
            &self.config.articles,
            SubscribeOptions::new().descending("createdAt"),
        )
    }

    /// Professionals, newest first.
    pub fn professionals(&self) -> CatalogView<Professional> {
        CatalogView::open(
            &self.manager,
            &self.config.professionals,
            SubscribeOptions::new().descending("createdAt"),
        )
    }

    /// Trips by departure time.
    pub fn trips(&self) -> CatalogView<Trip> {
        CatalogView::open(
            &self.manager,
            &self.config.trips,
            SubscribeOptions::new().ascending("time"),
        )
    }
}

/// Case-insensitive match on vendor name or category.
///
/// A blank query matches everything. Input order is kept.
pub fn search_vendors<'a>(vendors: &'a [Vendor], query: &str) -> Vec<&'a Vendor> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return vendors.iter().collect();
    }
    vendors
        .iter()
        .filter(|v| {
            v.name.to_lowercase().contains(&needle) || v.category.to_lowercase().contains(&needle)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::InMemorySource;
    use serde_json::json;
    use std::sync::Arc;

    fn vendor(id: &str, name: &str, category: &str) -> Vendor {
        Vendor {
            id: VendorId::new(id),
            name: name.into(),
            category: category.into(),
            rating: 4.0,
            contact_handle: String::new(),
            description: None,
            phone: None,
            logo: None,
        }
    }

    #[test]
    fn test_search_vendors() {
        let vendors = vec![
            vendor("1", "Padaria Central", "Padaria"),
            vendor("2", "Mercadinho Sol", "Mercado"),
            vendor("3", "Bolos da Ana", "Doces"),
        ];

        assert_eq!(search_vendors(&vendors, "  ").len(), 3);
        let hits: Vec<&str> = search_vendors(&vendors, "MERC")
            .iter()
            .map(|v| v.id.as_str())
            .collect();
        assert_eq!(hits, vec!["2"]);
        let hits: Vec<&str> = search_vendors(&vendors, "a")
            .iter()
            .map(|v| v.id.as_str())
            .collect();
        assert_eq!(hits, vec!["1", "2", "3"]);
        assert!(search_vendors(&vendors, "farmácia").is_empty());
    }

    #[test]
    fn test_vendor_items_filters_by_vendor() {
        let source = Arc::new(InMemorySource::new());
        source
            .put_json("products", "p1", json!({"storeId": "v1", "name": "Pão", "price": 0.5}))
            .unwrap();
        source
            .put_json("products", "p2", json!({"storeId": "v2", "name": "Bolo", "price": 20}))
            .unwrap();

        let catalog = Catalog::new(
            CatalogSyncManager::new(source.clone()),
            CatalogConfig::default(),
        );
        let items = catalog.vendor_items(&VendorId::new("v1"));
        let snapshot = items.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].name, "Pão");
    }

    #[test]
    fn test_trips_ordered_by_time() {
        let source = Arc::new(InMemorySource::new());
        for (id, time) in [("t1", "14:00"), ("t2", "06:30"), ("t3", "09:15")] {
            source
                .put_json(
                    "trips",
                    id,
                    json!({"time": time, "price": 15, "route": "Ipaporanga - Crateús"}),
                )
                .unwrap();
        }
        let catalog = Catalog::new(
            CatalogSyncManager::new(source.clone()),
            CatalogConfig::default(),
        );
        let trips = catalog.trips();
        let times: Vec<String> = trips.snapshot().iter().map(|t| t.time.clone()).collect();
        assert_eq!(times, vec!["06:30", "09:15", "14:00"]);
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: CatalogConfig =
            serde_json::from_str(r#"{"vendors": "vendors", "featuredVendors": 3}"#).unwrap();
        assert_eq!(config.vendors, "vendors");
        assert_eq!(config.items, "products");
        assert_eq!(config.featured_vendors, 3);
    }
}
