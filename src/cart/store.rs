//! Cart store implementation.

use crate::error::{HubError, Result};
use crate::types::{CatalogItem, ItemId, Vendor};
use indexmap::IndexMap;
use parking_lot::{Mutex, MutexGuard};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Pending interest in one catalog item.
///
/// `item` and `vendor` are copies taken when the entry was created; later
/// catalog edits do not change them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartEntry {
    pub item: CatalogItem,
    pub vendor: Vendor,
    pub quantity: u64,
}

impl CartEntry {
    /// Unrounded `price × quantity`.
    pub fn subtotal(&self) -> Decimal {
        self.item.price.saturating_mul(Decimal::from(self.quantity))
    }
}

/// Entries keyed by item id, in insertion order.
pub(crate) type Entries = IndexMap<ItemId, CartEntry>;

/// The user's pending, cross-vendor selections.
///
/// Every mutation, and checkout's partition-and-clear sequence, runs under
/// one lock.
pub struct CartStore {
    entries: Mutex<Entries>,
}

impl CartStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(IndexMap::new()),
        }
    }

    /// Add one unit of `item` from `vendor`.
    ///
    /// Returns the entry's new quantity. Rejects malformed items, malformed
    /// vendors and items that do not belong to `vendor`, leaving the cart
    /// unchanged.
    pub fn add(&self, item: CatalogItem, vendor: Vendor) -> Result<u64> {
        item.check().map_err(HubError::InvalidItem)?;
        vendor.check().map_err(HubError::InvalidVendor)?;
        if item.vendor_id != vendor.id {
            return Err(HubError::VendorMismatch {
                item: item.id,
                expected: item.vendor_id,
                got: vendor.id,
            });
        }

        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get_mut(&item.id) {
            entry.quantity = entry
                .quantity
                .checked_add(1)
                .ok_or_else(|| HubError::QuantityOverflow(item.id.clone()))?;
            debug!(item = %item.id, quantity = entry.quantity, "cart quantity incremented");
            return Ok(entry.quantity);
        }

        debug!(item = %item.id, vendor = %vendor.id, "cart entry added");
        entries.insert(
            item.id.clone(),
            CartEntry {
                item,
                vendor,
                quantity: 1,
            },
        );
        Ok(1)
    }

    /// Set an entry's quantity exactly. Zero or less removes it.
    ///
    /// Unknown ids are ignored.
    pub fn set_quantity(&self, item_id: &ItemId, quantity: i64) {
        let mut entries = self.entries.lock();
        if quantity <= 0 {
            entries.shift_remove(item_id);
            return;
        }
        if let Some(entry) = entries.get_mut(item_id) {
            entry.quantity = quantity as u64;
        }
    }

    /// Remove an entry, returning it if it was present.
    pub fn remove(&self, item_id: &ItemId) -> Option<CartEntry> {
        self.entries.lock().shift_remove(item_id)
    }

    /// Sum of `price × quantity` over all entries.
    pub fn total(&self) -> Decimal {
        total_of(self.entries.lock().values())
    }

    /// Sum of quantities, not the number of distinct entries.
    pub fn item_count(&self) -> u64 {
        self.entries
            .lock()
            .values()
            .fold(0u64, |acc, e| acc.saturating_add(e.quantity))
    }

    /// Copy of the entries in insertion order.
    pub fn entries(&self) -> Vec<CartEntry> {
        self.entries.lock().values().cloned().collect()
    }

    pub fn get(&self, item_id: &ItemId) -> Option<CartEntry> {
        self.entries.lock().get(item_id).cloned()
    }

    /// Number of distinct entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Empty the cart.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Exclusive access for checkout.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock()
    }
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn total_of<'a, I>(entries: I) -> Decimal
where
    I: IntoIterator<Item = &'a CartEntry>,
{
    entries
        .into_iter()
        .fold(Decimal::ZERO, |acc, e| acc.saturating_add(e.subtotal()))
}
