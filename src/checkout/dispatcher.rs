//! Checkout dispatcher: one cart in, one dispatch per vendor out.

use crate::cart::{total_of, CartStore};
use crate::types::{ContactHandle, VendorId};
use std::collections::HashSet;
use tracing::{info, warn};

use super::channel::DispatchChannel;
use super::format::format_order;
use super::partition::partition;
use super::types::{CheckoutConfig, CheckoutReport, DispatchStatus, VendorOutcome};

/// Turns a multi-vendor cart into one dispatch per vendor.
pub struct CheckoutDispatcher<C> {
    channel: C,
    config: CheckoutConfig,
}

impl<C: DispatchChannel> CheckoutDispatcher<C> {
    pub fn new(channel: C) -> Self {
        Self::with_config(channel, CheckoutConfig::default())
    }

    pub fn with_config(channel: C, config: CheckoutConfig) -> Self {
        Self { channel, config }
    }

    pub fn config(&self) -> &CheckoutConfig {
        &self.config
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Partition the cart by vendor, dispatch each order and clear the cart.
    ///
    /// An empty cart yields an empty report and no dispatch. A vendor whose
    /// contact handle is unusable is skipped, and a channel error fails only
    /// that vendor; the others still go out. The cart lock is held for the
    /// whole sequence, so concurrent mutations wait for it to finish.
    pub fn checkout(&self, cart: &CartStore) -> CheckoutReport {
        let mut entries = cart.lock();
        if entries.is_empty() {
            return CheckoutReport::default();
        }

        let orders = partition(entries.values());
        debug_assert_eq!(
            orders.iter().map(|o| o.lines.len()).sum::<usize>(),
            entries.len()
        );

        let mut outcomes = Vec::with_capacity(orders.len());
        let mut dispatched: HashSet<VendorId> = HashSet::new();

        for order in &orders {
            let vendor = &order.vendor;
            let status = match ContactHandle::parse(&vendor.contact_handle) {
                Err(e) => {
                    warn!(vendor = %vendor.id, error = %e, "skipping vendor without a usable contact handle");
                    DispatchStatus::Skipped {
                        reason: e.to_string(),
                    }
                }
                Ok(contact) => {
                    let message = format_order(order, &self.config);
                    match self.channel.dispatch(&contact, &message) {
                        Ok(()) => {
                            dispatched.insert(vendor.id.clone());
                            DispatchStatus::Dispatched
                        }
                        Err(e) => {
                            warn!(vendor = %vendor.id, error = %e, "order dispatch failed");
                            DispatchStatus::Failed {
                                error: e.to_string(),
                            }
                        }
                    }
                }
            };

            outcomes.push(VendorOutcome {
                vendor_id: vendor.id.clone(),
                vendor_name: vendor.name.clone(),
                order_total: order.order_total,
                status,
            });
        }

        if self.config.retain_undispatched {
            entries.retain(|_, entry| !dispatched.contains(&entry.vendor.id));
        } else {
            entries.clear();
        }

        info!(
            vendors = orders.len(),
            dispatched = dispatched.len(),
            retained = entries.len(),
            remaining_total = %total_of(entries.values()),
            "checkout finished"
        );

        CheckoutReport { orders, outcomes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{HubError, Result};
    use crate::types::{CatalogItem, ItemId, Vendor};
    use parking_lot::Mutex;
    use rust_decimal::Decimal;

    /// Records every dispatch; fails for handles listed in `refuse`.
    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<(String, String)>>,
        refuse: Vec<String>,
    }

    impl DispatchChannel for Recorder {
        fn dispatch(&self, contact: &ContactHandle, payload: &str) -> Result<()> {
            if self.refuse.iter().any(|r| r == contact.as_str()) {
                return Err(HubError::Dispatch("refused".into()));
            }
            self.sent
                .lock()
                .push((contact.as_str().to_string(), payload.to_string()));
            Ok(())
        }
    }

    fn vendor(id: &str, handle: &str) -> Vendor {
        Vendor {
            id: VendorId::new(id),
            name: format!("Vendor {}", id),
            category: String::new(),
            rating: 3.0,
            contact_handle: handle.into(),
            description: None,
            phone: None,
            logo: None,
        }
    }

    fn item(id: &str, vendor: &str, price: Decimal) -> CatalogItem {
        CatalogItem {
            id: ItemId::new(id),
            vendor_id: VendorId::new(vendor),
            name: id.to_uppercase(),
            price,
            category: String::new(),
            image: None,
            description: None,
        }
    }

    #[test]
    fn test_empty_cart_is_noop() {
        let dispatcher = CheckoutDispatcher::new(Recorder::default());
        let cart = CartStore::new();
        let report = dispatcher.checkout(&cart);
        assert!(report.is_empty());
        assert!(dispatcher.channel().sent.lock().is_empty());
    }

    #[test]
    fn test_one_dispatch_per_vendor() {
        let dispatcher = CheckoutDispatcher::new(Recorder::default());
        let cart = CartStore::new();
        cart.add(item("a", "x", Decimal::ONE), vendor("x", "5588911110000"))
            .unwrap();
        cart.add(item("b", "y", Decimal::ONE), vendor("y", "5588922220000"))
            .unwrap();
        cart.add(item("c", "x", Decimal::ONE), vendor("x", "5588911110000"))
            .unwrap();

        let report = dispatcher.checkout(&cart);
        assert!(report.is_complete());
        assert_eq!(report.orders.len(), 2);

        let sent = dispatcher.channel().sent.lock();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].0, "5588911110000");
        assert!(sent[0].1.contains("1x A - R$ 1.00\n1x C - R$ 1.00\n"));
        assert!(cart.is_empty());
    }

    fn retaining() -> CheckoutConfig {
        CheckoutConfig {
            retain_undispatched: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_skipped_vendor_is_retained_when_configured() {
        let dispatcher = CheckoutDispatcher::with_config(Recorder::default(), retaining());
        let cart = CartStore::new();
        cart.add(item("a", "x", Decimal::ONE), vendor("x", ""))
            .unwrap();
        cart.add(item("b", "y", Decimal::ONE), vendor("y", "5588922220000"))
            .unwrap();

        let report = dispatcher.checkout(&cart);
        assert_eq!(report.skipped(), vec![&VendorId::new("x")]);
        assert_eq!(report.dispatched(), vec![&VendorId::new("y")]);
        assert!(!report.is_complete());

        let left: Vec<String> = cart.entries().into_iter().map(|e| e.item.id.0).collect();
        assert_eq!(left, vec!["a"]);
    }

    #[test]
    fn test_failed_dispatch_does_not_block_others() {
        let recorder = Recorder {
            refuse: vec!["5588911110000".into()],
            ..Default::default()
        };
        let dispatcher = CheckoutDispatcher::with_config(recorder, retaining());
        let cart = CartStore::new();
        cart.add(item("a", "x", Decimal::ONE), vendor("x", "5588911110000"))
            .unwrap();
        cart.add(item("b", "y", Decimal::ONE), vendor("y", "5588922220000"))
            .unwrap();

        let report = dispatcher.checkout(&cart);
        assert_eq!(report.failed(), vec![&VendorId::new("x")]);
        assert_eq!(report.dispatched(), vec![&VendorId::new("y")]);
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_default_clears_skipped_and_failed_vendors() {
        let recorder = Recorder {
            refuse: vec!["5588933330000".into()],
            ..Default::default()
        };
        let dispatcher = CheckoutDispatcher::new(recorder);
        assert!(!dispatcher.config().retain_undispatched);

        let cart = CartStore::new();
        cart.add(item("a", "x", Decimal::ONE), vendor("x", ""))
            .unwrap();
        cart.add(item("b", "y", Decimal::ONE), vendor("y", "5588922220000"))
            .unwrap();
        cart.add(item("c", "z", Decimal::ONE), vendor("z", "5588933330000"))
            .unwrap();

        let report = dispatcher.checkout(&cart);
        assert_eq!(report.skipped(), vec![&VendorId::new("x")]);
        assert_eq!(report.dispatched(), vec![&VendorId::new("y")]);
        assert_eq!(report.failed(), vec![&VendorId::new("z")]);
        assert!(cart.is_empty());
    }
}
