//! Checkout types.

use crate::types::{CatalogItem, Vendor, VendorId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Configuration for order messages and cart clearing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CheckoutConfig {
    /// Currency label printed before every amount.
    pub currency: String,

    /// First line of every order message.
    pub greeting: String,

    /// Last line, asking the customer to fill in where to deliver.
    pub address_placeholder: String,

    /// Keep entries of vendors that were skipped or failed, instead of
    /// clearing the whole cart.
    /// Default: false
    pub retain_undispatched: bool,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            currency: "R$".into(),
            greeting: "Olá! Gostaria de fazer um pedido via Ipaporanga Hub:".into(),
            address_placeholder: "Endereço de entrega: [Por favor, preencha seu endereço]".into(),
            retain_undispatched: false,
        }
    }
}

/// One line of a vendor order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub item: CatalogItem,
    pub quantity: u64,
    /// `price × quantity` rounded half-up to cents.
    pub line_total: Decimal,
}

/// The part of a checkout addressed to one vendor. Never persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VendorOrder {
    pub vendor: Vendor,
    pub lines: Vec<OrderLine>,
    /// Sum of the line totals.
    pub order_total: Decimal,
}

impl VendorOrder {
    pub fn item_count(&self) -> u64 {
        self.lines
            .iter()
            .fold(0u64, |acc, l| acc.saturating_add(l.quantity))
    }
}

/// What happened to one vendor's order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DispatchStatus {
    /// Handed to the dispatch channel.
    Dispatched,
    /// Not attempted: the vendor has no usable contact handle.
    Skipped { reason: String },
    /// The dispatch channel refused the hand-off.
    Failed { error: String },
}

/// Per-vendor result of a checkout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VendorOutcome {
    pub vendor_id: VendorId,
    pub vendor_name: String,
    pub order_total: Decimal,
    pub status: DispatchStatus,
}

/// Result of one checkout: the computed orders and what became of each.
///
/// `orders` and `outcomes` are parallel and in partition order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckoutReport {
    pub orders: Vec<VendorOrder>,
    pub outcomes: Vec<VendorOutcome>,
}

impl CheckoutReport {
    /// True when the cart was empty and nothing happened.
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// True when every vendor was dispatched.
    pub fn is_complete(&self) -> bool {
        self.outcomes
            .iter()
            .all(|o| o.status == DispatchStatus::Dispatched)
    }

    pub fn dispatched(&self) -> Vec<&VendorId> {
        self.outcomes
            .iter()
            .filter(|o| o.status == DispatchStatus::Dispatched)
            .map(|o| &o.vendor_id)
            .collect()
    }

    pub fn skipped(&self) -> Vec<&VendorId> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, DispatchStatus::Skipped { .. }))
            .map(|o| &o.vendor_id)
            .collect()
    }

    pub fn failed(&self) -> Vec<&VendorId> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, DispatchStatus::Failed { .. }))
            .map(|o| &o.vendor_id)
            .collect()
    }

    /// Sum of all order totals.
    pub fn total(&self) -> Decimal {
        self.orders
            .iter()
            .fold(Decimal::ZERO, |acc, o| acc.saturating_add(o.order_total))
    }

    pub fn order_for(&self, vendor: &VendorId) -> Option<&VendorOrder> {
        self.orders.iter().find(|o| &o.vendor.id == vendor)
    }
}
