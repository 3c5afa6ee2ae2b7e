//! Grouping cart entries into per-vendor orders.

use crate::cart::CartEntry;
use crate::types::VendorId;
use indexmap::IndexMap;
use rust_decimal::{Decimal, RoundingStrategy};

use super::types::{OrderLine, VendorOrder};

/// Round an amount half-up to cents.
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Format an amount with exactly two decimals.
pub fn format_amount(amount: Decimal) -> String {
    let mut rounded = round_cents(amount);
    rounded.rescale(2);
    rounded.to_string()
}

/// Group entries by vendor id.
///
/// Every entry lands in exactly one order. Orders appear in the order their
/// vendor first shows up; lines keep cart order. The vendor record of an
/// order is the one snapshotted by its first entry.
pub fn partition<'a, I>(entries: I) -> Vec<VendorOrder>
where
    I: IntoIterator<Item = &'a CartEntry>,
{
    let mut groups: IndexMap<VendorId, VendorOrder> = IndexMap::new();

    for entry in entries {
        let line_total = round_cents(entry.subtotal());
        let order = groups
            .entry(entry.vendor.id.clone())
            .or_insert_with(|| VendorOrder {
                vendor: entry.vendor.clone(),
                lines: Vec::new(),
                order_total: Decimal::ZERO,
            });
        order.order_total = order.order_total.saturating_add(line_total);
        order.lines.push(OrderLine {
            item: entry.item.clone(),
            quantity: entry.quantity,
            line_total,
        });
    }

    groups.into_values().collect()
}
