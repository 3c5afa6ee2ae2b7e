//! Order summary text.

use std::fmt::Write;

use super::partition::format_amount;
use super::types::{CheckoutConfig, VendorOrder};

/// Build the human-readable summary sent to a vendor.
///
/// ```text
/// <greeting>
///
/// 2x Bolo - R$ 20.00
/// 1x Pão - R$ 5.50
///
/// Total: R$ 25.50
///
/// <address placeholder>
/// ```
pub fn format_order(order: &VendorOrder, config: &CheckoutConfig) -> String {
    let mut message = String::new();
    let _ = write!(message, "{}\n\n", config.greeting);
    for line in &order.lines {
        let _ = writeln!(
            message,
            "{}x {} - {} {}",
            line.quantity,
            line.item.name,
            config.currency,
            format_amount(line.line_total)
        );
    }
    let _ = write!(
        message,
        "\nTotal: {} {}\n\n",
        config.currency,
        format_amount(order.order_total)
    );
    message.push_str(&config.address_placeholder);
    message
}
