//! Checkout: split a multi-vendor cart into per-vendor orders and hand each
//! one to its vendor through a [`DispatchChannel`].
//!
//! Amounts are rounded half-up to cents per line; an order total is the sum
//! of its rounded lines. Dispatch is sequential in partition order and one
//! vendor failing never stops the others.

mod channel;
mod dispatcher;
mod format;
mod partition;
pub mod types;

pub use channel::{DispatchChannel, LinkOpener, WhatsAppChannel, WHATSAPP_BASE_URL};
pub use dispatcher::CheckoutDispatcher;
pub use format::format_order;
pub use partition::{format_amount, partition, round_cents};
pub use types::{
    CheckoutConfig, CheckoutReport, DispatchStatus, OrderLine, VendorOrder, VendorOutcome,
};
