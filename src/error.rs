//! Error types for the hub core.

use crate::types::{ItemId, VendorId};
use thiserror::Error;

/// Main error type for hub operations.
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Remote source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Malformed document {id} in {collection}: {reason}")]
    MalformedDocument {
        collection: String,
        id: String,
        reason: String,
    },

    #[error("Document not found: {id} in {collection}")]
    DocumentNotFound { collection: String, id: String },

    #[error("Invalid item: {0}")]
    InvalidItem(String),

    #[error("Invalid vendor: {0}")]
    InvalidVendor(String),

    #[error("Item {item} belongs to vendor {expected}, not {got}")]
    VendorMismatch {
        item: ItemId,
        expected: VendorId,
        got: VendorId,
    },

    #[error("Quantity overflow for item {0}")]
    QuantityOverflow(ItemId),

    #[error("Invalid contact handle: {0:?}")]
    InvalidContactHandle(String),

    #[error("Dispatch failed: {0}")]
    Dispatch(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for HubError {
    fn from(e: serde_json::Error) -> Self {
        HubError::Serialization(e.to_string())
    }
}

/// Result type for hub operations.
pub type Result<T> = std::result::Result<T, HubError>;
