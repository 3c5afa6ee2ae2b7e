//! Hub configuration.

use crate::checkout::CheckoutConfig;
use crate::error::{HubError, Result};
use crate::sync::CatalogConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Everything the hub can be configured with. Missing keys take defaults.
///
/// ```json
/// {
///   "catalog": { "vendors": "stores", "featuredVendors": 6 },
///   "checkout": { "currency": "R$", "retainUndispatched": true }
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    pub catalog: CatalogConfig,
    pub checkout: CheckoutConfig,
}

impl HubConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| HubError::Config(e.to_string()))
    }

    /// Load from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let config = Self::from_json_str(&text)?;
        debug!(path = %path.display(), "loaded hub config");
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
