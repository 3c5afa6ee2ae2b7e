//! Core types for the hub: remote documents and the entities mapped from them.

use crate::error::{HubError, Result};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Identifier of a vendor document.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VendorId(pub String);

impl VendorId {
    pub fn new(id: impl Into<String>) -> Self {
        VendorId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for VendorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VendorId({})", self.0)
    }
}

impl fmt::Display for VendorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a catalog item document.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        ItemId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemId({})", self.0)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A raw document as delivered by the remote source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Build a document from a JSON object value.
    pub fn from_value(id: impl Into<String>, value: Value) -> Result<Self> {
        let id = id.into();
        match value {
            Value::Object(fields) => Ok(Self { id, fields }),
            other => Err(HubError::Serialization(format!(
                "document {} must be a JSON object, got {}",
                id, other
            ))),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

/// A typed record that can be mapped from a remote document.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Human-readable kind, used in error messages and logs.
    const KIND: &'static str;

    fn from_document(doc: &Document) -> Result<Self>;

    fn id(&self) -> &str;
}

/// Deserialize a document into `T`, with the document id injected as `id`.
fn decode<T: DeserializeOwned>(kind: &str, doc: &Document) -> Result<T> {
    let mut fields = doc.fields.clone();
    fields.insert("id".to_string(), Value::String(doc.id.clone()));
    serde_json::from_value(Value::Object(fields)).map_err(|e| malformed(kind, &doc.id, e))
}

fn malformed(kind: &str, id: &str, reason: impl fmt::Display) -> HubError {
    HubError::MalformedDocument {
        collection: kind.to_string(),
        id: id.to_string(),
        reason: reason.to_string(),
    }
}

/// Parse a money amount from a JSON number or string.
///
/// Numbers are read through their shortest decimal text, so `19.99` stays
/// exactly `19.99`.
pub fn decimal_from_json(value: &Value) -> std::result::Result<Decimal, String> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        other => return Err(format!("expected a number, got {}", other)),
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|e| format!("invalid amount {:?}: {}", text, e))
}

fn deserialize_decimal<'de, D>(deserializer: D) -> std::result::Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    decimal_from_json(&value).map_err(serde::de::Error::custom)
}

/// A local business that can receive orders.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vendor {
    pub id: VendorId,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub rating: f64,
    /// Messaging handle orders are sent to.
    #[serde(rename = "whatsapp", alias = "contactHandle", default)]
    pub contact_handle: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
}

impl Vendor {
    /// Check structural validity. Contact handles are checked at checkout.
    pub fn check(&self) -> std::result::Result<(), String> {
        if self.id.0.trim().is_empty() {
            return Err("vendor id is empty".into());
        }
        if self.name.trim().is_empty() {
            return Err(format!("vendor {} has no name", self.id));
        }
        if !self.rating.is_finite() || !(0.0..=5.0).contains(&self.rating) {
            return Err(format!(
                "vendor {} rating {} outside 0..=5",
                self.id, self.rating
            ));
        }
        Ok(())
    }
}

impl Entity for Vendor {
    const KIND: &'static str = "vendor";

    fn from_document(doc: &Document) -> Result<Self> {
        let vendor: Vendor = decode(Self::KIND, doc)?;
        vendor.check().map_err(|r| malformed(Self::KIND, &doc.id, r))?;
        Ok(vendor)
    }

    fn id(&self) -> &str {
        &self.id.0
    }
}

/// A sellable unit offered by exactly one vendor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: ItemId,
    #[serde(rename = "storeId", alias = "vendorId")]
    pub vendor_id: VendorId,
    pub name: String,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub price: Decimal,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl CatalogItem {
    pub fn check(&self) -> std::result::Result<(), String> {
        if self.id.0.trim().is_empty() {
            return Err("item id is empty".into());
        }
        if self.name.trim().is_empty() {
            return Err(format!("item {} has no name", self.id));
        }
        if self.vendor_id.0.trim().is_empty() {
            return Err(format!("item {} has no vendor", self.id));
        }
        if self.price.is_sign_negative() && !self.price.is_zero() {
            return Err(format!("item {} has negative price {}", self.id, self.price));
        }
        Ok(())
    }
}

impl Entity for CatalogItem {
    const KIND: &'static str = "catalog item";

    fn from_document(doc: &Document) -> Result<Self> {
        let item: CatalogItem = decode(Self::KIND, doc)?;
        item.check().map_err(|r| malformed(Self::KIND, &doc.id, r))?;
        Ok(item)
    }

    fn id(&self) -> &str {
        &self.id.0
    }
}

/// A community news article.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Entity for Article {
    const KIND: &'static str = "article";

    fn from_document(doc: &Document) -> Result<Self> {
        decode(Self::KIND, doc)
    }

    fn id(&self) -> &str {
        &self.id
    }
}

/// A local service professional.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Professional {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub phone: String,
    #[serde(rename = "whatsapp", alias = "contactHandle", default)]
    pub contact_handle: String,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub specialty: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Entity for Professional {
    const KIND: &'static str = "professional";

    fn from_document(doc: &Document) -> Result<Self> {
        decode(Self::KIND, doc)
    }

    fn id(&self) -> &str {
        &self.id
    }
}

/// A scheduled shared-transport trip.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: String,
    /// Departure time as entered, e.g. "06:30".
    pub time: String,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub price: Decimal,
    #[serde(default)]
    pub route: String,
    #[serde(default)]
    pub driver_name: String,
    #[serde(default)]
    pub driver_phone: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Entity for Trip {
    const KIND: &'static str = "trip";

    fn from_document(doc: &Document) -> Result<Self> {
        let trip: Trip = decode(Self::KIND, doc)?;
        if trip.price.is_sign_negative() && !trip.price.is_zero() {
            return Err(malformed(Self::KIND, &doc.id, "negative price"));
        }
        Ok(trip)
    }

    fn id(&self) -> &str {
        &self.id
    }
}

/// A normalized messaging handle: an optional `+` followed by 8 to 15 digits.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ContactHandle(String);

impl ContactHandle {
    /// Normalize and validate a raw handle.
    ///
    /// Spaces, dashes, dots and parentheses are stripped.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut digits = String::with_capacity(raw.len());
        let mut plus = false;
        for (i, c) in raw.trim().chars().enumerate() {
            match c {
                '+' if i == 0 => plus = true,
                '0'..='9' => digits.push(c),
                ' ' | '-' | '.' | '(' | ')' => {}
                _ => return Err(HubError::InvalidContactHandle(raw.to_string())),
            }
        }
        if !(8..=15).contains(&digits.len()) {
            return Err(HubError::InvalidContactHandle(raw.to_string()));
        }
        if plus {
            digits.insert(0, '+');
        }
        Ok(ContactHandle(digits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The handle without any leading `+`.
    pub fn digits(&self) -> &str {
        self.0.trim_start_matches('+')
    }
}

impl fmt::Debug for ContactHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContactHandle({})", self.0)
    }
}

impl fmt::Display for ContactHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
