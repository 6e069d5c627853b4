//! Shopping list model.
//!
//! The catalog holds every product the household has ever bought. Its
//! `weight` counts how often an entry was put on the list, which drives the
//! suggestion order. Shopping items share their id with the catalog entry
//! they were created from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// A product known to the household.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: i64,
    pub name: String,
    pub category_id: i64,
    #[serde(default)]
    pub location: Option<String>,
    pub weight: i64,
    pub price: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for a new catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCatalogEntry {
    pub name: String,
    pub category_id: i64,
    /// Quantity used when the entry is also put on the shopping list.
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

fn default_quantity() -> i64 {
    1
}

impl NewCatalogEntry {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation("name is required".to_string()));
        }
        validate_quantity(self.quantity)
    }
}

/// An entry currently on the shopping list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingItem {
    pub id: i64,
    pub name: String,
    pub quantity: i64,
    pub category_id: i64,
    pub checked: bool,
    pub price: f64,
    pub created_at: DateTime<Utc>,
}

pub fn validate_quantity(quantity: i64) -> Result<()> {
    if quantity < 1 {
        return Err(Error::Validation(format!(
            "quantity must be at least 1 (got {})",
            quantity
        )));
    }
    Ok(())
}
