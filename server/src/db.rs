//! In-process `products` table.
//!
//! Rows get a serial id starting at 1 and a creation timestamp. Listing
//! returns newest first.

use std::{collections::BTreeMap, sync::Arc};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use url::Url;

use crate::error::AppError;

/// Largest integer part a `DECIMAL(10,2)` can hold.
const MAX_PRICE_INTEGER_DIGITS: usize = 8;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: String,
    pub image: String,
    pub created_at: DateTime<Utc>,
}

/// Price as submitted: forms send strings, other clients may send numbers.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PriceInput {
    Text(String),
    Number(serde_json::Number),
}

/// Request body for create and update. Every field is optional here so a
/// missing one produces our own 400 rather than a deserialization error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<PriceInput>,
    #[serde(default)]
    pub image: Option<String>,
}

/// A validated row payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFields {
    pub name: String,
    pub price: String,
    pub image: String,
}

impl ProductInput {
    pub fn validate(self) -> Result<ProductFields, AppError> {
        let name = self.name.map(|s| s.trim().to_string()).unwrap_or_default();
        let image = self.image.map(|s| s.trim().to_string()).unwrap_or_default();
        let price = match self.price {
            Some(PriceInput::Text(s)) => s.trim().to_string(),
            Some(PriceInput::Number(n)) => n.to_string(),
            None => String::new(),
        };

        if name.is_empty() || price.is_empty() || image.is_empty() {
            return Err(AppError::Validation("All fields are required".to_string()));
        }
        let price = normalize_price(&price).ok_or_else(|| {
            AppError::Validation(
                "Price must be a non-negative amount with at most two decimal places".to_string(),
            )
        })?;
        if !is_web_url(&image) {
            return Err(AppError::Validation("Image must be a valid URL".to_string()));
        }

        Ok(ProductFields { name, price, image })
    }
}

/// Canonical two-decimal form of `raw`, or `None` when it is not a
/// non-negative decimal with at most two fractional digits.
pub fn normalize_price(raw: &str) -> Option<String> {
    let (int_part, frac_part) = match raw.split_once('.') {
        Some((i, f)) => (i, f),
        None => (raw, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit()) || !frac_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if frac_part.len() > 2 {
        return None;
    }

    let int_part = int_part.trim_start_matches('0');
    if int_part.len() > MAX_PRICE_INTEGER_DIGITS {
        return None;
    }
    let int_part = if int_part.is_empty() { "0" } else { int_part };
    Some(format!("{int_part}.{frac_part:0<2}"))
}

fn is_web_url(raw: &str) -> bool {
    Url::parse(raw)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
        .unwrap_or(false)
}

#[derive(Debug, Default)]
pub struct ProductTable {
    next_id: i64,
    rows: BTreeMap<i64, Product>,
}

pub type Db = Arc<RwLock<ProductTable>>;

pub fn new_db() -> Db {
    Arc::new(RwLock::new(ProductTable::default()))
}

impl ProductTable {
    /// All rows, newest first.
    pub fn list(&self) -> Vec<Product> {
        let mut rows: Vec<Product> = self.rows.values().cloned().collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows
    }

    pub fn get(&self, id: i64) -> Option<Product> {
        self.rows.get(&id).cloned()
    }

    pub fn insert(&mut self, fields: ProductFields) -> Product {
        self.next_id += 1;
        let product = Product {
            id: self.next_id,
            name: fields.name,
            price: fields.price,
            image: fields.image,
            created_at: Utc::now(),
        };
        self.rows.insert(product.id, product.clone());
        product
    }

    pub fn update(&mut self, id: i64, fields: ProductFields) -> Option<Product> {
        let row = self.rows.get_mut(&id)?;
        row.name = fields.name;
        row.price = fields.price;
        row.image = fields.image;
        Some(row.clone())
    }

    pub fn remove(&mut self, id: i64) -> Option<Product> {
        self.rows.remove(&id)
    }
}
