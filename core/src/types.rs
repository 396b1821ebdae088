//! Domain DTOs for the product catalog API.
//!
//! # Design
//! These types mirror the server's schema but are defined independently.
//! Prices travel as decimal strings (`"49.99"`), which is how a
//! `DECIMAL(10,2)` column is rendered to JSON; the client never does
//! arithmetic on them. Integration tests catch schema drift between the
//! two crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-assigned product identifier.
pub type ProductId = i64;

/// A single product returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: String,
    pub image: String,
    #[serde(default, alias = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// The create/edit form buffer. All fields are raw user input; the server
/// is the only validator.
///
/// Also serves as the request payload for `POST` and `PUT`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductForm {
    pub name: String,
    pub price: String,
    pub image: String,
}

impl ProductForm {
    pub fn new(name: impl Into<String>, price: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            price: price.into(),
            image: image.into(),
        }
    }

    /// True when every field has been filled in. Submit controls use this to
    /// stay disabled; it is not a validity check.
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty() && !self.price.trim().is_empty() && !self.image.trim().is_empty()
    }
}

impl From<&Product> for ProductForm {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            price: product.price.clone(),
            image: product.image.clone(),
        }
    }
}

/// `{ "data": ... }` wrapper used by every successful response. Extra keys
/// such as `success` are ignored.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Envelope<T> {
    pub data: T,
}
