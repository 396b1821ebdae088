//! Plain-text rendering of store state.

use std::fmt::Write;

use catalog_core::{Level, Notification, Product, StoreState};

pub fn product_line(product: &Product) -> String {
    format!("#{:<5} {:<30} ${:>10}  {}", product.id, product.name, product.price, product.image)
}

pub fn product_table(products: &[Product]) -> String {
    if products.is_empty() {
        return "No products found\n".to_string();
    }
    let mut out = String::new();
    for product in products {
        let _ = writeln!(out, "{}", product_line(product));
    }
    out
}

pub fn product_detail(product: &Product) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "id:      {}", product.id);
    let _ = writeln!(out, "name:    {}", product.name);
    let _ = writeln!(out, "price:   ${}", product.price);
    let _ = writeln!(out, "image:   {}", product.image);
    if let Some(created_at) = product.created_at {
        let _ = writeln!(out, "created: {}", created_at.to_rfc3339());
    }
    out
}

pub fn notification(note: &Notification) -> String {
    match note.level {
        Level::Success => format!("✔ {}", note.message),
        Level::Error => format!("✘ {}", note.message),
    }
}

/// Error banner for list/fetch failures, if any.
pub fn error_banner(state: &StoreState) -> Option<String> {
    state.error.as_ref().map(|err| match err.status {
        Some(status) => format!("{} (HTTP {status})", err.message),
        None => err.message.clone(),
    })
}
