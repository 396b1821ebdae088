use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::{
    db::{Db, Product, ProductInput},
    error::AppError,
};

/// `{ "success": true, "data": ... }`
#[derive(Debug, Serialize)]
pub struct Success<T> {
    pub success: bool,
    pub data: T,
}

fn success<T>(data: T) -> Json<Success<T>> {
    Json(Success { success: true, data })
}

pub async fn list_products(State(db): State<Db>) -> Json<Success<Vec<Product>>> {
    let products = db.read().await.list();
    success(products)
}

pub async fn create_product(
    State(db): State<Db>,
    Json(input): Json<ProductInput>,
) -> Result<(StatusCode, Json<Success<Product>>), AppError> {
    let fields = input.validate()?;
    let product = db.write().await.insert(fields);
    info!(id = product.id, name = %product.name, "product created");
    Ok((StatusCode::CREATED, success(product)))
}

pub async fn get_product(
    State(db): State<Db>,
    Path(id): Path<i64>,
) -> Result<Json<Success<Product>>, AppError> {
    db.read().await.get(id).map(success).ok_or(AppError::NotFound)
}

pub async fn update_product(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(input): Json<ProductInput>,
) -> Result<Json<Success<Product>>, AppError> {
    let fields = input.validate()?;
    let product = db.write().await.update(id, fields).ok_or(AppError::NotFound)?;
    info!(id, "product updated");
    Ok(success(product))
}

pub async fn delete_product(
    State(db): State<Db>,
    Path(id): Path<i64>,
) -> Result<Json<Success<Product>>, AppError> {
    let product = db.write().await.remove(id).ok_or(AppError::NotFound)?;
    info!(id, "product deleted");
    Ok(success(product))
}
