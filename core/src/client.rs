//! Stateless HTTP request builder and response parser for the catalog API.
//!
//! # Design
//! `CatalogClient` holds only a `base_url` and carries no mutable state
//! between calls. Each CRUD operation is split into a `build_*` method that
//! produces an `HttpRequest` and a `parse_*` method that consumes an
//! `HttpResponse`. A `Transport` executes the round-trip in between.

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{Envelope, Product, ProductForm, ProductId};

const PRODUCTS_PATH: &str = "/api/products";

/// Synchronous, stateless client for the catalog API.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    base_url: String,
}

impl CatalogClient {
    /// An empty `base_url` yields relative URLs, i.e. same-origin requests.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn collection_url(&self) -> String {
        format!("{}{PRODUCTS_PATH}", self.base_url)
    }

    fn item_url(&self, id: ProductId) -> String {
        format!("{}{PRODUCTS_PATH}/{id}", self.base_url)
    }

    pub fn build_list_products(&self) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: self.collection_url(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn build_get_product(&self, id: ProductId) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: self.item_url(id),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn build_create_product(&self, form: &ProductForm) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: self.collection_url(),
            headers: json_headers(),
            body: Some(to_json(form)?),
        })
    }

    pub fn build_update_product(&self, id: ProductId, form: &ProductForm) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest {
            method: HttpMethod::Put,
            url: self.item_url(id),
            headers: json_headers(),
            body: Some(to_json(form)?),
        })
    }

    pub fn build_delete_product(&self, id: ProductId) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Delete,
            url: self.item_url(id),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn parse_list_products(&self, response: HttpResponse) -> Result<Vec<Product>, ApiError> {
        check_status(&response, &[200])?;
        unwrap_data(&response.body)
    }

    pub fn parse_get_product(&self, response: HttpResponse) -> Result<Product, ApiError> {
        check_status(&response, &[200])?;
        unwrap_data(&response.body)
    }

    pub fn parse_create_product(&self, response: HttpResponse) -> Result<Product, ApiError> {
        check_status(&response, &[200, 201])?;
        unwrap_data(&response.body)
    }

    pub fn parse_update_product(&self, response: HttpResponse) -> Result<Product, ApiError> {
        check_status(&response, &[200])?;
        unwrap_data(&response.body)
    }

    /// The confirmation body is not consumed.
    pub fn parse_delete_product(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, &[200, 204])
    }
}

fn json_headers() -> Vec<(String, String)> {
    vec![("content-type".to_string(), "application/json".to_string())]
}

fn to_json(form: &ProductForm) -> Result<String, ApiError> {
    serde_json::to_string(form).map_err(|e| ApiError::Serialization(e.to_string()))
}

fn unwrap_data<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str::<Envelope<T>>(body)
        .map(|envelope| envelope.data)
        .map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// Map unexpected status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse, expected: &[u16]) -> Result<(), ApiError> {
    if expected.contains(&response.status) {
        return Ok(());
    }
    match response.status {
        404 => Err(ApiError::NotFound),
        429 => {
            debug!(retry_after = ?response.header("retry-after"), "rate limited");
            Err(ApiError::RateLimited)
        }
        status => Err(ApiError::Http {
            status,
            body: response.body.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> CatalogClient {
        CatalogClient::new("http://localhost:3000")
    }

    fn lamp() -> ProductForm {
        ProductForm::new("Lamp", "19.99", "http://x/lamp.jpg")
    }

    #[test]
    fn build_list_products_produces_correct_request() {
        let req = client().build_list_products();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:3000/api/products");
        assert!(req.body.is_none());
        assert!(req.headers.is_empty());
    }

    #[test]
    fn build_get_product_uses_numeric_id() {
        let req = client().build_get_product(42);
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:3000/api/products/42");
        assert!(req.body.is_none());
    }

    #[test]
    fn build_create_product_sends_form_as_json() {
        let req = client().build_create_product(&lamp()).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:3000/api/products");
        assert_eq!(
            req.headers,
            vec![("content-type".to_string(), "application/json".to_string())]
        );
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"name":"Lamp","price":"19.99","image":"http://x/lamp.jpg"}));
    }

    #[test]
    fn build_update_product_sends_all_fields() {
        let req = client().build_update_product(5, &lamp()).unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.url, "http://localhost:3000/api/products/5");
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["name"], "Lamp");
        assert_eq!(body["price"], "19.99");
        assert_eq!(body["image"], "http://x/lamp.jpg");
    }

    #[test]
    fn build_delete_product_has_no_body() {
        let req = client().build_delete_product(7);
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.url, "http://localhost:3000/api/products/7");
        assert!(req.body.is_none());
    }

    #[test]
    fn empty_base_url_gives_relative_paths() {
        let req = CatalogClient::new("").build_list_products();
        assert_eq!(req.url, "/api/products");
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = CatalogClient::new("http://localhost:3000/");
        assert_eq!(client.build_list_products().url, "http://localhost:3000/api/products");
    }

    #[test]
    fn parse_list_products_unwraps_data() {
        let response = HttpResponse::new(
            200,
            r#"{"success":true,"data":[{"id":1,"name":"Chair","price":"49.99","image":"http://x/chair.jpg"}]}"#,
        );
        let products = client().parse_list_products(response).unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "Chair");
        assert_eq!(products[0].price, "49.99");
    }

    #[test]
    fn parse_list_products_requires_envelope() {
        let response = HttpResponse::new(200, r#"[{"id":1,"name":"Chair","price":"1.00","image":"http://x"}]"#);
        let err = client().parse_list_products(response).unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }

    #[test]
    fn parse_list_products_rate_limited() {
        let mut response = HttpResponse::new(429, r#"{"error":"Too Many Requests"}"#);
        response.headers.push(("Retry-After".to_string(), "5".to_string()));
        let err = client().parse_list_products(response).unwrap_err();
        assert!(matches!(err, ApiError::RateLimited));
    }

    #[test]
    fn parse_get_product_not_found() {
        let response = HttpResponse::new(404, r#"{"success":false,"message":"Product not found"}"#);
        let err = client().parse_get_product(response).unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[test]
    fn parse_get_product_forbidden_keeps_body() {
        let response = HttpResponse::new(403, r#"{"error":"Bot Access Detected"}"#);
        match client().parse_get_product(response).unwrap_err() {
            ApiError::Http { status, body } => {
                assert_eq!(status, 403);
                assert!(body.contains("Bot Access Detected"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parse_create_product_accepts_201_and_200() {
        let body = r#"{"data":{"id":3,"name":"Lamp","price":"19.99","image":"http://x/lamp.jpg"}}"#;
        let created = client().parse_create_product(HttpResponse::new(201, body)).unwrap();
        assert_eq!(created.id, 3);
        let created = client().parse_create_product(HttpResponse::new(200, body)).unwrap();
        assert_eq!(created.name, "Lamp");
    }

    #[test]
    fn parse_create_product_server_error() {
        let err = client()
            .parse_create_product(HttpResponse::new(500, "internal error"))
            .unwrap_err();
        assert!(matches!(err, ApiError::Http { status: 500, .. }));
    }

    #[test]
    fn parse_update_product_success() {
        let response = HttpResponse::new(200, r#"{"data":{"id":5,"name":"Desk","price":"120.00","image":"http://x/d.jpg"}}"#);
        let product = client().parse_update_product(response).unwrap();
        assert_eq!(product.id, 5);
        assert_eq!(product.name, "Desk");
    }

    #[test]
    fn parse_delete_product_ignores_body() {
        assert!(client().parse_delete_product(HttpResponse::new(200, "not json at all")).is_ok());
        assert!(client().parse_delete_product(HttpResponse::new(204, "")).is_ok());
    }

    #[test]
    fn parse_delete_product_not_found() {
        let err = client().parse_delete_product(HttpResponse::new(404, "")).unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }
}
