//! Client-side catalog state and the operations that keep it in sync with
//! the API.
//!
//! # Design
//! `ProductStore` owns one `StoreState` inside a `watch` channel so views
//! can subscribe to changes or take snapshots. Every async operation runs
//! under a per-store mutex: operations never overlap, which keeps `loading`
//! and the final state write of each operation ordered. `loading` is reset
//! by a drop guard, so it also clears when an operation future is dropped
//! mid-request.
//!
//! Failures never escape an operation. List and single-item fetches record
//! a `StoreError` in the state; mutations report through the `Notifier`.

use std::sync::Arc;

use tokio::sync::{watch, Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::client::CatalogClient;
use crate::error::{ApiError, StoreError};
use crate::http::{HttpRequest, HttpResponse};
use crate::notify::{Notification, Notifier};
use crate::transport::{ReqwestTransport, Transport, TransportConfig};
use crate::types::{Product, ProductForm, ProductId};

const LIST_FAILED: &str = "Something Went Wrong while fetching the product";
const FETCH_FAILED: &str = "Something went wrong";
const CREATED: &str = "Product added successfully";
const CREATE_FAILED: &str = "Something went wrong while adding the product";
const UPDATED: &str = "Product updated successfully!";
const UPDATE_FAILED: &str = "Something went wrong";
const DELETED: &str = "Product deleted successfully";
const DELETE_FAILED: &str = "Something went wrong while deleting the product";

/// Everything a catalog view renders from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreState {
    /// Last successful list fetch, in server order.
    pub products: Vec<Product>,
    pub current_product: Option<Product>,
    pub form_data: ProductForm,
    pub loading: bool,
    pub error: Option<StoreError>,
}

pub struct ProductStore {
    client: CatalogClient,
    transport: Arc<dyn Transport>,
    notifier: Arc<dyn Notifier>,
    state: watch::Sender<StoreState>,
    op: Mutex<()>,
}

/// Holds the operation lock and clears `loading` when dropped.
struct Operation<'a> {
    state: &'a watch::Sender<StoreState>,
    _lock: MutexGuard<'a, ()>,
}

impl Drop for Operation<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|s| s.loading = false);
    }
}

impl ProductStore {
    pub fn new(client: CatalogClient, transport: Arc<dyn Transport>, notifier: Arc<dyn Notifier>) -> Self {
        let (state, _) = watch::channel(StoreState::default());
        Self {
            client,
            transport,
            notifier,
            state,
            op: Mutex::new(()),
        }
    }

    /// Store talking to `base_url` over reqwest.
    pub fn connect(base_url: &str, config: TransportConfig, notifier: Arc<dyn Notifier>) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new(config)?;
        Ok(Self::new(CatalogClient::new(base_url), Arc::new(transport), notifier))
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> StoreState {
        self.state.borrow().clone()
    }

    /// Receiver that sees every subsequent state change.
    pub fn subscribe(&self) -> watch::Receiver<StoreState> {
        self.state.subscribe()
    }

    pub fn set_form_data(&self, form: ProductForm) {
        self.state.send_modify(|s| s.form_data = form);
    }

    pub fn reset_form(&self) {
        self.state.send_modify(|s| s.form_data = ProductForm::default());
    }

    /// Replace `products` with the server's list. On failure `products` is
    /// emptied and `error` set.
    pub async fn list_products(&self) {
        let _op = self.begin().await;
        self.refresh_products().await;
    }

    /// Submit the current form. On success the list is re-fetched and the
    /// form cleared.
    pub async fn create_product(&self) {
        let _op = self.begin().await;
        let form = self.state.borrow().form_data.clone();

        let result = match self.client.build_create_product(&form) {
            Ok(request) => self
                .round_trip(request)
                .await
                .and_then(|response| self.client.parse_create_product(response)),
            Err(err) => Err(err),
        };

        match result {
            Ok(created) => {
                debug!(id = created.id, "product created");
                self.refresh_products().await;
                self.state.send_modify(|s| s.form_data = ProductForm::default());
                self.notifier.notify(Notification::success(CREATED));
            }
            Err(err) => {
                warn!(operation = "create_product", error = %err, "store operation failed");
                self.notifier.notify(Notification::error(CREATE_FAILED));
            }
        }
    }

    /// Load one product and pre-fill the form with it.
    pub async fn fetch_product(&self, id: ProductId) {
        let _op = self.begin().await;
        let result = self
            .round_trip(self.client.build_get_product(id))
            .await
            .and_then(|response| self.client.parse_get_product(response));

        match result {
            Ok(product) => self.state.send_modify(|s| {
                s.form_data = ProductForm::from(&product);
                s.current_product = Some(product);
                s.error = None;
            }),
            Err(err) => {
                warn!(operation = "fetch_product", id, error = %err, "store operation failed");
                self.state.send_modify(|s| {
                    s.current_product = None;
                    s.error = Some(StoreError::unknown(&err, FETCH_FAILED));
                });
            }
        }
    }

    /// Send the current form as the new contents of `id`. Only
    /// `current_product` is updated; `products` is left as it was.
    pub async fn update_product(&self, id: ProductId) {
        let _op = self.begin().await;
        let form = self.state.borrow().form_data.clone();

        let result = match self.client.build_update_product(id, &form) {
            Ok(request) => self
                .round_trip(request)
                .await
                .and_then(|response| self.client.parse_update_product(response)),
            Err(err) => Err(err),
        };

        match result {
            Ok(product) => {
                self.state.send_modify(|s| s.current_product = Some(product));
                self.notifier.notify(Notification::success(UPDATED));
            }
            Err(err) => {
                warn!(operation = "update_product", id, error = %err, "store operation failed");
                self.notifier.notify(Notification::error(UPDATE_FAILED));
            }
        }
    }

    /// Delete `id` on the server, then drop every local entry with that id.
    pub async fn delete_product(&self, id: ProductId) {
        let _op = self.begin().await;
        let result = self
            .round_trip(self.client.build_delete_product(id))
            .await
            .and_then(|response| self.client.parse_delete_product(response));

        match result {
            Ok(()) => {
                self.state.send_modify(|s| s.products.retain(|p| p.id != id));
                self.notifier.notify(Notification::success(DELETED));
            }
            Err(err) => {
                warn!(operation = "delete_product", id, error = %err, "store operation failed");
                self.notifier.notify(Notification::error(DELETE_FAILED));
            }
        }
    }

    async fn begin(&self) -> Operation<'_> {
        let lock = self.op.lock().await;
        self.state.send_modify(|s| s.loading = true);
        Operation {
            state: &self.state,
            _lock: lock,
        }
    }

    async fn round_trip(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = %request.method, url = %request.url, "sending request");
        self.transport.execute(request).await
    }

    /// List fetch without taking the operation lock; callers hold it.
    async fn refresh_products(&self) {
        let result = self
            .round_trip(self.client.build_list_products())
            .await
            .and_then(|response| self.client.parse_list_products(response));

        match result {
            Ok(products) => self.state.send_modify(|s| {
                s.products = products;
                s.error = None;
            }),
            Err(err) => {
                warn!(operation = "list_products", error = %err, "store operation failed");
                self.state.send_modify(|s| {
                    s.products.clear();
                    s.error = Some(StoreError::from_api(&err, LIST_FAILED));
                });
            }
        }
    }
}
