//! Client side of the product catalog: API client and product store.
//!
//! # Overview
//! `CatalogClient` builds `HttpRequest` values and parses `HttpResponse`
//! values without touching the network. A `Transport` executes the
//! round-trip (`ReqwestTransport` in production). `ProductStore` drives both
//! to keep a UI-facing `StoreState` in sync with the server.
//!
//! # Design
//! - `CatalogClient` is stateless; it holds only `base_url`.
//! - Each CRUD operation is split into `build_*` and `parse_*`, so the I/O
//!   boundary is explicit and the parsing is testable with plain values.
//! - The store serializes its own operations and never returns errors:
//!   failures land in `StoreState::error` or go to the `Notifier`.
//! - DTOs are defined independently from the server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod error;
pub mod http;
pub mod notify;
pub mod store;
pub mod transport;
pub mod types;

pub use client::CatalogClient;
pub use error::{ApiError, ErrorKind, StoreError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use notify::{ChannelNotifier, Level, LogNotifier, Notification, Notifier};
pub use store::{ProductStore, StoreState};
pub use transport::{ReqwestTransport, Transport, TransportConfig};
pub use types::{Product, ProductForm, ProductId};
