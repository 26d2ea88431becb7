//! Blocking client for the App Search document-search API.
//!
//! # Overview
//! `AppSearchClient` exposes one method per remote operation: documents,
//! engines, schemas, synonym sets, search, query suggestions, click
//! tracking, meta-engines, search settings and API logs. Each method builds
//! a path and a JSON payload and hands it to `RequestSession`, which adds
//! authentication headers, sends it through a `Transport`, and maps the
//! response to a decoded `serde_json::Value` or an `ApiError`.
//!
//! # Design
//! - The client is stateless between calls: it holds only the immutable
//!   configuration and session.
//! - Requests and responses cross the transport boundary as plain data
//!   (`HttpRequest` / `HttpResponse`), so the adapter is testable without
//!   a network and the HTTP library is swappable.
//! - Signed search keys are produced locally with HS256; no request is made.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod session;
pub mod signed_key;
pub mod transport;
pub mod types;

pub use client::AppSearchClient;
pub use config::ClientConfig;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use session::RequestSession;
pub use signed_key::create_signed_search_key;
pub use transport::{Transport, UreqTransport};
pub use types::{DocumentStatus, Options, Page, Search};
