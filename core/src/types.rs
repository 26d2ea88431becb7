//! Request and response shapes used by `AppSearchClient`.
//!
//! # Design
//! Most App Search payloads are passed through as `serde_json::Value`; only
//! the shapes the client itself reads or assembles get a type here.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Search options, engine options and click payloads are free-form maps.
pub type Options = Map<String, Value>;

/// Pagination for list endpoints. Sent as `{"page": {"current", "size"}}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub current: u32,
    pub size: u32,
}

impl Page {
    pub fn new(current: u32, size: u32) -> Self {
        Self { current, size }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            current: 1,
            size: 20,
        }
    }
}

/// One query of a multi-search request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Search {
    pub query: String,
    #[serde(default)]
    pub options: Options,
}

impl Search {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            options: Options::new(),
        }
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Options with `query` merged in, as sent on the wire.
    pub(crate) fn to_payload(&self) -> Options {
        let mut payload = self.options.clone();
        payload.insert("query".to_string(), Value::String(self.query.clone()));
        payload
    }
}

/// Per-document outcome of a batch indexing call.
///
/// `errors` is empty when the document was accepted. Every other field the
/// service returns (`id` and friends) is kept in `fields`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DocumentStatus {
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(flatten)]
    pub fields: Options,
}
