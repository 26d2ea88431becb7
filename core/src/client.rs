//! One method per App Search endpoint.
//!
//! # Design
//! `AppSearchClient` holds an immutable `RequestSession` and nothing else that
//! changes between calls. Every method templates a path, assembles a JSON
//! payload and delegates to the session; response envelopes come back as
//! `serde_json::Value` exactly as the service sent them. Only
//! `index_document` and `multi_search` do anything beyond that.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::session::RequestSession;
use crate::signed_key;
use crate::transport::{Transport, UreqTransport};
use crate::types::{DocumentStatus, Options, Page, Search};

/// Blocking client for the App Search API.
///
/// Cheap to clone and safe to share across threads; each method performs
/// exactly one HTTP round-trip.
#[derive(Debug, Clone)]
pub struct AppSearchClient {
    config: ClientConfig,
    session: RequestSession,
}

impl AppSearchClient {
    /// Client over the default blocking `ureq` transport.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, UreqTransport::new())
    }

    pub fn with_transport(config: ClientConfig, transport: impl Transport + 'static) -> Self {
        Self::with_shared_transport(config, Arc::new(transport))
    }

    pub fn with_shared_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let session = RequestSession::new(&config.api_key, &config.base_url(), transport);
        Self { config, session }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The underlying adapter, for endpoints without a dedicated method.
    pub fn session(&self) -> &RequestSession {
        &self.session
    }

    // -----------------------------------------------------------------------
    // Documents
    // -----------------------------------------------------------------------

    /// Fetch documents by id. Missing ids come back as `null` entries.
    pub fn get_documents(&self, engine_name: &str, document_ids: &[&str]) -> Result<Value, ApiError> {
        let path = format!("engines/{engine_name}/documents");
        self.session
            .request(HttpMethod::Get, &path, Some(&json!(document_ids)), &[])
    }

    pub fn list_documents(&self, engine_name: &str, page: Page) -> Result<Value, ApiError> {
        let path = format!("engines/{engine_name}/documents/list");
        self.session
            .request(HttpMethod::Get, &path, Some(&json!({ "page": page })), &[])
    }

    /// Index a single document.
    ///
    /// Returns the document's status record without its `errors` key, or
    /// `ApiError::InvalidDocument` when the service rejected the document.
    pub fn index_document(&self, engine_name: &str, document: &Value) -> Result<Options, ApiError> {
        let statuses = self.index_documents(engine_name, std::slice::from_ref(document))?;
        let first = statuses
            .as_array()
            .and_then(|statuses| statuses.first())
            .cloned()
            .ok_or_else(|| {
                ApiError::Deserialization("batch indexing returned no document status".to_string())
            })?;
        let status: DocumentStatus =
            serde_json::from_value(first).map_err(|e| ApiError::Deserialization(e.to_string()))?;

        if !status.errors.is_empty() {
            return Err(ApiError::InvalidDocument {
                message: status.errors.join("; "),
                document: document.clone(),
            });
        }
        Ok(status.fields)
    }

    /// Create or replace documents. Returns one status record per document;
    /// rejected documents carry a non-empty `errors` array.
    pub fn index_documents(&self, engine_name: &str, documents: &[Value]) -> Result<Value, ApiError> {
        let path = format!("engines/{engine_name}/documents");
        let body = Value::Array(documents.to_vec());
        self.session.request(HttpMethod::Post, &path, Some(&body), &[])
    }

    /// Partially update existing documents. Each document needs an `id`.
    pub fn update_documents(&self, engine_name: &str, documents: &[Value]) -> Result<Value, ApiError> {
        let path = format!("engines/{engine_name}/documents");
        let body = Value::Array(documents.to_vec());
        self.session.request(HttpMethod::Patch, &path, Some(&body), &[])
    }

    pub fn destroy_documents(&self, engine_name: &str, document_ids: &[&str]) -> Result<Value, ApiError> {
        let path = format!("engines/{engine_name}/documents");
        self.session
            .request(HttpMethod::Delete, &path, Some(&json!(document_ids)), &[])
    }

    // -----------------------------------------------------------------------
    // Schema
    // -----------------------------------------------------------------------

    pub fn get_schema(&self, engine_name: &str) -> Result<Value, ApiError> {
        let path = format!("engines/{engine_name}/schema");
        self.session.request(HttpMethod::Get, &path, None, &[])
    }

    /// Add schema fields or change the type of existing ones.
    pub fn update_schema(&self, engine_name: &str, schema: &Value) -> Result<Value, ApiError> {
        let path = format!("engines/{engine_name}/schema");
        self.session.request(HttpMethod::Post, &path, Some(schema), &[])
    }

    // -----------------------------------------------------------------------
    // Engines
    // -----------------------------------------------------------------------

    pub fn list_engines(&self, page: Page) -> Result<Value, ApiError> {
        self.session
            .request(HttpMethod::Get, "engines", Some(&json!({ "page": page })), &[])
    }

    pub fn get_engine(&self, engine_name: &str) -> Result<Value, ApiError> {
        let path = format!("engines/{engine_name}");
        self.session.request(HttpMethod::Get, &path, None, &[])
    }

    /// Create an engine. Entries in `options` are merged into the payload
    /// after `name` and `language`.
    pub fn create_engine(
        &self,
        engine_name: &str,
        language: Option<&str>,
        options: Option<&Options>,
    ) -> Result<Value, ApiError> {
        let mut data = Options::new();
        data.insert("name".to_string(), json!(engine_name));
        if let Some(language) = language {
            data.insert("language".to_string(), json!(language));
        }
        if let Some(options) = options {
            data.extend(options.clone());
        }
        self.session
            .request(HttpMethod::Post, "engines", Some(&Value::Object(data)), &[])
    }

    pub fn destroy_engine(&self, engine_name: &str) -> Result<Value, ApiError> {
        let path = format!("engines/{engine_name}");
        self.session.request(HttpMethod::Delete, &path, None, &[])
    }

    // -----------------------------------------------------------------------
    // Synonym sets
    // -----------------------------------------------------------------------

    pub fn list_synonym_sets(&self, engine_name: &str, page: Page) -> Result<Value, ApiError> {
        let path = format!("engines/{engine_name}/synonyms");
        self.session
            .request(HttpMethod::Get, &path, Some(&json!({ "page": page })), &[])
    }

    pub fn get_synonym_set(&self, engine_name: &str, synonym_set_id: &str) -> Result<Value, ApiError> {
        let path = format!("engines/{engine_name}/synonyms/{synonym_set_id}");
        self.session.request(HttpMethod::Get, &path, None, &[])
    }

    pub fn create_synonym_set(&self, engine_name: &str, synonyms: &[&str]) -> Result<Value, ApiError> {
        let path = format!("engines/{engine_name}/synonyms");
        self.session
            .request(HttpMethod::Post, &path, Some(&json!({ "synonyms": synonyms })), &[])
    }

    /// Replace the terms of an existing synonym set.
    pub fn update_synonym_set(
        &self,
        engine_name: &str,
        synonym_set_id: &str,
        synonyms: &[&str],
    ) -> Result<Value, ApiError> {
        let path = format!("engines/{engine_name}/synonyms/{synonym_set_id}");
        self.session
            .request(HttpMethod::Put, &path, Some(&json!({ "synonyms": synonyms })), &[])
    }

    pub fn destroy_synonym_set(&self, engine_name: &str, synonym_set_id: &str) -> Result<Value, ApiError> {
        let path = format!("engines/{engine_name}/synonyms/{synonym_set_id}");
        self.session.request(HttpMethod::Delete, &path, None, &[])
    }

    // -----------------------------------------------------------------------
    // Search
    // -----------------------------------------------------------------------

    pub fn search(&self, engine_name: &str, query: &str, options: Option<&Options>) -> Result<Value, ApiError> {
        let path = format!("engines/{engine_name}/search");
        let body = with_query(options, query);
        self.session.request(HttpMethod::Get, &path, Some(&body), &[])
    }

    /// Run several searches in one request. Each entry's `query` is merged
    /// into its own options.
    pub fn multi_search(&self, engine_name: &str, searches: &[Search]) -> Result<Value, ApiError> {
        let path = format!("engines/{engine_name}/multi_search");
        let queries: Vec<Value> = searches
            .iter()
            .map(|search| Value::Object(search.to_payload()))
            .collect();
        self.session
            .request(HttpMethod::Get, &path, Some(&json!({ "queries": queries })), &[])
    }

    pub fn query_suggestion(
        &self,
        engine_name: &str,
        query: &str,
        options: Option<&Options>,
    ) -> Result<Value, ApiError> {
        let path = format!("engines/{engine_name}/query_suggestion");
        let body = with_query(options, query);
        self.session.request(HttpMethod::Get, &path, Some(&body), &[])
    }

    /// Record a click-through. The response body is discarded.
    pub fn click(&self, engine_name: &str, options: &Options) -> Result<(), ApiError> {
        let path = format!("engines/{engine_name}/click");
        let body = Value::Object(options.clone());
        self.session
            .request_ignore_response(HttpMethod::Post, &path, Some(&body), &[])?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Meta engines
    // -----------------------------------------------------------------------

    pub fn create_meta_engine(&self, engine_name: &str, source_engines: &[&str]) -> Result<Value, ApiError> {
        let body = json!({
            "name": engine_name,
            "source_engines": source_engines,
            "type": "meta",
        });
        self.session.request(HttpMethod::Post, "engines", Some(&body), &[])
    }

    pub fn add_meta_engine_sources(&self, engine_name: &str, source_engines: &[&str]) -> Result<Value, ApiError> {
        let path = format!("engines/{engine_name}/source_engines");
        self.session
            .request(HttpMethod::Post, &path, Some(&json!(source_engines)), &[])
    }

    pub fn delete_meta_engine_sources(
        &self,
        engine_name: &str,
        source_engines: &[&str],
    ) -> Result<Value, ApiError> {
        let path = format!("engines/{engine_name}/source_engines");
        self.session
            .request(HttpMethod::Delete, &path, Some(&json!(source_engines)), &[])
    }

    // -----------------------------------------------------------------------
    // Search settings
    // -----------------------------------------------------------------------

    pub fn get_search_settings(&self, engine_name: &str) -> Result<Value, ApiError> {
        let path = format!("engines/{engine_name}/search_settings");
        self.session.request(HttpMethod::Get, &path, None, &[])
    }

    pub fn update_search_settings(&self, engine_name: &str, search_settings: &Value) -> Result<Value, ApiError> {
        let path = format!("engines/{engine_name}/search_settings");
        self.session
            .request(HttpMethod::Put, &path, Some(search_settings), &[])
    }

    pub fn reset_search_settings(&self, engine_name: &str) -> Result<Value, ApiError> {
        let path = format!("engines/{engine_name}/search_settings/reset");
        self.session.request(HttpMethod::Post, &path, None, &[])
    }

    // -----------------------------------------------------------------------
    // Logs and keys
    // -----------------------------------------------------------------------

    pub fn get_api_logs(&self, engine_name: &str, options: Option<&Options>) -> Result<Value, ApiError> {
        let path = format!("engines/{engine_name}/logs/api");
        let body = Value::Object(options.cloned().unwrap_or_default());
        self.session.request(HttpMethod::Get, &path, Some(&body), &[])
    }

    /// See [`signed_key::create_signed_search_key`].
    pub fn create_signed_search_key(
        api_key: &str,
        api_key_name: &str,
        options: &Options,
    ) -> Result<String, ApiError> {
        signed_key::create_signed_search_key(api_key, api_key_name, options)
    }
}

fn with_query(options: Option<&Options>, query: &str) -> Value {
    let mut body = options.cloned().unwrap_or_default();
    body.insert("query".to_string(), json!(query));
    Value::Object(body)
}
