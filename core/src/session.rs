//! Uniform request execution for every App Search endpoint.
//!
//! # Design
//! `RequestSession` owns the base URL, the API key and the default headers.
//! Each call is split the same way the endpoint methods are: `build_request`
//! produces an `HttpRequest` as plain data, the `Transport` executes it, and
//! `check_status` turns the `HttpResponse` into a typed error or lets it
//! through. Nothing is mutated after construction.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};
use ureq::http::StatusCode;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::Transport;

pub const CLIENT_NAME: &str = "elastic-app-search-rust";
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const CONTENT_TYPE: &str = "application/json; charset=utf8";

/// Executes requests against one App Search base URL with one API key.
#[derive(Clone)]
pub struct RequestSession {
    base_url: String,
    headers: Vec<(String, String)>,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for RequestSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSession")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl RequestSession {
    pub fn new(api_key: &str, base_url: &str, transport: Arc<dyn Transport>) -> Self {
        let headers = vec![
            ("Authorization".to_string(), format!("Bearer {api_key}")),
            ("X-Swiftype-Client".to_string(), CLIENT_NAME.to_string()),
            ("X-Swiftype-Client-Version".to_string(), CLIENT_VERSION.to_string()),
            ("content-type".to_string(), CONTENT_TYPE.to_string()),
        ];
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            headers,
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Describe a call as plain data without sending it.
    pub fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
        query: &[(&str, &str)],
    ) -> Result<HttpRequest, ApiError> {
        let mut url = format!("{}/{}", self.base_url, path);
        if !query.is_empty() {
            let encoded: Vec<String> = query
                .iter()
                .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
                .collect();
            url.push('?');
            url.push_str(&encoded.join("&"));
        }
        let body = body
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| ApiError::Serialization(e.to_string()))?;

        Ok(HttpRequest {
            method,
            url,
            headers: self.headers.clone(),
            body,
        })
    }

    /// Send a request and classify the status. The body is left undecoded.
    pub fn execute(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
        query: &[(&str, &str)],
    ) -> Result<HttpResponse, ApiError> {
        let request = self.build_request(method, path, body, query)?;
        debug!(%method, url = %request.url, "sending app search request");
        let response = self.transport.send(request)?;
        debug!(%method, path, status = response.status, "app search response");
        if let Err(err) = check_status(&response) {
            warn!(%method, path, status = response.status, error = %err, "app search request failed");
            return Err(err);
        }
        Ok(response)
    }

    /// `execute`, then decode the body as JSON.
    pub fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
        query: &[(&str, &str)],
    ) -> Result<Value, ApiError> {
        let response = self.execute(method, path, body, query)?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    /// `execute` for calls whose response body the caller does not need.
    pub fn request_ignore_response(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
        query: &[(&str, &str)],
    ) -> Result<HttpResponse, ApiError> {
        self.execute(method, path, body, query)
    }
}

/// Map failure statuses to `ApiError`. The named statuses are checked before
/// the generic 4xx/5xx fallback.
pub fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    match response.status {
        401 => Err(ApiError::InvalidCredentials {
            reason: reason_phrase(response.status),
        }),
        400 => Err(ApiError::BadRequest(response.body.clone())),
        409 => Err(ApiError::RecordAlreadyExists),
        404 => Err(ApiError::NonExistentRecord),
        403 => Err(ApiError::Forbidden),
        status if status >= 400 => Err(ApiError::HttpError {
            status,
            reason: reason_phrase(status),
            body: response.body.clone(),
        }),
        _ => Ok(()),
    }
}

fn reason_phrase(status: u16) -> String {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown Status")
        .to_string()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records every request and answers with a fixed response.
    pub(crate) struct RecordingTransport {
        pub requests: Mutex<Vec<HttpRequest>>,
        response: HttpResponse,
    }

    impl RecordingTransport {
        pub(crate) fn new(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                requests: Mutex::new(Vec::new()),
                response: HttpResponse::new(status, body),
            })
        }

        pub(crate) fn last(&self) -> HttpRequest {
            self.requests.lock().unwrap().last().cloned().expect("no request sent")
        }
    }

    impl Transport for RecordingTransport {
        fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            self.requests.lock().unwrap().push(request);
            Ok(self.response.clone())
        }
    }

    struct FailingTransport;

    impl Transport for FailingTransport {
        fn send(&self, _request: HttpRequest) -> Result<HttpResponse, ApiError> {
            Err(ApiError::Transport("connection refused".to_string()))
        }
    }

    fn session(transport: Arc<dyn Transport>) -> RequestSession {
        RequestSession::new("api_host_key", "http://www.base_url.com", transport)
    }

    #[test]
    fn default_headers_carry_auth_and_client_identity() {
        let transport = RecordingTransport::new(200, "{}");
        session(transport.clone())
            .request(HttpMethod::Post, "some_endpoint", None, &[])
            .unwrap();

        let req = transport.last();
        assert_eq!(req.header("authorization"), Some("Bearer api_host_key"));
        assert_eq!(req.header("X-Swiftype-Client"), Some("elastic-app-search-rust"));
        assert_eq!(req.header("X-Swiftype-Client-Version"), Some(CLIENT_VERSION));
        assert_eq!(req.header("Content-Type"), Some("application/json; charset=utf8"));
    }

    #[test]
    fn url_joins_base_and_path() {
        let transport = RecordingTransport::new(200, "{}");
        let s = RequestSession::new("k", "http://www.base_url.com/", transport.clone());
        s.request(HttpMethod::Get, "engines/books", None, &[]).unwrap();
        assert_eq!(transport.last().url, "http://www.base_url.com/engines/books");
    }

    #[test]
    fn query_pairs_are_url_encoded() {
        let s = session(RecordingTransport::new(200, "{}"));
        let req = s
            .build_request(HttpMethod::Get, "engines", None, &[("filter", "a b&c")])
            .unwrap();
        assert_eq!(req.url, "http://www.base_url.com/engines?filter=a%20b%26c");
    }

    #[test]
    fn request_decodes_json_body() {
        let transport = RecordingTransport::new(200, r#"{"foo":"bar"}"#);
        let value = session(transport.clone())
            .request(HttpMethod::Post, "some_endpoint", Some(&json!({"a": [1, 2]})), &[])
            .unwrap();
        assert_eq!(value, json!({"foo": "bar"}));

        let sent: Value = serde_json::from_str(transport.last().body.as_deref().unwrap()).unwrap();
        assert_eq!(sent, json!({"a": [1, 2]}));
    }

    #[test]
    fn request_without_body_sends_none() {
        let transport = RecordingTransport::new(200, "{}");
        session(transport.clone())
            .request(HttpMethod::Delete, "engines/old", None, &[])
            .unwrap();
        assert!(transport.last().body.is_none());
        assert_eq!(transport.last().method, HttpMethod::Delete);
    }

    #[test]
    fn request_ignore_response_skips_decoding() {
        let transport = RecordingTransport::new(200, "");
        let response = session(transport)
            .request_ignore_response(HttpMethod::Post, "engines/e/click", None, &[])
            .unwrap();
        assert_eq!(response.status, 200);
        assert!(response.body.is_empty());
    }

    #[test]
    fn request_with_undecodable_body_fails() {
        let err = session(RecordingTransport::new(200, "not json"))
            .request(HttpMethod::Get, "engines", None, &[])
            .unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }

    #[test]
    fn unauthorized_raises_invalid_credentials() {
        let err = session(RecordingTransport::new(401, ""))
            .request(HttpMethod::Post, "some_endpoint", None, &[])
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidCredentials { ref reason } if reason == "Unauthorized"));
    }

    #[test]
    fn transport_failure_propagates() {
        let err = session(Arc::new(FailingTransport))
            .request(HttpMethod::Get, "engines", None, &[])
            .unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }

    #[test]
    fn check_status_classifies_named_statuses() {
        let classify = |status| check_status(&HttpResponse::new(status, "raw body"));
        assert!(matches!(classify(401), Err(ApiError::InvalidCredentials { .. })));
        assert!(matches!(classify(400), Err(ApiError::BadRequest(ref b)) if b == "raw body"));
        assert!(matches!(classify(409), Err(ApiError::RecordAlreadyExists)));
        assert!(matches!(classify(404), Err(ApiError::NonExistentRecord)));
        assert!(matches!(classify(403), Err(ApiError::Forbidden)));
    }

    #[test]
    fn check_status_falls_back_to_http_error() {
        let err = check_status(&HttpResponse::new(422, "unprocessable")).unwrap_err();
        assert!(matches!(
            err,
            ApiError::HttpError { status: 422, ref reason, ref body }
                if reason == "Unprocessable Entity" && body == "unprocessable"
        ));
        let err = check_status(&HttpResponse::new(502, "")).unwrap_err();
        assert!(matches!(err, ApiError::HttpError { status: 502, .. }));
    }

    #[test]
    fn check_status_accepts_success_statuses() {
        for status in [200, 201, 202, 204, 299] {
            assert!(check_status(&HttpResponse::new(status, "")).is_ok(), "{status}");
        }
    }
}
