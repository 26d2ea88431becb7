//! The I/O seam between `RequestSession` and the network.
//!
//! # Design
//! `RequestSession` only ever builds `HttpRequest` values and classifies
//! `HttpResponse` values. Moving bytes is delegated to a `Transport`, so the
//! adapter stays deterministic in tests and callers can bring their own
//! agent configuration (timeouts, proxies, TLS) without this crate setting
//! any of it.

use ureq::{Agent, RequestBuilder};

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes one HTTP round-trip.
///
/// Implementations return every status code as data; only failures that
/// produce no response at all become `Err`.
pub trait Transport: Send + Sync {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Blocking transport on a `ureq` agent.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }

    /// Use a caller-configured agent. The agent must be built with
    /// `http_status_as_error(false)` or 4xx/5xx responses surface as
    /// `ApiError::Transport` instead of being classified.
    pub fn with_agent(agent: Agent) -> Self {
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
        } = request;

        // App Search reads JSON bodies on GET and DELETE, so those verbs
        // force the body onto the wire when one is present.
        let result = match method {
            HttpMethod::Get => {
                let builder = with_headers(self.agent.get(&url), &headers);
                match body {
                    Some(body) => builder.force_send_body().send(body.as_bytes()),
                    None => builder.call(),
                }
            }
            HttpMethod::Delete => {
                let builder = with_headers(self.agent.delete(&url), &headers);
                match body {
                    Some(body) => builder.force_send_body().send(body.as_bytes()),
                    None => builder.call(),
                }
            }
            HttpMethod::Post => send_with_body(with_headers(self.agent.post(&url), &headers), body),
            HttpMethod::Put => send_with_body(with_headers(self.agent.put(&url), &headers), body),
            HttpMethod::Patch => {
                send_with_body(with_headers(self.agent.patch(&url), &headers), body)
            }
        };

        let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| ApiError::Transport(format!("reading response body: {e}")))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn with_headers<B>(mut builder: RequestBuilder<B>, headers: &[(String, String)]) -> RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn send_with_body(
    builder: RequestBuilder<ureq::typestate::WithBody>,
    body: Option<String>,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match body {
        Some(body) => builder.send(body.as_bytes()),
        None => builder.send_empty(),
    }
}
