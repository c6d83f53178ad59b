//! Executing `HttpRequest`s.
//!
//! # Design
//! `Transport` is the seam between the sans-IO client and the network.
//! `UreqTransport` disables ureq's status-code-as-error behavior so 4xx/5xx
//! responses come back as data; only failures that produce no response at
//! all become `ApiError::Transport`.

use crate::error::ApiError;
use crate::http::{Body, HttpMethod, HttpRequest, HttpResponse};

pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Blocking transport backed by a shared `ureq::Agent`.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl std::fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UreqTransport").finish_non_exhaustive()
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let mut headers = request.headers.clone();
        if let Some(Body::Multipart(form)) = &request.body {
            headers.push(("Content-Type".to_string(), form.content_type()));
        }
        let payload = request.body.as_ref().map(Body::to_bytes);
        let url = request.url.as_str();

        let result = match (request.method, payload) {
            (HttpMethod::Get, _) => with_headers(self.agent.get(url), &headers).call(),
            (HttpMethod::Delete, _) => with_headers(self.agent.delete(url), &headers).call(),
            (HttpMethod::Post, Some(bytes)) => with_headers(self.agent.post(url), &headers).send(&bytes[..]),
            (HttpMethod::Post, None) => with_headers(self.agent.post(url), &headers).send_empty(),
            (HttpMethod::Put, Some(bytes)) => with_headers(self.agent.put(url), &headers).send(&bytes[..]),
            (HttpMethod::Put, None) => with_headers(self.agent.put(url), &headers).send_empty(),
            (HttpMethod::Patch, Some(bytes)) => with_headers(self.agent.patch(url), &headers).send(&bytes[..]),
            (HttpMethod::Patch, None) => with_headers(self.agent.patch(url), &headers).send_empty(),
        };

        let mut response = result.map_err(|e| {
            tracing::debug!(method = request.method.as_str(), url, error = %e, "request failed");
            ApiError::Transport(e.to_string())
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        tracing::debug!(method = request.method.as_str(), url, status, "request completed");
        Ok(HttpResponse { status, headers, body })
    }
}

fn with_headers<B>(mut builder: ureq::RequestBuilder<B>, headers: &[(String, String)]) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}
