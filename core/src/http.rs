//! HTTP transport types and the `Transport` seam.
//!
//! # Design
//! `HttpRequest` and `HttpResponse` describe HTTP traffic as plain owned
//! data. `ApiClient` builds requests and parses responses without touching
//! the network; the `Transport` trait is the single injection point where
//! I/O happens. Production code uses `UreqTransport`; tests substitute a
//! scripted fake, keeping everything above the trait deterministic.
//!
//! A transport only fails for transport-level reasons (no connection,
//! unresolvable host, malformed URL). Any response the server actually sent,
//! including 4xx/5xx, is returned as data — status interpretation belongs to
//! the parse layer.

use crate::error::ApiError;

/// HTTP method for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
    Delete,
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// Executes an `HttpRequest` against the network.
///
/// Implementations must be shareable across threads: the mood manager fans
/// month-grid fetches out over a small worker pool holding one shared
/// transport.
pub trait Transport: Send + Sync {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Production transport backed by a `ureq` agent.
///
/// Status-code-as-error handling is disabled so 4xx/5xx responses come back
/// as data rather than `Err`; platform-default timeouts apply and there are
/// no retries.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
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

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let HttpRequest {
            method,
            path,
            headers,
            body,
        } = request;

        let result = match (method, body) {
            (HttpMethod::Get, _) => {
                let mut req = self.agent.get(&path);
                for (name, value) in &headers {
                    req = req.header(name, value);
                }
                req.call()
            }
            (HttpMethod::Delete, _) => {
                let mut req = self.agent.delete(&path);
                for (name, value) in &headers {
                    req = req.header(name, value);
                }
                req.call()
            }
            (HttpMethod::Post, body) => {
                let mut req = self.agent.post(&path);
                for (name, value) in &headers {
                    req = req.header(name, value);
                }
                match body {
                    Some(body) => req.send(body.as_bytes()),
                    None => req.send_empty(),
                }
            }
            (HttpMethod::Patch, body) => {
                let mut req = self.agent.patch(&path);
                for (name, value) in &headers {
                    req = req.header(name, value);
                }
                match body {
                    Some(body) => req.send(body.as_bytes()),
                    None => req.send_empty(),
                }
            }
        };

        let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body,
        })
    }
}
