//! HTTP transport types and the JSON client wrapper shared by both resources.
//!
//! # Design
//! Requests and responses are plain data. `HttpClient` turns a path and an
//! optional JSON body into an `HttpRequest`, hands it to a `Transport` for the
//! actual I/O, and classifies the outcome into either an `HttpResponse` with a
//! 2xx status or a `Failure`. Interpreting failures is left to the
//! normalizer; interpreting bodies is left to the services.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::config::ClientConfig;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// An HTTP request described as plain data.
///
/// `url` is absolute: the client joins its base address and the resource
/// path before the request reaches a transport. `timeout` is the budget a
/// transport must enforce; `UreqTransport` bakes it into its agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub timeout: Duration,
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Why a transport could not produce a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request went out but nothing came back (refused, reset, timed out).
    NoResponse(String),
    /// The request could not be assembled or dispatched.
    Other(String),
}

/// Executes `HttpRequest` values against the network (or anything else).
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// A failed HTTP round-trip, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    /// The server replied with a non-2xx status.
    Response {
        status: u16,
        body: Option<serde_json::Value>,
    },
    /// The request was sent but no response arrived.
    Request(String),
    /// Something went wrong before a request could be sent.
    Other(Option<String>),
}

/// JSON client bound to one base address.
///
/// Every request carries `Content-Type: application/json` and the configured
/// timeout. There are no retries: one failed attempt is reported as-is.
#[derive(Clone)]
pub struct HttpClient {
    base_url: String,
    timeout: Duration,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    pub fn new(config: &ClientConfig, transport: Arc<dyn Transport>) -> Self {
        tracing::info!(base_url = %config.base_url, "configured REST API client");
        Self {
            base_url: config.base_url.clone(),
            timeout: config.timeout,
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn get(&self, path: &str) -> Result<HttpResponse, Failure> {
        self.request::<()>(HttpMethod::Get, path, None)
    }

    pub fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<HttpResponse, Failure> {
        self.request(HttpMethod::Post, path, Some(body))
    }

    pub fn put<B: Serialize>(&self, path: &str, body: &B) -> Result<HttpResponse, Failure> {
        self.request(HttpMethod::Put, path, Some(body))
    }

    pub fn patch<B: Serialize>(&self, path: &str, body: &B) -> Result<HttpResponse, Failure> {
        self.request(HttpMethod::Patch, path, Some(body))
    }

    pub fn delete(&self, path: &str) -> Result<HttpResponse, Failure> {
        self.request::<()>(HttpMethod::Delete, path, None)
    }

    /// Send one request with an optional JSON body.
    pub fn request<B: Serialize>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
    ) -> Result<HttpResponse, Failure> {
        let body = body
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| Failure::Other(Some(e.to_string())))?;
        let request = HttpRequest {
            method,
            url: format!("{}{path}", self.base_url),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body,
            timeout: self.timeout,
        };
        tracing::debug!(method = method.as_str(), url = %request.url, "sending request");

        let response = self.transport.execute(&request).map_err(|e| match e {
            TransportError::NoResponse(msg) => Failure::Request(msg),
            TransportError::Other(msg) => Failure::Other(Some(msg)),
        })?;
        tracing::debug!(status = response.status, url = %request.url, "received response");

        if response.is_success() {
            return Ok(response);
        }
        let body = serde_json::from_str(&response.body).ok();
        Err(Failure::Response {
            status: response.status,
            body,
        })
    }
}
