//! Blocking network transport backed by `ureq`.
//!
//! Status codes come back as data rather than as `Err`, so 4xx/5xx responses
//! reach the normalizer with their bodies intact. Only failures where no
//! response exists are reported as `TransportError`.

use std::time::Duration;

use crate::config::ClientConfig;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};

#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.timeout)
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = request.url.as_str();
        let body = request.body.as_deref().unwrap_or_default().as_bytes();

        let result = match request.method {
            HttpMethod::Get => with_headers(self.agent.get(url), request).call(),
            HttpMethod::Delete => with_headers(self.agent.delete(url), request).call(),
            HttpMethod::Post => with_headers(self.agent.post(url), request).send(body),
            HttpMethod::Put => with_headers(self.agent.put(url), request).send(body),
            HttpMethod::Patch => with_headers(self.agent.patch(url), request).send(body),
        };
        let mut response = result.map_err(classify)?;

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
            .map_err(|e| TransportError::NoResponse(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    request: &HttpRequest,
) -> ureq::RequestBuilder<B> {
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

/// Errors raised before anything went on the wire are `Other`; everything
/// else means the server never answered.
fn classify(error: ureq::Error) -> TransportError {
    match error {
        ureq::Error::BadUri(_) | ureq::Error::Http(_) => TransportError::Other(error.to_string()),
        other => TransportError::NoResponse(other.to_string()),
    }
}
