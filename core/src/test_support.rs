//! Test doubles: an in-memory transport that records requests and replays
//! responses, and a buffer that captures formatted log output.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

use crate::http::{HttpRequest, HttpResponse, Transport, TransportError};

#[derive(Default)]
pub(crate) struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn respond(&self, status: u16, body: &str) {
        self.replies.lock().unwrap().push_back(Ok(HttpResponse {
            status,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: body.to_string(),
        }));
    }

    pub(crate) fn respond_json(&self, status: u16, body: serde_json::Value) {
        self.respond(status, &body.to_string());
    }

    pub(crate) fn fail(&self, error: TransportError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn last_request(&self) -> Option<HttpRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

impl Transport for ScriptedTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Other("no scripted reply".to_string())))
    }
}

/// Shared sink for `tracing_subscriber::fmt` output.
#[derive(Clone, Default)]
pub(crate) struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    /// Run `f` with a subscriber that writes INFO and above into this buffer.
    pub(crate) fn capture<R>(&self, f: impl FnOnce() -> R) -> R {
        let sink = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(move || sink.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f)
    }

    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
