//! Transports carrying requests to an execution backend.
//!
//! The client only needs "post this JSON to that endpoint and give me the
//! status and JSON body back". [`HttpTransport`] does that over HTTP,
//! [`LocalTransport`] hands the request to an in-process [`Backend`].

use std::sync::Mutex;

use serde_json::Value;

use crate::backend::Backend;
use crate::client::ClientConfig;
use crate::protocol::Endpoint;

/// Errors that can occur before a backend reply is available.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The backend could not be reached or the connection broke.
    #[error("{0}")]
    Unreachable(String),

    /// A reply arrived but its body is not JSON.
    #[error("invalid response body: {0}")]
    InvalidBody(String),
}

/// Status and JSON body of a backend reply.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub body: Value,
}

impl Reply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Blocking request/response transport.
///
/// Implementors never retry; a failed request is reported once and left to the
/// caller.
pub trait Transport: Send + Sync {
    /// Posts `body` to `endpoint` and waits for the reply.
    ///
    /// # Errors
    /// Returns `TransportError::Unreachable` when no reply could be obtained and
    /// `TransportError::InvalidBody` when the reply is not JSON. Non-success
    /// statuses are not errors at this level.
    fn post(&self, endpoint: Endpoint, body: &Value) -> Result<Reply, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn post(&self, endpoint: Endpoint, body: &Value) -> Result<Reply, TransportError> {
        (**self).post(endpoint, body)
    }
}

pub struct HttpTransport {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpTransport {
    pub fn new(base_url: &str, config: ClientConfig) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent: builder.build(),
        }
    }

    pub fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }
}

fn read_body(response: ureq::Response) -> Result<Value, TransportError> {
    let text = response
        .into_string()
        .map_err(|e| TransportError::Unreachable(e.to_string()))?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text).map_err(|e| TransportError::InvalidBody(e.to_string()))
}

impl Transport for HttpTransport {
    fn post(&self, endpoint: Endpoint, body: &Value) -> Result<Reply, TransportError> {
        let url = self.url(endpoint);
        log::debug!("POST {}", url);

        match self.agent.post(&url).send_json(body) {
            Ok(response) => {
                let status = response.status();
                Ok(Reply {
                    status,
                    body: read_body(response)?,
                })
            }
            Err(ureq::Error::Status(status, response)) => {
                // Error bodies are best effort, the status alone is enough
                let body = read_body(response).unwrap_or(Value::Null);
                Ok(Reply { status, body })
            }
            Err(err) => Err(TransportError::Unreachable(err.to_string())),
        }
    }
}

/// Serves requests from a [`Backend`] living in this process.
pub struct LocalTransport {
    backend: Mutex<Backend>,
}

impl LocalTransport {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend: Mutex::new(backend),
        }
    }
}

impl Default for LocalTransport {
    fn default() -> Self {
        Self::new(Backend::default())
    }
}

impl Transport for LocalTransport {
    fn post(&self, endpoint: Endpoint, body: &Value) -> Result<Reply, TransportError> {
        let mut backend = self
            .backend
            .lock()
            .map_err(|_| TransportError::Unreachable("backend lock poisoned".to_string()))?;

        let (status, response) = backend.handle(endpoint, body);
        let body =
            serde_json::to_value(&response).map_err(|e| TransportError::InvalidBody(e.to_string()))?;

        Ok(Reply { status, body })
    }
}
