//! Remote client for a delegated execution backend
//!
//! Turns the five front-end actions into requests, and replies into
//! [`Response`]s. The backend session is a single mutable resource, so the
//! client lets only one request be in flight at a time, for every action.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::protocol::{EmptyRequest, Endpoint, LoadRequest, Response, Segments};
use crate::transport::{HttpTransport, Transport, TransportError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientConfig {
    /// Per-request timeout. `None` waits for the backend indefinitely.
    pub timeout: Option<Duration>,
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Another request is still in flight.
    #[error("another request is still in progress")]
    Busy,

    /// The backend answered with a failure status; carries its message verbatim.
    #[error("{message}")]
    Backend { status: u16, message: String },

    #[error("could not reach backend: {0}")]
    Transport(#[from] TransportError),

    #[error("unexpected response from backend: {0}")]
    Decode(String),
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Marks the client busy for as long as it lives.
struct InFlight<'c> {
    flag: &'c AtomicBool,
}

impl<'c> InFlight<'c> {
    fn acquire(flag: &'c AtomicBool) -> ClientResult<Self> {
        flag.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .map_err(|_| ClientError::Busy)?;
        Ok(Self { flag })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

pub struct RemoteClient<T: Transport> {
    transport: T,
    busy: AtomicBool,
}

impl RemoteClient<HttpTransport> {
    pub fn http(base_url: &str, config: ClientConfig) -> Self {
        Self::new(HttpTransport::new(base_url, config))
    }
}

impl<T: Transport> RemoteClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            busy: AtomicBool::new(false),
        }
    }

    /// True while a request is in flight. Front-ends disable their controls on it.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn request(&self, endpoint: Endpoint, body: &impl Serialize) -> ClientResult<Response> {
        let _in_flight = InFlight::acquire(&self.busy)?;

        let body = serde_json::to_value(body).map_err(|e| ClientError::Decode(e.to_string()))?;
        let reply = self.transport.post(endpoint, &body).inspect_err(|err| {
            log::warn!("{}: transport failure: {}", endpoint, err);
        })?;

        let status = reply.status;
        let success = reply.is_success();

        // Failure bodies only matter for their message, so they may be anything
        let response = if reply.body.is_null() {
            Response::default()
        } else if success {
            serde_json::from_value::<Response>(reply.body)
                .map_err(|e| ClientError::Decode(e.to_string()))?
        } else {
            serde_json::from_value::<Response>(reply.body).unwrap_or_default()
        };

        if !success {
            let message = response
                .failure_text()
                .map(str::to_string)
                .unwrap_or_else(|| format!("backend request failed with status {}", status));
            log::warn!("{}: backend error {}: {}", endpoint, status, message);

            return Err(ClientError::Backend { status, message });
        }

        log::debug!("{}: ok", endpoint);
        Ok(response)
    }

    pub fn load(&self, code: &str, segments: Segments) -> ClientResult<Response> {
        let request = LoadRequest {
            code: code.to_string(),
            segments,
        };
        self.request(Endpoint::Load, &request)
    }

    pub fn run(&self) -> ClientResult<Response> {
        self.request(Endpoint::Run, &EmptyRequest {})
    }

    pub fn step(&self) -> ClientResult<Response> {
        self.request(Endpoint::Step, &EmptyRequest {})
    }

    pub fn reset(&self) -> ClientResult<Response> {
        self.request(Endpoint::Reset, &EmptyRequest {})
    }

    pub fn dump(&self) -> ClientResult<Response> {
        self.request(Endpoint::Dump, &EmptyRequest {})
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Barrier, Mutex};
    use std::thread;

    use serde_json::json;

    use super::*;
    use crate::transport::{LocalTransport, Reply};

    /// Replays canned replies and records what was sent.
    struct Scripted {
        replies: Mutex<VecDeque<Result<Reply, TransportError>>>,
        sent: Mutex<Vec<(Endpoint, Value)>>,
    }

    impl Scripted {
        fn with(replies: Vec<Result<Reply, TransportError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                sent: Mutex::default(),
            }
        }
    }

    impl Transport for Scripted {
        fn post(&self, endpoint: Endpoint, body: &Value) -> Result<Reply, TransportError> {
            self.sent.lock().unwrap().push((endpoint, body.clone()));
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Unreachable("no reply scripted".into())))
        }
    }

    fn ok(body: Value) -> Result<Reply, TransportError> {
        Ok(Reply { status: 200, body })
    }

    #[test]
    fn load_sends_code_and_segments() {
        let client = RemoteClient::new(Scripted::with(vec![ok(json!({"message": "loaded"}))]));
        let segments = Segments {
            ds: 0x10,
            ..Segments::default()
        };
        let response = client.load("MOV AX, 1", segments).unwrap();
        assert_eq!(response.message.as_deref(), Some("loaded"));

        let sent = client.transport().sent.lock().unwrap();
        assert_eq!(sent[0].0, Endpoint::Load);
        assert_eq!(sent[0].1["code"], "MOV AX, 1");
        assert_eq!(sent[0].1["segments"]["ds"], 16);
    }

    #[test]
    fn other_actions_send_empty_objects() {
        let client = RemoteClient::new(Scripted::with(vec![
            ok(json!({})),
            ok(json!({})),
            ok(json!({})),
            ok(json!({})),
        ]));
        client.run().unwrap();
        client.step().unwrap();
        client.reset().unwrap();
        client.dump().unwrap();

        let sent = client.transport().sent.lock().unwrap();
        let endpoints: Vec<_> = sent.iter().map(|(ep, _)| *ep).collect();
        assert_eq!(
            endpoints,
            vec![Endpoint::Run, Endpoint::Step, Endpoint::Reset, Endpoint::Dump]
        );
        assert!(sent.iter().all(|(_, body)| *body == json!({})));
    }

    #[test]
    fn backend_message_is_surfaced_verbatim() {
        let client = RemoteClient::new(Scripted::with(vec![
            Ok(Reply {
                status: 500,
                body: json!({"error": "erro na instrução: boom"}),
            }),
            Ok(Reply {
                status: 400,
                body: json!({"message": "bad program", "error": "ignored"}),
            }),
        ]));

        let err = client.run().unwrap_err();
        assert_eq!(err.to_string(), "erro na instrução: boom");
        assert!(matches!(err, ClientError::Backend { status: 500, .. }));

        let err = client.step().unwrap_err();
        assert_eq!(err.to_string(), "bad program");
    }

    #[test]
    fn failure_without_message_is_generic() {
        let client = RemoteClient::new(Scripted::with(vec![Ok(Reply {
            status: 502,
            body: json!("<html>bad gateway</html>"),
        })]));
        let err = client.dump().unwrap_err();
        assert_eq!(err.to_string(), "backend request failed with status 502");
    }

    #[test]
    fn transport_failure_is_not_retried() {
        let client = RemoteClient::new(Scripted::with(vec![
            Err(TransportError::Unreachable("connection refused".into())),
            ok(json!({"message": "would have worked"})),
        ]));

        let err = client.reset().unwrap_err();
        assert_eq!(err.to_string(), "could not reach backend: connection refused");
        assert_eq!(client.transport().sent.lock().unwrap().len(), 1);
        assert!(!client.is_busy());
    }

    /// Blocks inside `post` until the test lets it go.
    struct Gate {
        entered: Barrier,
        release: Barrier,
    }

    impl Transport for Gate {
        fn post(&self, _endpoint: Endpoint, _body: &Value) -> Result<Reply, TransportError> {
            self.entered.wait();
            self.release.wait();
            Ok(Reply {
                status: 200,
                body: json!({}),
            })
        }
    }

    #[test]
    fn overlapping_requests_are_rejected() {
        let client = Arc::new(RemoteClient::new(Gate {
            entered: Barrier::new(2),
            release: Barrier::new(2),
        }));

        let background = {
            let client = Arc::clone(&client);
            thread::spawn(move || client.run().map(|_| ()))
        };

        client.transport().entered.wait();
        assert!(client.is_busy());
        for result in [
            client.step(),
            client.load("MOV AX, 1", Segments::default()),
            client.reset(),
            client.dump(),
        ] {
            assert!(matches!(result, Err(ClientError::Busy)));
        }
        client.transport().release.wait();

        background.join().unwrap().unwrap();
        assert!(!client.is_busy());
    }

    #[test]
    fn works_against_the_local_backend() {
        let client = RemoteClient::new(LocalTransport::default());
        client
            .load("MOV AX,10\nADD AX,5\nSTORE AX,0\nLOAD BX,0", Segments::default())
            .unwrap();
        let response = client.run().unwrap();

        let state = response.state.unwrap();
        assert_eq!(state.registers["AX"], 15);
        assert_eq!(state.registers["BX"], 15);
        assert_eq!(response.logs.unwrap().len(), 4);

        let err = client.load("", Segments::default()).unwrap_err();
        assert_eq!(err.to_string(), "no code received");
    }
}
