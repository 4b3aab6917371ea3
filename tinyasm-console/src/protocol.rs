//! Wire format spoken with an execution backend
//!
//! Every action is a JSON `POST` to one endpoint. Request bodies are `{}`
//! except for `/load`; every response field is optional.

use std::fmt;

use serde::{Deserialize, Serialize};
use tinyasm_lang::StateSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Load,
    Run,
    Step,
    Reset,
    Dump,
}

impl Endpoint {
    pub const ALL: [Endpoint; 5] = [
        Endpoint::Load,
        Endpoint::Run,
        Endpoint::Step,
        Endpoint::Reset,
        Endpoint::Dump,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Load => "/load",
            Endpoint::Run => "/run",
            Endpoint::Step => "/step",
            Endpoint::Reset => "/reset",
            Endpoint::Dump => "/dump",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        Endpoint::ALL.into_iter().find(|ep| ep.path() == path)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Initial segment register values sent with a program.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Segments {
    pub cs: i64,
    pub ds: i64,
    pub ss: i64,
    pub es: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadRequest {
    pub code: String,
    #[serde(default)]
    pub segments: Segments,
}

/// Body of the argument-less endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyRequest {}

/// Any backend reply, success or failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Response {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<StateSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logs: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<Vec<i64>>,
}

impl Response {
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            message: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            error: Some(text.into()),
            ..Self::default()
        }
    }

    /// The text a failed request should surface: `message` first, then `error`.
    pub fn failure_text(&self) -> Option<&str> {
        self.message.as_deref().or(self.error.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_round_trip_through_paths() {
        for ep in Endpoint::ALL {
            assert_eq!(Endpoint::from_path(ep.path()), Some(ep));
        }
        assert_eq!(Endpoint::from_path("/halt"), None);
    }

    #[test]
    fn load_request_shape() {
        let req = LoadRequest {
            code: "MOV AX, 1".to_string(),
            segments: Segments {
                cs: 0,
                ds: 16,
                ss: 0,
                es: 0,
            },
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "code": "MOV AX, 1",
                "segments": {"cs": 0, "ds": 16, "ss": 0, "es": 0}
            })
        );
    }

    #[test]
    fn empty_request_is_an_empty_object() {
        assert_eq!(serde_json::to_string(&EmptyRequest {}).unwrap(), "{}");
    }

    #[test]
    fn sparse_responses_parse() {
        let resp: Response = serde_json::from_str(r#"{"logs": ["a", "b"]}"#).unwrap();
        assert_eq!(resp.logs.unwrap(), vec!["a", "b"]);
        assert!(resp.state.is_none());

        let resp: Response = serde_json::from_str(r#"{"message": "ok", "memory": [1, 2]}"#).unwrap();
        assert_eq!(resp.memory.unwrap(), vec![1, 2]);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let resp: Response =
            serde_json::from_str(r#"{"output": "programa carregado", "instructions": ""}"#).unwrap();
        assert_eq!(resp, Response::default());
    }

    #[test]
    fn failure_text_prefers_message() {
        let resp = Response {
            message: Some("bad".to_string()),
            error: Some("worse".to_string()),
            ..Response::default()
        };
        assert_eq!(resp.failure_text(), Some("bad"));
        assert_eq!(Response::error("worse").failure_text(), Some("worse"));
        assert_eq!(Response::default().failure_text(), None);
    }
}
