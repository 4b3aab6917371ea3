//! Machine state as the renderer and the wire see it
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Register, flag and memory state of a machine.
///
/// Local machines fill this in from their own state, remote backends send it as
/// JSON. Only `registers` is always meaningful; a backend may omit any of the
/// other fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    #[serde(default)]
    pub registers: BTreeMap<String, i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<BTreeMap<String, i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<Vec<i64>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerates_missing_fields() {
        let snapshot: StateSnapshot = serde_json::from_str(r#"{"registers": {"ax": 3}}"#).unwrap();
        assert_eq!(snapshot.registers["ax"], 3);
        assert!(snapshot.flags.is_none());
        assert!(snapshot.ip.is_none());
        assert!(snapshot.memory.is_none());

        let empty: StateSnapshot = serde_json::from_str("{}").unwrap();
        assert!(empty.registers.is_empty());
    }

    #[test]
    fn reads_full_backend_state() {
        let json = r#"{
            "registers": {"ax": 15, "bx": 0, "cs": 16},
            "flags": {"ZF": 0, "SF": 1},
            "ip": 4,
            "memory": [15, 0, 0, 0]
        }"#;
        let snapshot: StateSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.flags.unwrap()["SF"], 1);
        assert_eq!(snapshot.ip, Some(4));
        assert_eq!(snapshot.memory.unwrap().len(), 4);
    }
}
