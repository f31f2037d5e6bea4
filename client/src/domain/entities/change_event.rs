//! Realtime change events
//!
//! Row-level changes pushed by the realtime feed, shaped as
//! `{eventType, new, old}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::post::Post;

/// Kind of row change
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
    /// Anything the feed sends that we do not know about
    Other(String),
}

impl From<String> for ChangeKind {
    fn from(s: String) -> Self {
        match s.to_uppercase().as_str() {
            "INSERT" => ChangeKind::Insert,
            "UPDATE" => ChangeKind::Update,
            "DELETE" => ChangeKind::Delete,
            _ => ChangeKind::Other(s),
        }
    }
}

impl From<ChangeKind> for String {
    fn from(kind: ChangeKind) -> Self {
        kind.to_string()
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeKind::Insert => write!(f, "INSERT"),
            ChangeKind::Update => write!(f, "UPDATE"),
            ChangeKind::Delete => write!(f, "DELETE"),
            ChangeKind::Other(s) => write!(f, "{}", s),
        }
    }
}

/// A single change on a subscribed table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    #[serde(rename = "eventType")]
    pub event_type: ChangeKind,
    #[serde(default)]
    pub new: Option<Value>,
    #[serde(default)]
    pub old: Option<Value>,
}

impl ChangeEvent {
    #[cfg(test)]
    pub fn insert(row: Value) -> Self {
        Self {
            event_type: ChangeKind::Insert,
            new: Some(row),
            old: None,
        }
    }

    /// The inserted row, if this is an insert carrying a non-null `id`
    pub fn inserted_row(&self) -> Option<&Value> {
        if self.event_type != ChangeKind::Insert {
            return None;
        }
        self.new
            .as_ref()
            .filter(|row| row.get("id").is_some_and(|id| !id.is_null()))
    }

    /// Decode the inserted row as a post. `None` for anything else.
    pub fn inserted_post(&self) -> Option<Result<Post, serde_json::Error>> {
        self.inserted_row()
            .map(|row| serde_json::from_value(row.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn change_kind_round_trips_unknown_values() {
        let kind = ChangeKind::from("TRUNCATE".to_string());
        assert_eq!(kind, ChangeKind::Other("TRUNCATE".to_string()));
        assert_eq!(kind.to_string(), "TRUNCATE");
        assert_eq!(ChangeKind::from("insert".to_string()), ChangeKind::Insert);
    }

    #[test]
    fn inserted_row_requires_insert_kind() {
        let event = ChangeEvent {
            event_type: ChangeKind::Update,
            new: Some(json!({ "id": 1 })),
            old: Some(json!({ "id": 1 })),
        };
        assert!(event.inserted_row().is_none());
    }

    #[test]
    fn inserted_row_requires_id() {
        assert!(ChangeEvent::insert(json!({ "body": "x" })).inserted_row().is_none());
        assert!(ChangeEvent::insert(json!({ "id": null })).inserted_row().is_none());
        assert!(ChangeEvent::insert(json!({ "id": 0 })).inserted_row().is_some());
    }

    #[test]
    fn deserializes_payload_shape() {
        let event: ChangeEvent = serde_json::from_value(json!({
            "eventType": "DELETE",
            "new": {},
            "old": { "id": 3 }
        }))
        .unwrap();
        assert_eq!(event.event_type, ChangeKind::Delete);
        assert!(event.inserted_post().is_none());
    }
}
