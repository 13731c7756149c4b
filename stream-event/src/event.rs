//! Event types of the adventure stream (type + payload).
//!
//! Every event is a JSON object whose `type` field names the variant. Unknown extra fields
//! are ignored, so a backend may attach snapshots (e.g. a `conversation` array) without
//! breaking older clients.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One server event.
///
/// Within one stream, `chunk` events of a step always precede that step's terminal event
/// (`done`, `step_done`, or `complete`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Incremental narration text. `choice` names the player's selected action.
    Chunk {
        #[serde(default)]
        content: String,
        #[serde(
            default,
            skip_serializing_if = "Option::is_none",
            deserialize_with = "choice_text"
        )]
        choice: Option<String>,
    },
    /// One manual step (or the opening scene) finished.
    Done {
        step: u32,
        #[serde(default)]
        complete: bool,
    },
    /// One iteration of a server-streamed autoplay finished.
    StepDone { step: u32 },
    /// A server-streamed autoplay run finished.
    Complete { step: u32 },
    /// Informational line; no transcript effect.
    Status { message: String },
    /// The operation failed; nothing else follows on this stream.
    Error { message: String },
}

impl StreamEvent {
    /// Builds a content chunk without a choice.
    pub fn chunk(content: impl Into<String>) -> Self {
        StreamEvent::Chunk {
            content: content.into(),
            choice: None,
        }
    }

    /// Builds a content chunk carrying the player's choice.
    pub fn chunk_with_choice(content: impl Into<String>, choice: impl Into<String>) -> Self {
        StreamEvent::Chunk {
            content: content.into(),
            choice: Some(choice.into()),
        }
    }

    /// Wire name of the variant (the `type` field).
    pub fn kind(&self) -> &'static str {
        match self {
            StreamEvent::Chunk { .. } => "chunk",
            StreamEvent::Done { .. } => "done",
            StreamEvent::StepDone { .. } => "step_done",
            StreamEvent::Complete { .. } => "complete",
            StreamEvent::Status { .. } => "status",
            StreamEvent::Error { .. } => "error",
        }
    }

    /// True for events that close a step (`done`, `step_done`, `complete`).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StreamEvent::Done { .. } | StreamEvent::StepDone { .. } | StreamEvent::Complete { .. }
        )
    }

    /// Serializes this event to a JSON object.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// The original backend sends the chosen option as a number; newer ones send text.
fn choice_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "choice must be a string or a number, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::StreamEvent;
    use serde_json::json;

    #[test]
    fn chunk_without_choice_omits_field() {
        let value = StreamEvent::chunk("The gate creaks.").to_value().unwrap();
        assert_eq!(value["type"], "chunk");
        assert_eq!(value["content"], "The gate creaks.");
        assert!(value.get("choice").is_none());
    }

    #[test]
    fn numeric_choice_is_read_as_text() {
        let ev: StreamEvent =
            serde_json::from_value(json!({"type":"chunk","content":"","choice":3})).unwrap();
        assert_eq!(ev, StreamEvent::chunk_with_choice("", "3"));
    }

    #[test]
    fn null_choice_is_none() {
        let ev: StreamEvent =
            serde_json::from_value(json!({"type":"chunk","content":"x","choice":null})).unwrap();
        assert_eq!(ev, StreamEvent::chunk("x"));
    }

    #[test]
    fn done_without_complete_defaults_to_false() {
        let ev: StreamEvent = serde_json::from_str(r#"{"type":"done","step":1}"#).unwrap();
        assert_eq!(
            ev,
            StreamEvent::Done {
                step: 1,
                complete: false
            }
        );
        assert!(ev.is_terminal());
    }

    #[test]
    fn extra_fields_are_ignored() {
        let ev: StreamEvent = serde_json::from_value(json!({
            "type": "chunk",
            "content": "A",
            "choice": "go north",
            "conversation": [{"role": "user", "content": "go north"}]
        }))
        .unwrap();
        assert_eq!(ev, StreamEvent::chunk_with_choice("A", "go north"));
    }

    #[test]
    fn step_done_uses_snake_case_tag() {
        let value = StreamEvent::StepDone { step: 4 }.to_value().unwrap();
        assert_eq!(value["type"], "step_done");
        assert_eq!(StreamEvent::StepDone { step: 4 }.kind(), "step_done");
    }

    #[test]
    fn object_choice_is_rejected() {
        let r = serde_json::from_value::<StreamEvent>(
            json!({"type":"chunk","content":"","choice":{"n":1}}),
        );
        assert!(r.is_err());
    }
}
