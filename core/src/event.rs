//! Semantic events that hosts publish to choreograph transient actors.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while decoding a semantic event payload.
#[derive(Debug, Error)]
pub enum EventError {
    /// The payload did not match any known event shape.
    #[error("malformed event payload: {0}")]
    Malformed(#[from] serde_json::Error),
    /// A search event arrived without a query.
    #[error("search events require a non-empty query")]
    EmptyQuery,
    /// The timestamp was present but not a non-negative integer.
    #[error("event timestamp must be a non-negative integer")]
    InvalidTimestamp,
}

/// Kind of content referenced by publish and upload events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// A stored artifact.
    Artifact,
    /// A reusable template.
    Template,
    /// A text snippet.
    Snippet,
    /// A raw file.
    File,
}

/// Authentication method reported by login events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginMethod {
    /// Third-party OAuth sign-in.
    Oauth,
    /// Password sign-in.
    Password,
    /// Enterprise single sign-on.
    Sso,
}

/// Alert flavours understood by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    /// Sends an ambulance across the street.
    Ambulance,
}

/// Payload of a semantic event, discriminated by its `type` field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CityEventKind {
    /// The user ran a search.
    Search {
        /// Search text; must not be empty.
        query: String,
    },
    /// The command palette was opened.
    CommandPaletteOpen {
        /// Surface that opened the palette.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        origin: Option<String>,
    },
    /// Content was published.
    Publish {
        /// Kind of content that was published.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        kind: Option<ContentKind>,
    },
    /// Content was uploaded.
    Upload {
        /// Kind of content that was uploaded.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        kind: Option<ContentKind>,
    },
    /// The user signed in.
    Login {
        /// Method used to sign in.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        method: Option<LoginMethod>,
    },
    /// An alert was raised.
    Alert {
        /// Flavour of alert.
        kind: AlertKind,
    },
}

impl CityEventKind {
    /// Discriminant used for throttling and logging.
    #[must_use]
    pub const fn event_type(&self) -> EventType {
        match self {
            CityEventKind::Search { .. } => EventType::Search,
            CityEventKind::CommandPaletteOpen { .. } => EventType::CommandPaletteOpen,
            CityEventKind::Publish { .. } => EventType::Publish,
            CityEventKind::Upload { .. } => EventType::Upload,
            CityEventKind::Login { .. } => EventType::Login,
            CityEventKind::Alert { .. } => EventType::Alert,
        }
    }
}

/// Discriminant of a [`CityEventKind`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventType {
    /// See [`CityEventKind::Search`].
    Search,
    /// See [`CityEventKind::CommandPaletteOpen`].
    CommandPaletteOpen,
    /// See [`CityEventKind::Publish`].
    Publish,
    /// See [`CityEventKind::Upload`].
    Upload,
    /// See [`CityEventKind::Login`].
    Login,
    /// See [`CityEventKind::Alert`].
    Alert,
}

impl EventType {
    /// Wire name of the event type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            EventType::Search => "search",
            EventType::CommandPaletteOpen => "command_palette_open",
            EventType::Publish => "publish",
            EventType::Upload => "upload",
            EventType::Login => "login",
            EventType::Alert => "alert",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic event with an optional timestamp in milliseconds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CityEvent {
    /// Event payload.
    pub kind: CityEventKind,
    /// Milliseconds since the Unix epoch; filled from the clock when absent.
    pub ts: Option<u64>,
}

impl CityEvent {
    /// Creates an event without a timestamp.
    #[must_use]
    pub const fn new(kind: CityEventKind) -> Self {
        Self { kind, ts: None }
    }

    /// Returns the event stamped with the provided timestamp.
    #[must_use]
    pub fn at(self, ts: u64) -> Self {
        Self {
            ts: Some(ts),
            ..self
        }
    }

    /// Discriminant used for throttling and logging.
    #[must_use]
    pub const fn event_type(&self) -> EventType {
        self.kind.event_type()
    }

    /// Decodes and validates an event from an untyped JSON payload.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, EventError> {
        let ts = match value.get("ts") {
            None | Some(serde_json::Value::Null) => None,
            Some(raw) => Some(raw.as_u64().ok_or(EventError::InvalidTimestamp)?),
        };
        let event = Self {
            kind: CityEventKind::deserialize(value)?,
            ts,
        };
        event.validate()?;
        Ok(event)
    }

    /// Checks payload constraints that the type system does not encode.
    pub fn validate(&self) -> Result<(), EventError> {
        match &self.kind {
            CityEventKind::Search { query } if query.is_empty() => Err(EventError::EmptyQuery),
            _ => Ok(()),
        }
    }

    /// Encodes the event back into its wire representation.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(&self.kind).unwrap_or(serde_json::Value::Null);
        if let (Some(ts), Some(map)) = (self.ts, value.as_object_mut()) {
            let _ = map.insert("ts".to_owned(), serde_json::Value::from(ts));
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_every_event_shape() {
        let cases = [
            (json!({ "type": "search", "query": "city" }), EventType::Search),
            (json!({ "type": "command_palette_open" }), EventType::CommandPaletteOpen),
            (json!({ "type": "publish", "kind": "artifact" }), EventType::Publish),
            (json!({ "type": "upload", "kind": "file", "ts": 2600 }), EventType::Upload),
            (json!({ "type": "login", "method": "sso" }), EventType::Login),
            (json!({ "type": "alert", "kind": "ambulance", "ts": 1 }), EventType::Alert),
        ];
        for (payload, expected) in cases {
            let event = CityEvent::from_json(&payload).expect("event parses");
            assert_eq!(event.event_type(), expected);
        }
    }

    #[test]
    fn keeps_optional_timestamp() {
        let event = CityEvent::from_json(&json!({ "type": "alert", "kind": "ambulance", "ts": 42 }))
            .expect("parses");
        assert_eq!(event.ts, Some(42));
        assert_eq!(event.to_json()["ts"], json!(42));
    }

    #[test]
    fn rejects_malformed_payloads() {
        let malformed = [
            json!({ "type": "search" }),
            json!({ "type": "search", "query": "" }),
            json!({ "type": "unknown", "ts": 1 }),
            json!({ "type": "alert", "kind": "fire" }),
            json!({ "type": "publish", "kind": "video" }),
            json!({ "type": "login", "method": "magic" }),
            json!({ "type": "upload", "ts": -5 }),
            json!({ "type": "upload", "ts": 1.5 }),
            json!("search"),
        ];
        for payload in malformed {
            assert!(CityEvent::from_json(&payload).is_err(), "{payload} should be rejected");
        }
    }

    #[test]
    fn empty_query_is_reported_distinctly() {
        let error = CityEvent::from_json(&json!({ "type": "search", "query": "" })).unwrap_err();
        assert!(matches!(error, EventError::EmptyQuery));
    }
}
