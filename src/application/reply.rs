//! Shape guard for JSON replies from the console endpoints.

use serde::Deserialize;
use serde_json::Value;

/// Body of a reply, classified before anything is shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyBody {
    /// Well-formed JSON. `error` holds the application-level error field when
    /// it is a non-empty string.
    Json { error: Option<String> },
    /// The body could not be parsed as JSON.
    Malformed { reason: String },
}

#[derive(Deserialize)]
struct ErrorField {
    error: Option<Value>,
}

impl ReplyBody {
    pub fn parse(bytes: &[u8]) -> Self {
        let value: Value = match serde_json::from_slice(bytes) {
            Ok(value) => value,
            Err(err) => {
                return Self::Malformed {
                    reason: err.to_string(),
                };
            }
        };

        let error = serde_json::from_value::<ErrorField>(value)
            .ok()
            .and_then(|body| body.error)
            .and_then(|error| match error {
                Value::String(text) if !text.is_empty() => Some(text),
                _ => None,
            });

        Self::Json { error }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Json { error } => error.as_deref(),
            Self::Malformed { .. } => None,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }
}
