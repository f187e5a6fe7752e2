use serde::{Deserialize, Serialize};

/// Error envelope returned by the backend on non-success responses.
///
/// ```json
/// {"data": null, "error": {"status": 400, "name": "ValidationError", "message": "..."}}
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub error: Option<BackendError>,
}

impl ErrorEnvelope {
    /// The human readable message, if the backend supplied a non-empty one.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.error
            .as_ref()
            .and_then(|error| error.message.as_deref())
            .filter(|message| !message.trim().is_empty())
    }
}

/// Error details reported by the backend.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct BackendError {
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.name, &self.message) {
            (Some(name), Some(message)) => write!(f, "{name}: {message}"),
            (None, Some(message)) => write!(f, "{message}"),
            (Some(name), None) => write!(f, "{name}"),
            (None, None) => write!(f, "unknown backend error"),
        }
    }
}
