//! Engine-specific error types.

use thiserror::Error;

use crate::types::DrynessTier;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("coordinate out of range: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-success HTTP status. The message is the upstream body's
    /// `reason` field verbatim when one was present, otherwise a generic
    /// "request failed with status <code>" line.
    #[error("{0}")]
    Upstream(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl EngineError {
    /// User-friendly error message for UI display.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidCoordinate { .. } => {
                "Invalid latitude or longitude. Latitude: -90 to 90, Longitude: -180 to 180."
                    .to_string()
            }
            Self::Network(_) => "Network error. Check your connection.".to_string(),
            Self::Upstream(msg) => format!("Weather service error: {}", msg),
            Self::MalformedResponse(_) => {
                "Could not retrieve valid precipitation data for this location.".to_string()
            }
        }
    }

    /// The dryness tier a failure degrades to. Every error still yields a
    /// renderable tier so the visual indicator never desyncs.
    pub fn tier(&self) -> DrynessTier {
        DrynessTier::Unknown
    }

    /// Whether the error was caught locally, before any network activity.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::InvalidCoordinate { .. })
    }
}
