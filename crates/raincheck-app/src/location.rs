//! Geolocation error surface and trigger-source labels.
//!
//! Device geolocation itself belongs to the UI shell; what the engine
//! side needs is the error taxonomy the shell reports in, each variant
//! with a remediation message steering the user toward map click or
//! manual entry.

use thiserror::Error;

/// Device-level geolocation failures.
#[derive(Debug, Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable")]
    Unavailable,
    #[error("Location request timed out")]
    Timeout,
    #[error("Location error: {0}")]
    Other(String),
}

impl LocationError {
    /// User-friendly remediation message for UI display.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::PermissionDenied => {
                "Geolocation was denied. Click the map or enter a location manually."
            }
            Self::Unavailable => {
                "Location information unavailable. Click the map or enter manually."
            }
            Self::Timeout => "Geolocation request timed out. Click the map or enter manually.",
            Self::Other(_) => {
                "An unknown error occurred while getting location. Enter a location manually."
            }
        }
    }
}

/// Where a trigger came from. Descriptive only; never affects
/// classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationSource {
    Device,
    MapClick,
    ManualEntry,
    Bookmark,
}

impl LocationSource {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Device => "device location",
            Self::MapClick => "map click",
            Self::ManualEntry => "manual entry",
            Self::Bookmark => "bookmarked URL",
        }
    }
}

impl std::fmt::Display for LocationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
