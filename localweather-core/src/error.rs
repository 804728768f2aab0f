//! Error types for the acquisition cycle.
//!
//! Each component has its own error so the controller can tell a halted cycle
//! (denied permission) from a degraded one (empty geocode) or a failed fetch.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("Reverse geocoding returned no candidates")]
    Empty,

    #[error("Reverse geocoding request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Reverse geocoding failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse reverse geocoding response: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Weather request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Weather request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse weather response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Weather response contained no forecast entries")]
    NoEntries,
}

impl LocationError {
    /// Short message suitable for the screen.
    pub fn user_message(&self) -> &'static str {
        match self {
            LocationError::PermissionDenied => "Location access was not granted.",
            LocationError::Unavailable(_) => "Your location could not be determined.",
        }
    }
}

impl FetchError {
    pub fn user_message(&self) -> &'static str {
        match self {
            FetchError::Request(_) => "Could not reach the weather service.",
            FetchError::Status { status: 401, .. } => "The weather API key was rejected.",
            FetchError::Status { .. } => "The weather service returned an error.",
            FetchError::Parse(_) | FetchError::NoEntries => {
                "The weather service sent an unexpected response."
            }
        }
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
