//! Error types for Screenwise

use thiserror::Error;

/// Errors returned by every Screenwise operation
#[derive(Debug, Error)]
pub enum WellnessError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Challenge is not active")]
    ChallengeNotActive,

    #[error("No screen time data available for baseline")]
    NoBaseline,

    #[error("No participants in this challenge")]
    NoParticipants,

    #[error("Music account token expired")]
    MusicTokenExpired,

    #[error("No playlists found for category: {0}")]
    NoPlaylists(String),

    #[error("Music provider error: {0}")]
    MusicProvider(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl WellnessError {
    /// HTTP status a REST front end answers with for this error
    ///
    /// Duplicate registrations and repeated challenge joins are `Conflict`
    /// and map to 409 rather than a generic 400.
    pub fn status_code(&self) -> u16 {
        match self {
            WellnessError::InvalidInput(_)
            | WellnessError::ChallengeNotActive
            | WellnessError::NoBaseline
            | WellnessError::NoParticipants => 400,
            WellnessError::MusicTokenExpired => 401,
            WellnessError::Forbidden(_) => 403,
            WellnessError::NotFound(_) | WellnessError::NoPlaylists(_) => 404,
            WellnessError::Conflict(_) => 409,
            WellnessError::MusicProvider(_) => 502,
            WellnessError::JsonError(_) | WellnessError::Io(_) | WellnessError::Config(_) => 500,
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        WellnessError::InvalidInput(msg.into())
    }

    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        WellnessError::NotFound(what.into())
    }
}
