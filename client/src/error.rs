//! Unified error types for the Hollow Mates client
//!
//! This module defines error types for each layer:
//! - `DomainError`: Core screen logic errors
//! - `BackendError`: Supabase REST / auth API errors
//! - `RealtimeError`: Realtime channel errors
//! - `AppError`: Application layer errors (wraps the others for the front end)

use thiserror::Error;

/// Domain layer errors - pure screen logic errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Not signed in")]
    NotSignedIn,
}

/// Supabase REST and auth API errors
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Row not found: {0}")]
    NotFound(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Unauthorized - invalid or expired token")]
    Unauthorized,

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

/// Realtime channel errors
#[derive(Debug, Error)]
pub enum RealtimeError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Channel join rejected: {0}")]
    JoinRejected(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Channel closed")]
    Closed,
}

/// Application layer errors - surfaced to the front end
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Realtime error: {0}")]
    Realtime(#[from] RealtimeError),

    #[error("Sign out failed: {0}")]
    SignOut(String),
}

impl AppError {
    /// Whether the error came from talking to the backend (as opposed to local state)
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            AppError::Backend(_) | AppError::Realtime(_) | AppError::SignOut(_)
        )
    }
}

/// Parse error for terminal commands
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Empty command")]
    Empty,
}
