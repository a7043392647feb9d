//! Error types for the ThinkFirst domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each external collaborator has its own error enum; the classifier and
//! prompt builder are total and have none.

use thiserror::Error;

/// The top-level error type for ThinkFirst operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Real-time data errors ---
    #[error("Real-time data error: {0}")]
    Realtime(#[from] RealtimeError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures of the text-generation service.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failures of a weather or news source.
///
/// These never fail a turn: the caller drops the real-time block instead.
#[derive(Debug, Clone, Error)]
pub enum RealtimeError {
    #[error("Source not configured: {0}")]
    NotConfigured(String),

    #[error("Request to {source_name} failed: {reason}")]
    Request { source_name: String, reason: String },

    #[error("{source_name} returned status {status_code}: {message}")]
    Upstream {
        source_name: String,
        status_code: u16,
        message: String,
    },

    #[error("Malformed payload from {source_name}: {reason}")]
    Malformed { source_name: String, reason: String },
}
