use thinkfirst_core::error::ProviderError;

/// Errors from a tutoring turn or a memory check.
#[derive(Debug, thiserror::Error)]
pub enum TutorError {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Model reply could not be parsed: {reason}")]
    MalformedReply { reason: String },
}

impl TutorError {
    /// Short, user-safe description of the upstream failure.
    pub fn detail(&self) -> String {
        match self {
            Self::Provider(e) => e.to_string(),
            Self::MalformedReply { reason } => reason.clone(),
        }
    }
}

