//! Error types for the structured response protocol

/// Why a structured response was rejected.
///
/// Every variant rejects the whole response; nothing is accepted piecemeal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The text holds no well-formed response container
    #[error("format error: {0}")]
    Format(String),

    /// The container parsed but breaks a field rule
    #[error("validation error: {0}")]
    Validation(String),
}

impl ProtocolError {
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ProtocolError::Validation(_))
    }

    pub fn message(&self) -> &str {
        match self {
            ProtocolError::Format(message) | ProtocolError::Validation(message) => message,
        }
    }
}
