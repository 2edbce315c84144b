use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Conversion error for field '{field}': {reason}")]
    ConversionError { field: String, reason: String },

    #[error("Attribute update rejected with status {status}: {body}")]
    UpdateRejected { status: u16, body: String },

    #[error("Attribute store unavailable: {0}")]
    AttributeStoreUnavailable(String),

    #[error("Message source error: {0}")]
    MessageSourceError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl DomainError {
    /// Errors caused by the payload itself, as opposed to the downstream store
    pub fn is_payload_error(&self) -> bool {
        matches!(
            self,
            DomainError::ParseError(_) | DomainError::ConversionError { .. }
        )
    }
}
