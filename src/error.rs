use thiserror::Error;

pub type Result<T> = std::result::Result<T, PaymentError>;

/// Errors produced by the payment core.
///
/// Messages must never carry secret key material, the raw signing payload,
/// or a computed signature.
#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Gateway error {code:?}: {message}")]
    GatewayError {
        code: Option<String>,
        message: String,
    },

    /// The gateway call exceeded its deadline. The payment must be left
    /// `pending` for reconciliation, not marked failed.
    #[error("Gateway timeout: {0}")]
    TimeoutError(String),

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Not found: {0}")]
    NotFoundError(String),

    #[error("State conflict: {0}")]
    StateConflictError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    StorageError(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl From<reqwest::Error> for PaymentError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            // Strip the URL: error text may end up in user-facing responses.
            PaymentError::TimeoutError("gateway request deadline exceeded".to_string())
        } else {
            PaymentError::TransportError(e.without_url().to_string())
        }
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for PaymentError {
    fn from(e: rocksdb::Error) -> Self {
        PaymentError::StorageError(Box::new(e))
    }
}
