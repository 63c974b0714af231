use thiserror::Error;

use crate::core::data::Data;

/// Error raised when a value cannot be turned into response text.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SerializationError {
    /// NaN or infinity has no JSON representation
    #[error("Cannot encode non-finite number {0}")]
    NonFiniteNumber(f64),

    /// Nesting deeper than the limit, usually an object that yields itself
    #[error("Maximum nesting depth of {0} exceeded")]
    DepthExceeded(usize),

    #[error("JSON encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("External serializer failed: {0}")]
    External(String),
}

/// Result type alias for serialization
pub type SerializationResult<T> = Result<T, SerializationError>;

/// SerializerAdapter defines the port for rendering response data into wire text.
///
/// Implementations hold no per-request state and must return the same text for
/// the same input.
pub trait SerializerAdapter: Send + Sync {
    /// Serialize `data` into a JSON string
    ///
    /// # Arguments
    /// * `data` - The value to render, usually a response envelope
    /// * `groups` - Active visibility groups; `None` when none were configured
    fn serialize(&self, data: &Data, groups: Option<&[String]>) -> SerializationResult<String>;
}
