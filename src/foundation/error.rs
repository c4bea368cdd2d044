/// Convenience result type used across the playout core.
pub type PlayoutResult<T> = Result<T, PlayoutError>;

/// Top-level error taxonomy used by mixer and decoder APIs.
#[derive(thiserror::Error, Debug)]
pub enum PlayoutError {
    /// Fatal at construction time: the stream or channel cannot be set up as configured.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The underlying decode primitive reported a failure for one packet.
    #[error("decode failed: {codec} returned {code}")]
    DecodeFailed {
        /// Codec long name.
        codec: String,
        /// Negative status code reported by the codec.
        code: i32,
    },

    /// A single mixer tick could not be composed.
    #[error("composition error: {0}")]
    Composition(String),

    /// Programmer error, such as writing into a read-only frame.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Invalid caller-provided data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PlayoutError {
    /// Build a [`PlayoutError::Configuration`] value.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Build a [`PlayoutError::DecodeFailed`] value.
    pub fn decode_failed(codec: impl Into<String>, code: i32) -> Self {
        Self::DecodeFailed {
            codec: codec.into(),
            code,
        }
    }

    /// Build a [`PlayoutError::Composition`] value.
    pub fn composition(msg: impl Into<String>) -> Self {
        Self::Composition(msg.into())
    }

    /// Build a [`PlayoutError::InvalidOperation`] value.
    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }

    /// Build a [`PlayoutError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
