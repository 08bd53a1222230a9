//! Error types for message framing and encoding.

use std::io;

use thiserror::Error;

/// Errors raised while reading or writing messages.
#[derive(Debug, Error)]
pub enum CodecError {
    /// An inbound unit is not a valid message.
    #[error("malformed message: {message}")]
    Malformed {
        /// Description of the problem.
        message: String,
        /// Parser error, when one is available.
        #[source]
        source: Option<serde_json::Error>,
    },

    /// An inbound object exceeded the configured size limit.
    #[error("message too large: {size} bytes exceeds {max_size} byte limit")]
    FrameTooLarge {
        /// Observed size of the object in bytes.
        size: usize,
        /// Configured limit.
        max_size: usize,
    },

    /// The underlying stream failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// An outbound message could not be serialised.
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),
}

impl CodecError {
    /// Whether the decoder can carry on with the next unit after this error.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Malformed { .. } | Self::FrameTooLarge { .. })
    }

    /// Creates a malformed-message error from a parser failure.
    #[must_use]
    pub fn from_json_error(source: serde_json::Error) -> Self {
        Self::Malformed {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Creates a malformed-message error with a custom description.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
            source: None,
        }
    }

    /// Classifies a serialisation failure; write errors surface as [`Self::Io`].
    #[must_use]
    pub fn from_encode_error(source: serde_json::Error) -> Self {
        if source.is_io() {
            Self::Io(io::Error::from(source))
        } else {
            Self::Encode(source)
        }
    }
}
