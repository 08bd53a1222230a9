//! Error types for message handling and the run loop.

use glomers_id::GeneratorError;
use thiserror::Error;

use crate::codec::CodecError;
use crate::protocol::FieldError;

/// Failure reported by a message handler.
///
/// Handler failures are logged and the loop continues.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// A required body field was missing or had the wrong type.
    #[error(transparent)]
    Field(#[from] FieldError),

    /// The identifier generator could not issue an id.
    #[error("failed to generate id: {0}")]
    Generate(#[from] GeneratorError),

    /// The reply could not be written.
    #[error("failed to send reply: {0}")]
    Reply(#[from] CodecError),

    /// The handler refused the request.
    #[error("request rejected: {message}")]
    Rejected {
        /// Reason shown in diagnostics.
        message: String,
    },
}

impl HandlerError {
    /// Creates a rejection with the given reason.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }
}

/// Unrecoverable failure while processing the `init` handshake.
#[derive(Debug, Error)]
pub enum HandshakeError {
    /// `node_id` or `node_ids` was missing or malformed.
    #[error("invalid init message: {0}")]
    Field(#[from] FieldError),

    /// The `init_ok` acknowledgement could not be written.
    #[error("failed to acknowledge init: {0}")]
    Reply(#[source] CodecError),
}

/// Reasons [`crate::Node::run`] stops before the input is exhausted.
#[derive(Debug, Error)]
pub enum RunError {
    /// The handshake failed; the node has no usable identity.
    #[error(transparent)]
    Handshake(#[from] HandshakeError),

    /// Reading the input stream failed.
    #[error("failed to read input: {0}")]
    Input(#[source] CodecError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handshake_errors_name_the_missing_field() {
        let error = RunError::from(HandshakeError::from(FieldError::Missing {
            field: "node_id".to_owned(),
        }));
        assert_eq!(
            error.to_string(),
            "invalid init message: missing field `node_id`"
        );
    }

    #[test]
    fn rejected_errors_carry_their_reason() {
        let error = HandlerError::rejected("no capacity");
        assert_eq!(error.to_string(), "request rejected: no capacity");
    }

    #[test]
    fn field_errors_display_transparently() {
        let error = HandlerError::from(FieldError::Missing {
            field: "message".to_owned(),
        });
        assert_eq!(error.to_string(), "missing field `message`");
    }
}
