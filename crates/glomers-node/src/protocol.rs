//! Message envelope exchanged with the cluster harness.
//!
//! Every unit on the wire is a JSON object of the form
//!
//! ```json
//! {"src":"c1","dest":"n1","body":{"type":"echo","msg_id":7,"echo":"hi"}}
//! ```
//!
//! The body carries a type tag, optional message ids and any number of
//! workload-specific fields, which are kept flat next to the tag.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Opaque identifier of a cluster participant (`n1`, `c3`, ...).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Wraps a participant name.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrows the participant name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A decoded envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Sender.
    pub src: NodeId,
    /// Recipient.
    pub dest: NodeId,
    /// Payload.
    pub body: Body,
}

impl Message {
    /// Creates an envelope.
    pub fn new(src: impl Into<NodeId>, dest: impl Into<NodeId>, body: Body) -> Self {
        Self {
            src: src.into(),
            dest: dest.into(),
            body,
        }
    }

    /// The body's type tag.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.body.kind
    }

    /// Builds the reply to this message.
    ///
    /// Source and destination are swapped. When this message carries a
    /// `msg_id`, it becomes the reply's `in_reply_to`; otherwise the body is
    /// left as supplied.
    #[must_use]
    pub fn reply(&self, mut body: Body) -> Self {
        if let Some(msg_id) = self.body.msg_id {
            body.in_reply_to = Some(msg_id);
        }
        Self {
            src: self.dest.clone(),
            dest: self.src.clone(),
            body,
        }
    }
}

/// Message payload: a type tag, optional ids and free-form fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Body {
    /// Type tag used for dispatch.
    #[serde(rename = "type")]
    pub kind: String,
    /// Sender-assigned message id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg_id: Option<u64>,
    /// `msg_id` of the request this body answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<u64>,
    /// Workload-specific fields, serialised flat alongside `type`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Body {
    /// Creates a body with the given tag and no fields.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    /// Adds or replaces an extra field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    /// Extracts and deserialises an extra field.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::Missing`] when the field is absent and
    /// [`FieldError::Invalid`] when it has the wrong shape.
    pub fn field<T: DeserializeOwned>(&self, name: &str) -> Result<T, FieldError> {
        let value = self.extra.get(name).ok_or_else(|| FieldError::Missing {
            field: name.to_owned(),
        })?;
        T::deserialize(value).map_err(|source| FieldError::Invalid {
            field: name.to_owned(),
            source,
        })
    }
}

/// Failure to read a workload field out of a [`Body`].
#[derive(Debug, Error)]
pub enum FieldError {
    /// The field is not present.
    #[error("missing field `{field}`")]
    Missing {
        /// Field name.
        field: String,
    },
    /// The field is present but has the wrong type.
    #[error("invalid field `{field}`: {source}")]
    Invalid {
        /// Field name.
        field: String,
        /// Deserialisation failure.
        #[source]
        source: serde_json::Error,
    },
}
