//! Per-node state handed to every handler.

use std::io::Write;

use glomers_id::{GeneratorError, SnowflakeGenerator, SnowflakeId};
use once_cell::sync::OnceCell;

use crate::codec::{CodecError, MessageWriter};
use crate::protocol::{Body, Message, NodeId};

/// Identity established by the `init` handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeState {
    node_id: NodeId,
    peer_ids: Vec<NodeId>,
}

impl NodeState {
    /// Creates the identity record.
    #[must_use]
    pub const fn new(node_id: NodeId, peer_ids: Vec<NodeId>) -> Self {
        Self { node_id, peer_ids }
    }

    /// This node's id.
    #[must_use]
    pub const fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    /// Every node in the cluster, in the order the harness listed them.
    #[must_use]
    pub fn peer_ids(&self) -> &[NodeId] {
        &self.peer_ids
    }
}

/// Everything a handler may touch: the reply channel, the id generator and
/// the node identity.
///
/// The identity is written once by the handshake and read-only afterwards.
pub struct NodeContext {
    generator: SnowflakeGenerator,
    state: OnceCell<NodeState>,
    outbox: MessageWriter<Box<dyn Write + Send>>,
}

impl NodeContext {
    pub(crate) fn new(generator: SnowflakeGenerator, output: Box<dyn Write + Send>) -> Self {
        Self {
            generator,
            state: OnceCell::new(),
            outbox: MessageWriter::new(output),
        }
    }

    /// Sends `body` as the reply to `request`.
    ///
    /// Source and destination are swapped and `in_reply_to` is filled from the
    /// request's `msg_id`. The reply is written and flushed before returning.
    ///
    /// # Errors
    ///
    /// Returns an error if the reply cannot be serialised or written.
    pub fn reply(&mut self, request: &Message, body: Body) -> Result<(), CodecError> {
        self.outbox.write_message(&request.reply(body))
    }

    /// Issues a cluster-unique identifier.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::TimestampOutOfRange`] when the clock is
    /// outside the generator's window.
    pub fn generate_id(&self) -> Result<SnowflakeId, GeneratorError> {
        self.generator.generate()
    }

    /// The identity, once the handshake has completed.
    #[must_use]
    pub fn state(&self) -> Option<&NodeState> {
        self.state.get()
    }

    /// Whether the handshake has completed.
    #[must_use]
    pub fn is_initialised(&self) -> bool {
        self.state.get().is_some()
    }

    /// This node's id, once known.
    #[must_use]
    pub fn node_id(&self) -> Option<&NodeId> {
        self.state().map(NodeState::node_id)
    }

    /// Cluster membership; empty before the handshake.
    #[must_use]
    pub fn peer_ids(&self) -> &[NodeId] {
        self.state().map(NodeState::peer_ids).unwrap_or_default()
    }

    /// Records the identity. Hands `state` back if one is already set.
    pub(crate) fn initialise(&self, state: NodeState) -> Result<(), NodeState> {
        self.state.set(state)
    }
}
