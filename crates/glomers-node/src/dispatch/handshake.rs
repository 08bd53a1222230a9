//! The engine-owned `init` handler.

use tracing::{info, warn};

use crate::protocol::{Body, Message, NodeId};

use super::DISPATCH_TARGET;
use super::context::{NodeContext, NodeState};
use super::errors::HandshakeError;
use super::node::INIT_OK_TYPE;

/// Validates an `init` message, records the identity and acknowledges it.
///
/// A repeated handshake is acknowledged again but never overwrites the
/// identity recorded by the first one.
pub(crate) fn perform(ctx: &mut NodeContext, message: &Message) -> Result<(), HandshakeError> {
    let node_id: NodeId = message.body.field("node_id")?;
    let peer_ids: Vec<NodeId> = message.body.field("node_ids")?;
    let peer_count = peer_ids.len();

    let first = match ctx.initialise(NodeState::new(node_id, peer_ids)) {
        Ok(()) => true,
        Err(ignored) => {
            warn!(
                target: DISPATCH_TARGET,
                requested = %ignored.node_id(),
                current = ?ctx.node_id().map(NodeId::as_str),
                "node already initialised; keeping existing identity"
            );
            false
        }
    };

    ctx.reply(message, Body::new(INIT_OK_TYPE))
        .map_err(HandshakeError::Reply)?;

    if first {
        info!(
            target: DISPATCH_TARGET,
            node_id = ?ctx.node_id().map(NodeId::as_str),
            peers = peer_count,
            "node initialised"
        );
    }
    Ok(())
}
