//! Message dispatch for a single cluster node.
//!
//! [`Node`] owns a [`HandlerRegistry`] and a [`NodeContext`]. Its run loop
//! decodes one inbound message at a time, routes it by type tag and hands
//! the context to the matching [`Handler`], which answers through
//! [`NodeContext::reply`].
//!
//! ## Handshake
//!
//! The first `init` message carries the node's own id and the cluster
//! membership:
//!
//! ```json
//! {"src":"c0","dest":"n1","body":{"type":"init","msg_id":1,"node_id":"n1","node_ids":["n1","n2"]}}
//! ```
//!
//! The engine always handles `init` itself, stores the identity once and
//! answers `init_ok`. A handshake without a string `node_id` or a string
//! array `node_ids` is fatal: [`Node::run`] stops with
//! [`RunError::Handshake`].
//!
//! ## Failure policy
//!
//! Malformed input, unknown type tags and handler failures are logged and
//! the message is dropped; the loop carries on with the next message. No
//! error reply is sent to the requester.

mod context;
mod errors;
mod handler;
mod handshake;
mod node;
mod registry;

pub use context::{NodeContext, NodeState};
pub use errors::{HandlerError, HandshakeError, RunError};
pub use handler::Handler;
pub use node::{INIT_OK_TYPE, INIT_TYPE, Node, RunSummary};
pub use registry::HandlerRegistry;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = "glomers_node::dispatch";
