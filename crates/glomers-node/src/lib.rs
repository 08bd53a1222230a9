//! Runtime for one node of a message-passing cluster exercise.
//!
//! The harness talks to the node over two byte streams: JSON requests arrive
//! on standard input and JSON replies leave on standard output. Diagnostics
//! go to standard error through `tracing`.
//!
//! ```text
//! stdin ──► MessageDecoder ──► Node::run ──► Handler ──► NodeContext::reply ──► MessageWriter ──► stdout
//!                                             │
//!                                             └──► NodeContext::generate_id (SnowflakeGenerator)
//! ```
//!
//! The node answers the `init` handshake itself. Everything else is routed
//! to handlers registered by type tag; the bundled [`workloads`] cover the
//! echo, unique-id and single-node broadcast exercises.

pub mod codec;
mod dispatch;
pub mod protocol;
pub mod telemetry;
pub mod workloads;

pub use codec::{CodecError, MessageDecoder, MessageWriter};
pub use dispatch::{
    Handler, HandlerError, HandlerRegistry, HandshakeError, INIT_OK_TYPE, INIT_TYPE, Node,
    NodeContext, NodeState, RunError, RunSummary,
};
pub use protocol::{Body, FieldError, Message, NodeId};
pub use telemetry::{TelemetryError, TelemetryHandle};

#[cfg(test)]
mod tests;
