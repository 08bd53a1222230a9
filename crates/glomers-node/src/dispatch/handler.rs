//! The handler seam between the dispatch loop and workloads.

use crate::protocol::Message;

use super::context::NodeContext;
use super::errors::HandlerError;

/// Processes messages of one type tag.
///
/// Handlers receive the node context explicitly and answer through
/// [`NodeContext::reply`]. Closures with the matching signature implement
/// the trait, which is what [`crate::Node::register_fn`] relies on.
pub trait Handler: Send {
    /// Handles one decoded message.
    ///
    /// # Errors
    ///
    /// Returning an error drops the message; the loop logs it and moves on.
    fn handle(&mut self, ctx: &mut NodeContext, message: &Message) -> Result<(), HandlerError>;
}

impl<F> Handler for F
where
    F: FnMut(&mut NodeContext, &Message) -> Result<(), HandlerError> + Send,
{
    fn handle(&mut self, ctx: &mut NodeContext, message: &Message) -> Result<(), HandlerError> {
        self(ctx, message)
    }
}
