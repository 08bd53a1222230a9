//! Single-node broadcast bookkeeping.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::dispatch::{Handler, HandlerError, NodeContext};
use crate::protocol::{Body, Message};

pub(super) const BROADCAST_TYPE: &str = "broadcast";
pub(super) const READ_TYPE: &str = "read";
pub(super) const TOPOLOGY_TYPE: &str = "topology";

/// Broadcast values received so far, in arrival order.
///
/// Clones share the same log.
#[derive(Debug, Default, Clone)]
pub struct BroadcastLog {
    messages: Arc<Mutex<Vec<i64>>>,
}

impl BroadcastLog {
    /// Appends a value.
    pub fn append(&self, value: i64) {
        self.lock().push(value);
    }

    /// Copies the current contents.
    #[must_use]
    pub fn snapshot(&self) -> Vec<i64> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<i64>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Records the `message` field of a `broadcast` request.
#[derive(Debug, Clone)]
pub struct Broadcast {
    log: BroadcastLog,
}

impl Broadcast {
    /// Creates a handler appending to `log`.
    #[must_use]
    pub const fn new(log: BroadcastLog) -> Self {
        Self { log }
    }
}

impl Handler for Broadcast {
    fn handle(&mut self, ctx: &mut NodeContext, message: &Message) -> Result<(), HandlerError> {
        let value: i64 = message.body.field("message")?;
        self.log.append(value);
        ctx.reply(message, Body::new("broadcast_ok"))?;
        Ok(())
    }
}

/// Answers `read` with every recorded broadcast value.
#[derive(Debug, Clone)]
pub struct Read {
    log: BroadcastLog,
}

impl Read {
    /// Creates a handler reading from `log`.
    #[must_use]
    pub const fn new(log: BroadcastLog) -> Self {
        Self { log }
    }
}

impl Handler for Read {
    fn handle(&mut self, ctx: &mut NodeContext, message: &Message) -> Result<(), HandlerError> {
        let body = Body::new("read_ok").with_field("messages", self.log.snapshot());
        ctx.reply(message, body)?;
        Ok(())
    }
}

/// Acknowledges `topology` without acting on it.
#[derive(Debug, Default, Clone, Copy)]
pub struct Topology;

impl Handler for Topology {
    fn handle(&mut self, ctx: &mut NodeContext, message: &Message) -> Result<(), HandlerError> {
        ctx.reply(message, Body::new("topology_ok"))?;
        Ok(())
    }
}
