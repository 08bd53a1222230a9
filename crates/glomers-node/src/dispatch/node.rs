//! The node and its sequential dispatch loop.

use std::io::{BufRead, Write};
use std::panic::{self, AssertUnwindSafe};

use glomers_config::Config;
use glomers_id::{MachineId, SnowflakeGenerator};
use tracing::{debug, error, info, warn};

use crate::codec::{CodecError, MessageDecoder};
use crate::protocol::Message;

use super::DISPATCH_TARGET;
use super::context::NodeContext;
use super::errors::{HandlerError, HandshakeError, RunError};
use super::handler::Handler;
use super::handshake;
use super::registry::HandlerRegistry;

/// Type tag of the handshake request.
pub const INIT_TYPE: &str = "init";
/// Type tag of the handshake acknowledgement.
pub const INIT_OK_TYPE: &str = "init_ok";

/// Counters reported when the input is exhausted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Messages a handler (or the handshake) completed.
    pub handled: usize,
    /// Messages whose handler returned an error.
    pub failed: usize,
    /// Units dropped before reaching a handler: undecodable or unrouted.
    pub dropped: usize,
}

/// What happened to one decoded message.
enum Outcome {
    Handled,
    Failed,
    Unrouted,
}

/// A cluster node: handler registry plus the context handlers operate on.
///
/// Register handlers first, then call [`Node::run`]. Messages are processed
/// strictly one after another, so handlers never run concurrently.
pub struct Node {
    registry: HandlerRegistry,
    context: NodeContext,
    max_frame_bytes: usize,
}

impl Node {
    /// Creates a node that issues ids from `generator` and writes replies to
    /// `output`.
    pub fn new(generator: SnowflakeGenerator, output: impl Write + Send + 'static) -> Self {
        Self {
            registry: HandlerRegistry::new(),
            context: NodeContext::new(generator, Box::new(output)),
            max_frame_bytes: glomers_config::DEFAULT_MAX_FRAME_BYTES,
        }
    }

    /// Creates a node from resolved configuration.
    ///
    /// Without an explicit machine id the low ten bits of the process id are
    /// used, which keeps nodes launched side by side on one host distinct.
    pub fn from_config(config: &Config, output: impl Write + Send + 'static) -> Self {
        let machine_id = config.machine_id().map_or_else(
            || MachineId::from_process_id(std::process::id()),
            MachineId::new,
        );
        debug!(target: DISPATCH_TARGET, %machine_id, "creating node");
        Self::new(SnowflakeGenerator::new(machine_id), output)
            .with_max_frame_bytes(config.max_frame_bytes())
    }

    /// Overrides the inbound frame size limit.
    #[must_use]
    pub fn with_max_frame_bytes(mut self, max_frame_bytes: usize) -> Self {
        self.max_frame_bytes = max_frame_bytes;
        self
    }

    /// Registers `handler` for messages tagged `kind`, replacing any earlier
    /// registration.
    ///
    /// `init` is reserved for the engine's handshake; attempts to register it
    /// are logged and ignored.
    pub fn register<H>(&mut self, kind: impl Into<String>, handler: H) -> &mut Self
    where
        H: Handler + 'static,
    {
        let kind = kind.into();
        if kind == INIT_TYPE {
            warn!(
                target: DISPATCH_TARGET,
                "the init handshake is handled by the node; ignoring registration"
            );
            return self;
        }
        if self.registry.insert(kind.as_str(), Box::new(handler)) {
            debug!(target: DISPATCH_TARGET, kind = kind.as_str(), "replaced existing handler");
        }
        self
    }

    /// Registers a closure as the handler for `kind`.
    pub fn register_fn<F>(&mut self, kind: impl Into<String>, handler: F) -> &mut Self
    where
        F: FnMut(&mut NodeContext, &Message) -> Result<(), HandlerError> + Send + 'static,
    {
        self.register(kind, handler)
    }

    /// The context shared with handlers.
    #[must_use]
    pub const fn context(&self) -> &NodeContext {
        &self.context
    }

    /// The routing table.
    #[must_use]
    pub const fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Processes messages from `input` until it is exhausted.
    ///
    /// Per-message failures are logged and counted; they never stop the loop.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Handshake`] when an `init` message is invalid or
    /// cannot be acknowledged, and [`RunError::Input`] when reading `input`
    /// fails.
    pub fn run<R: BufRead>(&mut self, input: R) -> Result<RunSummary, RunError> {
        let mut decoder = MessageDecoder::with_limit(input, self.max_frame_bytes);
        let mut summary = RunSummary::default();

        loop {
            let message = match decoder.next_message() {
                Ok(Some(message)) => message,
                Ok(None) => break,
                Err(error) if error.is_recoverable() => {
                    warn!(target: DISPATCH_TARGET, %error, "failed to decode message");
                    summary.dropped += 1;
                    continue;
                }
                Err(error) => return Err(input_error(error)),
            };

            match self.dispatch(&message)? {
                Outcome::Handled => summary.handled += 1,
                Outcome::Failed => summary.failed += 1,
                Outcome::Unrouted => summary.dropped += 1,
            }
        }

        info!(
            target: DISPATCH_TARGET,
            handled = summary.handled,
            failed = summary.failed,
            dropped = summary.dropped,
            "input closed"
        );
        Ok(summary)
    }

    fn dispatch(&mut self, message: &Message) -> Result<Outcome, HandshakeError> {
        let kind = message.kind();
        debug!(
            target: DISPATCH_TARGET,
            kind,
            src = %message.src,
            msg_id = ?message.body.msg_id,
            "dispatching message"
        );

        if kind == INIT_TYPE {
            handshake::perform(&mut self.context, message)?;
            return Ok(Outcome::Handled);
        }

        let Some(handler) = self.registry.get_mut(kind) else {
            warn!(target: DISPATCH_TARGET, kind, "no handler registered; message ignored");
            return Ok(Outcome::Unrouted);
        };

        let context = &mut self.context;
        match panic::catch_unwind(AssertUnwindSafe(|| handler.handle(context, message))) {
            Ok(Ok(())) => Ok(Outcome::Handled),
            Ok(Err(error)) => {
                warn!(target: DISPATCH_TARGET, kind, %error, "failed to handle message");
                Ok(Outcome::Failed)
            }
            Err(_) => {
                error!(target: DISPATCH_TARGET, kind, "handler panicked");
                Ok(Outcome::Failed)
            }
        }
    }
}

fn input_error(error: CodecError) -> RunError {
    error!(target: DISPATCH_TARGET, %error, "input stream failed");
    RunError::Input(error)
}
