use crate::dispatch::{Handler, HandlerError, NodeContext};
use crate::protocol::{Body, Message};

pub(super) const ECHO_TYPE: &str = "echo";
const ECHO_OK_TYPE: &str = "echo_ok";

/// Answers `echo` with `echo_ok`, carrying the request's fields back.
#[derive(Debug, Default, Clone, Copy)]
pub struct Echo;

impl Handler for Echo {
    fn handle(&mut self, ctx: &mut NodeContext, message: &Message) -> Result<(), HandlerError> {
        let body = Body {
            extra: message.body.extra.clone(),
            ..Body::new(ECHO_OK_TYPE)
        };
        ctx.reply(message, body)?;
        Ok(())
    }
}
