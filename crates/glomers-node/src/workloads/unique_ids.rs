use crate::dispatch::{Handler, HandlerError, NodeContext};
use crate::protocol::{Body, Message};

pub(super) const GENERATE_TYPE: &str = "generate";
const GENERATE_OK_TYPE: &str = "generate_ok";

/// Answers `generate` with a cluster-unique `id`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Generate;

impl Handler for Generate {
    fn handle(&mut self, ctx: &mut NodeContext, message: &Message) -> Result<(), HandlerError> {
        let id = ctx.generate_id()?;
        ctx.reply(
            message,
            Body::new(GENERATE_OK_TYPE).with_field("id", id.as_u64()),
        )?;
        Ok(())
    }
}
