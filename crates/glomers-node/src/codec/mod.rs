//! Streaming JSON framing for the node's input and output channels.
//!
//! Inbound objects are framed by brace depth rather than by newline, so a
//! message may span several lines or share a line with its neighbour. Bytes
//! that cannot start an object are discarded up to the next newline, which
//! lets the decoder resynchronise after garbage.
//!
//! A unit that cannot be completed never holds up the stream. A raw newline
//! inside a string ends it, and so does a new object or string opening where
//! a separator was due; framing then restarts at that byte. An object past
//! the size limit is abandoned at once and the rest of its line dropped.

mod decoder;
mod errors;
mod writer;

pub use decoder::MessageDecoder;
pub use errors::CodecError;
pub use writer::MessageWriter;
