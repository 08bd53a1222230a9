//! Outbound message serialisation.

use std::io::Write;

use crate::protocol::Message;

use super::errors::CodecError;

/// Writes one JSON object per line and flushes after each message.
///
/// Replies are never batched: each one reaches the stream before
/// [`MessageWriter::write_message`] returns.
pub struct MessageWriter<W> {
    writer: W,
}

impl<W: Write> MessageWriter<W> {
    /// Wraps an output stream.
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Serialises `message`, appends a newline and flushes.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation, writing or flushing fails.
    pub fn write_message(&mut self, message: &Message) -> Result<(), CodecError> {
        serde_json::to_writer(&mut self.writer, message).map_err(CodecError::from_encode_error)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }

    /// Unwraps the output stream.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;
    use crate::protocol::Body;

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn writes_one_line_per_message() {
        let mut writer = MessageWriter::new(Vec::new());
        writer
            .write_message(&Message::new("n1", "c1", Body::new("init_ok")))
            .expect("first");
        writer
            .write_message(&Message::new("n1", "c2", Body::new("echo_ok")))
            .expect("second");

        let output = String::from_utf8(writer.into_inner()).expect("utf8");
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines.first().copied(),
            Some(r#"{"src":"n1","dest":"c1","body":{"type":"init_ok"}}"#)
        );
        assert!(output.ends_with('\n'));
    }

    #[test]
    fn write_failures_surface_as_io_errors() {
        let mut writer = MessageWriter::new(FailingWriter);
        let error = writer
            .write_message(&Message::new("n1", "c1", Body::new("init_ok")))
            .expect_err("broken pipe");
        assert!(matches!(error, CodecError::Io(_)));
        assert!(!error.is_recoverable());
    }
}
