//! Inbound object framing and decoding.

use std::io::{self, BufRead};

use glomers_config::DEFAULT_MAX_FRAME_BYTES;

use crate::protocol::Message;

use super::errors::CodecError;

/// Where the scanner sits relative to the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Phase {
    /// Between frames, skipping whitespace.
    #[default]
    Idle,
    /// Discarding bytes that cannot start an object, up to the next newline.
    Garbage,
    /// Inside a top-level object.
    Object,
}

/// Effect of one byte on the current frame.
enum Step {
    /// Byte is not part of any frame.
    Skip,
    /// Byte belongs to the current object.
    Take,
    /// Byte closes the current object.
    Close,
    /// Byte ends a run of garbage.
    EndGarbage,
    /// Raw newline inside a string literal; the frame cannot be valid.
    BrokenString,
    /// Byte opens a new value where a separator was required. The current
    /// frame is abandoned and framing restarts at this byte.
    Restart,
}

/// Byte-level state machine tracking object boundaries.
#[derive(Debug, Default)]
struct Scanner {
    phase: Phase,
    depth: usize,
    in_string: bool,
    escaped: bool,
    /// Last significant byte seen outside string literals.
    last: u8,
}

impl Scanner {
    fn push(&mut self, byte: u8) -> Step {
        match self.phase {
            Phase::Idle => self.idle(byte),
            Phase::Garbage => {
                if byte == b'\n' {
                    self.phase = Phase::Idle;
                    Step::EndGarbage
                } else {
                    Step::Skip
                }
            }
            Phase::Object => self.object(byte),
        }
    }

    /// Drops the rest of the current line.
    fn discard_line(&mut self) {
        *self = Self {
            phase: Phase::Garbage,
            ..Self::default()
        };
    }

    fn idle(&mut self, byte: u8) -> Step {
        if byte.is_ascii_whitespace() {
            Step::Skip
        } else if byte == b'{' {
            self.phase = Phase::Object;
            self.depth = 1;
            self.last = byte;
            Step::Take
        } else {
            self.phase = Phase::Garbage;
            Step::Skip
        }
    }

    fn object(&mut self, byte: u8) -> Step {
        if self.in_string {
            if byte == b'\n' {
                *self = Self::default();
                return Step::BrokenString;
            }
            if self.escaped {
                self.escaped = false;
            } else if byte == b'\\' {
                self.escaped = true;
            } else if byte == b'"' {
                self.in_string = false;
            }
            return Step::Take;
        }

        if byte.is_ascii_whitespace() {
            return Step::Take;
        }
        if matches!(byte, b'{' | b'[' | b'"') && !matches!(self.last, b'{' | b'[' | b',' | b':') {
            *self = Self::default();
            return Step::Restart;
        }
        self.last = byte;

        match byte {
            b'"' => self.in_string = true,
            b'{' => self.depth += 1,
            b'}' => {
                self.depth -= 1;
                if self.depth == 0 {
                    *self = Self::default();
                    return Step::Close;
                }
            }
            _ => {}
        }
        Step::Take
    }
}

/// How a read of the underlying stream ended.
enum Boundary {
    /// A complete object was framed.
    Object,
    /// A run of garbage was discarded.
    Garbage,
    /// An object outgrew the frame limit; the rest of its line was discarded.
    Oversized,
    /// An object was cut short and cannot be completed.
    Broken(&'static str),
    /// The stream ended.
    Eof,
}

/// Decodes a stream of JSON objects into [`Message`]s, one at a time.
///
/// Errors on one unit never poison the decoder: after a malformed or
/// oversized unit the next call resumes with the following unit.
pub struct MessageDecoder<R> {
    reader: R,
    max_frame_bytes: usize,
    frame: Vec<u8>,
}

impl<R: BufRead> MessageDecoder<R> {
    /// Creates a decoder with the default 1 MiB frame limit.
    pub const fn new(reader: R) -> Self {
        Self::with_limit(reader, DEFAULT_MAX_FRAME_BYTES)
    }

    /// Creates a decoder rejecting objects larger than `max_frame_bytes`.
    pub const fn with_limit(reader: R, max_frame_bytes: usize) -> Self {
        Self {
            reader,
            max_frame_bytes,
            frame: Vec::new(),
        }
    }

    /// Decodes the next message.
    ///
    /// Returns `Ok(None)` once the stream is exhausted.
    ///
    /// # Errors
    ///
    /// Returns a recoverable [`CodecError::Malformed`] or
    /// [`CodecError::FrameTooLarge`] for a bad unit, after which decoding may
    /// continue, and [`CodecError::Io`] when the stream itself fails.
    pub fn next_message(&mut self) -> Result<Option<Message>, CodecError> {
        match self.next_frame()? {
            Some(frame) => serde_json::from_slice(frame)
                .map(Some)
                .map_err(CodecError::from_json_error),
            None => Ok(None),
        }
    }

    /// Reads up to the next frame boundary, returning the object bytes.
    fn next_frame(&mut self) -> Result<Option<&[u8]>, CodecError> {
        self.frame.clear();
        let mut scanner = Scanner::default();
        let mut size = 0_usize;
        let mut oversized = false;

        let boundary = loop {
            let available = match self.reader.fill_buf() {
                Ok(available) => available,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(error) => return Err(CodecError::Io(error)),
            };
            if available.is_empty() {
                break Boundary::Eof;
            }

            let mut consumed = available.len();
            let mut boundary = None;
            for (index, &byte) in available.iter().enumerate() {
                match scanner.push(byte) {
                    Step::Skip => continue,
                    Step::Take => {}
                    Step::Close => boundary = Some(Boundary::Object),
                    Step::EndGarbage => {
                        consumed = index + 1;
                        boundary = Some(if oversized {
                            Boundary::Oversized
                        } else {
                            Boundary::Garbage
                        });
                        break;
                    }
                    Step::BrokenString => {
                        consumed = index + 1;
                        boundary = Some(Boundary::Broken("line ended inside a string"));
                        break;
                    }
                    Step::Restart => {
                        consumed = index;
                        boundary = Some(Boundary::Broken("object ended before its closing brace"));
                        break;
                    }
                }
                size += 1;
                if size <= self.max_frame_bytes {
                    self.frame.push(byte);
                } else if boundary.is_none() {
                    oversized = true;
                    if byte == b'\n' {
                        scanner = Scanner::default();
                        boundary = Some(Boundary::Oversized);
                    } else {
                        scanner.discard_line();
                    }
                }
                if boundary.is_some() {
                    consumed = index + 1;
                    break;
                }
            }
            self.reader.consume(consumed);

            if let Some(boundary) = boundary {
                break boundary;
            }
        };

        match boundary {
            Boundary::Object if size > self.max_frame_bytes => Err(self.too_large(size)),
            Boundary::Object => Ok(Some(&self.frame)),
            Boundary::Oversized => Err(self.too_large(size)),
            Boundary::Garbage => Err(CodecError::malformed(
                "input does not start with a JSON object",
            )),
            Boundary::Broken(reason) => Err(CodecError::malformed(reason)),
            Boundary::Eof if oversized => Err(self.too_large(size)),
            Boundary::Eof => match scanner.phase {
                Phase::Idle => Ok(None),
                Phase::Garbage => Err(CodecError::malformed(
                    "input does not start with a JSON object",
                )),
                Phase::Object => Err(CodecError::malformed(
                    "input ended inside a JSON object",
                )),
            },
        }
    }

    const fn too_large(&self, size: usize) -> CodecError {
        CodecError::FrameTooLarge {
            size,
            max_size: self.max_frame_bytes,
        }
    }
}
