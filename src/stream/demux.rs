//! Decoder for the Engine's multiplexed stdout/stderr framing.
//!
//! Containers without a TTY send log and exec output as frames:
//!
//! ```text
//! ┌──────┬─────────┬──────────────────┬─────────────────┐
//! │ type │ 0  0  0 │ length (u32, BE) │ payload …       │
//! └──────┴─────────┴──────────────────┴─────────────────┘
//!   1 B     3 B          4 B            `length` bytes
//! ```
//!
//! Frames can arrive split at any byte boundary. The decoder buffers
//! partial frames and partial lines, so feeding input in one call or one
//! byte at a time yields the same lines once [`StreamDecoder::flush`] has
//! been called.

use bytes::{Buf, BytesMut};

/// Length of a frame header.
pub const FRAME_HEADER_LEN: usize = 8;

const LF: u8 = 0x0A;
const CR: u8 = 0x0D;

/// Which output stream a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogStream {
    Stdout,
    Stderr,
    Unknown,
}

impl LogStream {
    /// Maps a frame's type byte: 1 is stdout, 2 is stderr.
    pub fn from_tag(tag: u8) -> Self {
        match tag {
            1 => LogStream::Stdout,
            2 => LogStream::Stderr,
            _ => LogStream::Unknown,
        }
    }
}

/// One decoded line.
///
/// The message is kept as raw bytes, terminator included, so ANSI escapes
/// reach the renderer untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub stream: LogStream,
    pub message: Vec<u8>,
}

#[derive(Debug)]
pub struct StreamDecoder {
    buffer: BytesMut,
    line: Vec<u8>,
    add_carriage_return: bool,
}

impl Default for StreamDecoder {
    fn default() -> Self {
        Self::new(true)
    }
}

impl StreamDecoder {
    /// With `add_carriage_return`, every emitted LF is preceded by a CR,
    /// which terminal renderers expect.
    pub fn new(add_carriage_return: bool) -> Self {
        Self {
            buffer: BytesMut::new(),
            line: Vec::new(),
            add_carriage_return,
        }
    }

    /// Feeds bytes and returns every line completed by them.
    pub fn append(&mut self, data: &[u8]) -> Vec<LogLine> {
        self.buffer.extend_from_slice(data);
        let mut lines = Vec::new();

        while self.buffer.len() >= FRAME_HEADER_LEN {
            let stream = LogStream::from_tag(self.buffer[0]);
            let length = u32::from_be_bytes([
                self.buffer[4],
                self.buffer[5],
                self.buffer[6],
                self.buffer[7],
            ]) as usize;

            if self.buffer.len() < FRAME_HEADER_LEN + length {
                break;
            }

            self.buffer.advance(FRAME_HEADER_LEN);
            let payload = self.buffer.split_to(length);

            for &byte in payload.iter() {
                if byte == LF {
                    if self.add_carriage_return {
                        self.line.push(CR);
                    }
                    self.line.push(byte);
                    lines.push(LogLine {
                        stream,
                        message: std::mem::take(&mut self.line),
                    });
                } else {
                    self.line.push(byte);
                }
            }
        }

        lines
    }

    /// Emits the pending unterminated line, tagged stdout, if any.
    ///
    /// Call once the producer reaches end of stream; otherwise a trailing
    /// line without LF is lost. A second call returns nothing.
    pub fn flush(&mut self) -> Vec<LogLine> {
        if self.line.is_empty() {
            return Vec::new();
        }
        vec![LogLine {
            stream: LogStream::Stdout,
            message: std::mem::take(&mut self.line),
        }]
    }

    /// Bytes of an incomplete frame still waiting for more input.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

/// Decodes a complete multiplexed payload in one go.
pub fn decode_all(data: &[u8], add_carriage_return: bool) -> Vec<LogLine> {
    let mut decoder = StreamDecoder::new(add_carriage_return);
    let mut lines = decoder.append(data);
    lines.extend(decoder.flush());
    lines
}
