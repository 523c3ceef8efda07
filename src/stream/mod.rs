//! Decoders turning Engine log/exec byte streams into lines.

pub mod demux;
pub mod raw;

pub use demux::{LogLine, LogStream, StreamDecoder};
pub use raw::RawLineDecoder;
