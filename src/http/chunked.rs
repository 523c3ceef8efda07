//! `Transfer-Encoding: chunked` reassembly.
//!
//! Each chunk is `<hex size>[;ext]\r\n<payload>\r\n`; a zero-size chunk ends
//! the body. Trailer fields after the terminal chunk are skipped.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChunkedError {
    /// The buffer ends before the terminal zero-size chunk.
    #[error("chunked body ended before the terminal chunk")]
    Incomplete,
    /// A size line did not hold a hexadecimal number.
    #[error("invalid chunk size line: {0:?}")]
    InvalidSize(String),
    /// A chunk payload was not followed by CRLF.
    #[error("chunk payload not terminated by CRLF")]
    MissingDelimiter,
}

/// Reassembles a complete chunked body.
pub fn dechunk(data: &[u8]) -> Result<Vec<u8>, ChunkedError> {
    decode_chunked(data).map(|(body, _)| body)
}

/// Decodes a chunked body and also reports how many input bytes the
/// encoding occupied, trailers included.
pub fn decode_chunked(data: &[u8]) -> Result<(Vec<u8>, usize), ChunkedError> {
    let mut result = Vec::new();
    let mut index = 0;

    loop {
        let line_end = find_crlf(&data[index..]).ok_or(ChunkedError::Incomplete)? + index;
        let size = parse_size_line(&data[index..line_end])?;
        index = line_end + 2;

        if size == 0 {
            // Skip optional trailers up to the empty line.
            loop {
                let end = find_crlf(&data[index..]).ok_or(ChunkedError::Incomplete)? + index;
                let was_empty = end == index;
                index = end + 2;
                if was_empty {
                    return Ok((result, index));
                }
            }
        }

        // Payload plus its trailing CRLF must fit in usize.
        let payload_end = index
            .checked_add(size)
            .filter(|end| end.checked_add(2).is_some())
            .ok_or_else(|| ChunkedError::InvalidSize(format!("{size:x}")))?;
        let chunk_end = payload_end + 2;
        if data.len() < chunk_end {
            return Err(ChunkedError::Incomplete);
        }
        result.extend_from_slice(&data[index..payload_end]);

        if &data[payload_end..chunk_end] != b"\r\n" {
            return Err(ChunkedError::MissingDelimiter);
        }
        index = chunk_end;
    }
}

fn parse_size_line(line: &[u8]) -> Result<usize, ChunkedError> {
    let text = std::str::from_utf8(line)
        .map_err(|_| ChunkedError::InvalidSize(String::from_utf8_lossy(line).into_owned()))?;
    let digits = text.split(';').next().unwrap_or_default().trim();

    if digits.is_empty() {
        return Err(ChunkedError::InvalidSize(text.to_string()));
    }
    usize::from_str_radix(digits, 16).map_err(|_| ChunkedError::InvalidSize(text.to_string()))
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}
