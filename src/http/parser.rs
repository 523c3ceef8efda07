use crate::http::response::Headers;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    InvalidStatusLine,
    InvalidHeader,
    InvalidContentLength,
    InvalidEncoding,
    Incomplete,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            ParseError::InvalidStatusLine => "invalid status line",
            ParseError::InvalidHeader => "invalid header line",
            ParseError::InvalidContentLength => "invalid Content-Length",
            ParseError::InvalidEncoding => "headers are not valid UTF-8",
            ParseError::Incomplete => "incomplete response head",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for ParseError {}

/// How the body following a response head is delimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Chunked,
    Length(usize),
    /// Neither chunked nor sized; the body runs until the peer closes.
    UntilClose,
}

/// Status line and headers of a response.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    pub status_line: String,
    pub version: String,
    pub status: u16,
    pub reason: String,
    pub headers: Headers,
    /// Bytes occupied by the head including the CRLFCRLF terminator.
    pub header_len: usize,
}

impl ResponseHead {
    /// Chunked wins over Content-Length when both are present.
    pub fn body_kind(&self) -> Result<BodyKind, ParseError> {
        if self.headers.is_chunked() {
            return Ok(BodyKind::Chunked);
        }
        match self.headers.get("Content-Length") {
            Some(v) => v
                .trim()
                .parse::<usize>()
                .map(BodyKind::Length)
                .map_err(|_| ParseError::InvalidContentLength),
            None => Ok(BodyKind::UntilClose),
        }
    }
}

pub fn parse_response_head(buf: &[u8]) -> Result<ResponseHead, ParseError> {
    let headers_end = find_headers_end(buf).ok_or(ParseError::Incomplete)?;

    let headers_str =
        std::str::from_utf8(&buf[..headers_end]).map_err(|_| ParseError::InvalidEncoding)?;

    let mut lines = headers_str.split("\r\n");

    // Status line: HTTP/1.1 200 OK
    let status_line = lines.next().ok_or(ParseError::InvalidStatusLine)?;
    let mut parts = status_line.splitn(3, ' ');

    let version = parts.next().ok_or(ParseError::InvalidStatusLine)?;
    if !version.starts_with("HTTP/") {
        return Err(ParseError::InvalidStatusLine);
    }
    let status = parts
        .next()
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or(ParseError::InvalidStatusLine)?;
    let reason = parts.next().unwrap_or("").trim();

    // Headers
    let mut headers = Headers::new();

    for line in lines {
        if line.is_empty() {
            continue;
        }

        let (key, value) = line.split_once(':').ok_or(ParseError::InvalidHeader)?;

        headers.insert(key.trim(), value.trim());
    }

    Ok(ResponseHead {
        status_line: status_line.to_string(),
        version: version.to_string(),
        status,
        reason: reason.to_string(),
        headers,
        header_len: headers_end + 4,
    })
}

pub fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}
