use tokio::io::AsyncWriteExt;
use tokio::net::UnixStream;

use crate::error::DockerError;
use crate::http::request::Request;

pub fn serialize_request(req: &Request) -> Vec<u8> {
    let mut buf = Vec::new();

    // Request line
    let request_line = format!("{} {} {}\r\n", req.method.as_str(), req.path, req.version);
    buf.extend_from_slice(request_line.as_bytes());

    // Headers
    for (k, v) in &req.headers {
        buf.extend_from_slice(k.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(v.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    // Body
    if let Some(body) = &req.body {
        buf.extend_from_slice(body);
    }

    buf
}

/// Pushes a serialized request onto a socket, resuming after short writes.
pub struct RequestWriter {
    buffer: Vec<u8>,
    written: usize,
}

impl RequestWriter {
    pub fn new(request: &Request) -> Self {
        Self::from_bytes(serialize_request(request))
    }

    pub fn from_bytes(buffer: Vec<u8>) -> Self {
        Self { buffer, written: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.written
    }

    pub async fn write_to_stream(&mut self, stream: &mut UnixStream) -> Result<(), DockerError> {
        while self.written < self.buffer.len() {
            let n = stream
                .write(&self.buffer[self.written..])
                .await
                .map_err(DockerError::SocketWrite)?;

            if n == 0 {
                return Err(DockerError::SocketWrite(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "connection closed while writing",
                )));
            }

            self.written += n;
        }

        stream.flush().await.map_err(DockerError::SocketWrite)?;
        Ok(())
    }
}
