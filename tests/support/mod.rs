//! In-process stand-in for the Docker Engine.
//!
//! Binds a Unix socket in a temporary directory, records the request line
//! of every request and answers with canned raw HTTP responses.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixListener;

pub struct MockEngine {
    _dir: tempfile::TempDir,
    path: PathBuf,
    requests: Arc<Mutex<Vec<String>>>,
    bodies: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl MockEngine {
    /// Starts serving `routes`, keyed by `"METHOD /path?query"`.
    /// Unknown routes get a 404 with an Engine-style JSON message.
    pub fn start(routes: Vec<(&str, Vec<u8>)>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docker.sock");
        let listener = UnixListener::bind(&path).unwrap();

        let routes: Arc<HashMap<String, Vec<u8>>> = Arc::new(
            routes
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        );
        let requests = Arc::new(Mutex::new(Vec::new()));
        let bodies = Arc::new(Mutex::new(Vec::new()));

        let (req_log, body_log) = (requests.clone(), bodies.clone());
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let routes = routes.clone();
                let req_log = req_log.clone();
                let body_log = body_log.clone();
                tokio::spawn(async move {
                    let Some((line, body)) = read_request(&mut socket).await else {
                        return;
                    };
                    req_log.lock().unwrap().push(line.clone());
                    body_log.lock().unwrap().push(body);

                    let response = routes.get(&line).cloned().unwrap_or_else(|| {
                        json_response(404, "Not Found", r#"{"message":"no such route"}"#)
                    });
                    let _ = socket.write_all(&response).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        Self {
            _dir: dir,
            path,
            requests,
            bodies,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Request lines received so far, e.g. `"GET /v1.41/images/json"`.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn bodies(&self) -> Vec<Vec<u8>> {
        self.bodies.lock().unwrap().clone()
    }

    pub fn count(&self, line: &str) -> usize {
        self.requests().iter().filter(|r| *r == line).count()
    }
}

async fn read_request(socket: &mut tokio::net::UnixStream) -> Option<(String, Vec<u8>)> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_string();
            let content_length = head
                .lines()
                .filter_map(|l| l.split_once(':'))
                .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
                .and_then(|(_, v)| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + content_length {
                let mut parts = head.lines().next()?.split(' ');
                let line = format!("{} {}", parts.next()?, parts.next()?);
                return Some((line, buf[end + 4..end + 4 + content_length].to_vec()));
            }
        }
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

pub fn json_response(status: u16, reason: &str, body: &str) -> Vec<u8> {
    format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    )
    .into_bytes()
}

pub fn ok_json(body: &str) -> Vec<u8> {
    json_response(200, "OK", body)
}

pub fn no_content() -> Vec<u8> {
    b"HTTP/1.1 204 No Content\r\n\r\n".to_vec()
}

/// Raw stream body with no length, ended by closing the connection.
pub fn stream_response(body: &[u8]) -> Vec<u8> {
    let mut out =
        b"HTTP/1.1 200 OK\r\nContent-Type: application/vnd.docker.multiplexed-stream\r\n\r\n"
            .to_vec();
    out.extend_from_slice(body);
    out
}

pub fn chunked_response(body: &[u8], chunk_size: usize) -> Vec<u8> {
    let mut out = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n".to_vec();
    out.extend_from_slice(&encode_chunks(body, chunk_size));
    out
}

pub fn encode_chunks(data: &[u8], chunk_size: usize) -> Vec<u8> {
    let mut out = Vec::new();
    for chunk in data.chunks(chunk_size.max(1)) {
        out.extend_from_slice(format!("{:x}\r\n", chunk.len()).as_bytes());
        out.extend_from_slice(chunk);
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b"0\r\n\r\n");
    out
}

/// One multiplexed frame: type byte, three zero bytes, big-endian length.
pub fn frame(stream_type: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = vec![stream_type, 0, 0, 0];
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(payload);
    out
}
