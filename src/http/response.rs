use std::collections::HashMap;

use serde::Deserialize;

use crate::error::DockerError;

/// Response header map.
///
/// Keys keep the case the server sent them in but are unique and looked up
/// case-insensitively. A later header with the same name replaces the
/// earlier value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: HashMap<String, String>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a header, replacing any existing entry whose name matches
    /// ignoring ASCII case. The new spelling of the name wins.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let existing = self
            .entries
            .keys()
            .find(|k| k.eq_ignore_ascii_case(&key))
            .cloned();
        if let Some(existing) = existing {
            self.entries.remove(&existing);
        }
        self.entries.insert(key, value.into());
    }

    /// Retrieves a header value by name (case-insensitive).
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterates headers with their original spelling.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when `Transfer-Encoding` names `chunked`.
    pub fn is_chunked(&self) -> bool {
        self.get("Transfer-Encoding")
            .map(|v| {
                v.split(',')
                    .any(|coding| coding.trim().eq_ignore_ascii_case("chunked"))
            })
            .unwrap_or(false)
    }
}

/// A fully received HTTP response.
///
/// The body is already de-chunked and trimmed to `Content-Length`.
#[derive(Debug, Clone)]
pub struct Response {
    /// Raw status line, e.g. `HTTP/1.1 200 OK`
    pub status_line: String,
    /// Numeric status code
    pub status: u16,
    /// Reason phrase (may be empty)
    pub reason: String,
    pub headers: Headers,
    pub body: Vec<u8>,
}

#[derive(Deserialize)]
struct EngineErrorBody {
    message: String,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Converts a 4xx/5xx response into [`DockerError::Api`].
    ///
    /// 1xx-3xx pass through; the Engine answers `304 Not Modified` when a
    /// container is already in the requested state.
    pub fn error_for_status(self) -> Result<Self, DockerError> {
        if self.status < 400 {
            return Ok(self);
        }

        let message = serde_json::from_slice::<EngineErrorBody>(&self.body)
            .map(|b| b.message)
            .ok()
            .or_else(|| {
                let text = String::from_utf8_lossy(&self.body).trim().to_string();
                (!text.is_empty()).then_some(text)
            })
            .unwrap_or_else(|| self.reason.clone());

        Err(DockerError::Api {
            status: self.status,
            message,
        })
    }
}
