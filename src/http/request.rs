/// HTTP request methods used against the Engine API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Read a listing or an inspect document
    GET,
    /// POST - Trigger an action (start, stop, exec)
    POST,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
        }
    }
}

/// An outgoing HTTP/1.1 request.
///
/// Immutable once built. Headers keep their insertion order so the wire
/// form is deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// The HTTP method (GET, POST, etc.)
    pub method: Method,
    /// Path and query, e.g. `/v1.41/containers/json?all=true`
    pub path: String,
    /// HTTP version (always "HTTP/1.1" for the Engine)
    pub version: String,
    /// Headers in the order they are written
    pub headers: Vec<(String, String)>,
    /// Optional entity body
    pub body: Option<Vec<u8>>,
}

/// Builder for constructing Request objects.
#[derive(Debug)]
pub struct RequestBuilder {
    method: Method,
    path: String,
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

impl RequestBuilder {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Adds a header, replacing an earlier one with the same name
    /// (compared case-insensitively) in place.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&key))
        {
            Some(entry) => entry.1 = value,
            None => self.headers.push((key, value)),
        }
        self
    }

    /// Sets the body and a matching `Content-Length`.
    pub fn body(self, body: Vec<u8>) -> Self {
        let mut this = self.header("Content-Length", body.len().to_string());
        this.body = Some(body);
        this
    }

    pub fn build(self) -> Request {
        Request {
            method: self.method,
            path: self.path,
            version: "HTTP/1.1".to_string(),
            headers: self.headers,
            body: self.body,
        }
    }
}

/// Value sent in the `User-Agent` header of every Engine request.
pub const USER_AGENT: &str = "Bulkhead/1.0";

impl Request {
    /// Builds a request in the shape the Docker Engine expects over its
    /// Unix socket: one request per connection, JSON bodies.
    pub fn engine(method: Method, path: impl Into<String>, body: Option<Vec<u8>>) -> Self {
        let builder = RequestBuilder::new(method, path)
            .header("Host", "docker")
            .header("User-Agent", USER_AGENT)
            .header("Accept", "*/*")
            .header("Connection", "close")
            .header("Content-Type", "application/json");

        match body {
            Some(body) => builder.body(body).build(),
            None => builder.build(),
        }
    }

    /// Retrieves a header value by name, ignoring ASCII case.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}
