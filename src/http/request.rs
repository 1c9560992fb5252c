use std::collections::BTreeMap;
use std::fmt;

/// Request headers keyed by canonical name, values kept in arrival order.
///
/// Names iterate in sorted order, which keeps the rendered header map
/// stable between requests.
pub type Headers = BTreeMap<String, Vec<String>>;

/// HTTP request methods.
///
/// The standard methods get their own variant. Any other well-formed token
/// is carried as `Extension` so handlers can still report it back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// POST - Create or submit data
    POST,
    /// PUT - Replace a resource
    PUT,
    /// DELETE - Delete a resource
    DELETE,
    /// HEAD - Like GET but without the response body
    HEAD,
    /// OPTIONS - Describe communication options
    OPTIONS,
    /// PATCH - Partial modification of a resource
    PATCH,
    CONNECT,
    TRACE,
    /// Any other token, stored verbatim.
    Extension(String),
}

impl Method {
    /// Parses an HTTP method from a string.
    ///
    /// Methods are case-sensitive. Returns `None` when `s` is not a valid
    /// token (empty, or containing separators or control bytes).
    ///
    /// # Example
    ///
    /// ```
    /// # use echod::http::request::Method;
    /// assert_eq!(Method::from_str("GET"), Some(Method::GET));
    /// assert_eq!(Method::from_str("get"), Some(Method::Extension("get".into())));
    /// assert_eq!(Method::from_str("GE T"), None);
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        let method = match s {
            "GET" => Method::GET,
            "POST" => Method::POST,
            "PUT" => Method::PUT,
            "DELETE" => Method::DELETE,
            "HEAD" => Method::HEAD,
            "OPTIONS" => Method::OPTIONS,
            "PATCH" => Method::PATCH,
            "CONNECT" => Method::CONNECT,
            "TRACE" => Method::TRACE,
            other if is_token(other) => Method::Extension(other.to_string()),
            _ => return None,
        };
        Some(method)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::HEAD => "HEAD",
            Method::OPTIONS => "OPTIONS",
            Method::PATCH => "PATCH",
            Method::CONNECT => "CONNECT",
            Method::TRACE => "TRACE",
            Method::Extension(name) => name,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a request body could not be read in full.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyError {
    /// The peer closed the connection before the declared body arrived.
    UnexpectedEof { expected: Option<usize>, received: usize },
    /// Chunked transfer coding was malformed.
    InvalidChunk,
}

impl fmt::Display for BodyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodyError::UnexpectedEof { expected: Some(n), received } => {
                write!(f, "connection closed after {received} of {n} body bytes")
            }
            BodyError::UnexpectedEof { expected: None, received } => {
                write!(f, "connection closed after {received} bytes of chunked body")
            }
            BodyError::InvalidChunk => f.write_str("malformed chunked encoding"),
        }
    }
}

impl std::error::Error for BodyError {}

/// Represents a parsed HTTP request from a client.
///
/// Header names are canonicalized (`content-type` becomes `Content-Type`).
/// The `Host` header is lifted out of `headers` into `host`.
#[derive(Debug, Clone)]
pub struct Request {
    /// The HTTP method (GET, POST, etc.)
    pub method: Method,
    /// The request target as sent, query string included
    pub path: String,
    /// HTTP version (typically "HTTP/1.1")
    pub version: String,
    pub host: Option<String>,
    pub headers: Headers,
    /// The fully decoded body, or why it could not be read
    pub body: Result<Vec<u8>, BodyError>,
}

/// Builder for constructing Request objects.
pub struct RequestBuilder {
    method: Option<Method>,
    path: Option<String>,
    version: Option<String>,
    host: Option<String>,
    headers: Headers,
    body: Result<Vec<u8>, BodyError>,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            method: None,
            path: None,
            version: None,
            host: None,
            headers: Headers::new(),
            body: Ok(Vec::new()),
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Appends a header value; `Host` sets the request host instead.
    pub fn header(mut self, key: impl AsRef<str>, value: impl Into<String>) -> Self {
        insert_header(&mut self.host, &mut self.headers, key.as_ref(), value.into());
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = Ok(body);
        self
    }

    pub fn body_error(mut self, err: BodyError) -> Self {
        self.body = Err(err);
        self
    }

    pub fn build(self) -> Result<Request, &'static str> {
        Ok(Request {
            method: self.method.ok_or("method missing")?,
            path: self.path.ok_or("path missing")?,
            version: self.version.unwrap_or_else(|| "HTTP/1.1".to_string()),
            host: self.host,
            headers: self.headers,
            body: self.body,
        })
    }
}

impl Request {
    /// Returns every value received for a header.
    pub fn header_values(&self, key: &str) -> &[String] {
        self.headers
            .get(&canonical_header_key(key))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// The request path without its query string.
    ///
    /// Absolute-form targets (`http://host/path`) lose their scheme and
    /// authority; one with no path routes as the empty path.
    pub fn route(&self) -> &str {
        let target = match self.path.split_once('?') {
            Some((target, _)) => target,
            None => &self.path,
        };

        match target.split_once("://") {
            Some((scheme, rest)) if is_scheme(scheme) => match rest.find('/') {
                Some(i) => &rest[i..],
                None => "",
            },
            _ => target,
        }
    }

    /// Determines whether the connection should remain open after the response.
    ///
    /// HTTP/1.1 stays open unless the client sent `Connection: close`.
    /// HTTP/1.0 closes unless the client asked for `keep-alive`. A body that
    /// could not be read leaves the stream unusable, so it always closes.
    pub fn keep_alive(&self) -> bool {
        if self.body.is_err() {
            return false;
        }

        let tokens = || {
            self.header_values("Connection")
                .iter()
                .flat_map(|v| v.split(','))
                .map(str::trim)
        };

        if self.version == "HTTP/1.0" {
            tokens().any(|t| t.eq_ignore_ascii_case("keep-alive"))
        } else {
            !tokens().any(|t| t.eq_ignore_ascii_case("close"))
        }
    }

}

/// Stores a header under its canonical name, routing `Host` to `host`.
pub(crate) fn insert_header(
    host: &mut Option<String>,
    headers: &mut Headers,
    key: &str,
    value: String,
) {
    let key = canonical_header_key(key);
    if key == "Host" {
        // first Host wins
        if host.is_none() {
            *host = Some(value);
        }
        return;
    }
    headers.entry(key).or_default().push(value);
}

/// Canonical MIME form of a header name: the first letter and every letter
/// after a hyphen upper-cased, the rest lower-cased.
///
/// Names containing bytes that are not valid in a token are returned as-is.
///
/// ```
/// # use echod::http::request::canonical_header_key;
/// assert_eq!(canonical_header_key("x-forwarded-for"), "X-Forwarded-For");
/// assert_eq!(canonical_header_key("bad key"), "bad key");
/// ```
pub fn canonical_header_key(key: &str) -> String {
    if !is_token(key) {
        return key.to_string();
    }

    let mut upper = true;
    key.chars()
        .map(|c| {
            let out = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            out
        })
        .collect()
}

/// RFC 7230 `token`: one or more visible ASCII characters excluding separators.
fn is_scheme(s: &str) -> bool {
    let mut bytes = s.bytes();
    bytes.next().is_some_and(|b| b.is_ascii_alphabetic())
        && bytes.all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.'))
}

pub(crate) fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| {
            b.is_ascii_alphanumeric()
                || matches!(
                    b,
                    b'!' | b'#'
                        | b'$'
                        | b'%'
                        | b'&'
                        | b'\''
                        | b'*'
                        | b'+'
                        | b'-'
                        | b'.'
                        | b'^'
                        | b'_'
                        | b'`'
                        | b'|'
                        | b'~'
                )
        })
}
