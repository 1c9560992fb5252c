use crate::http::request::{insert_header, is_token, BodyError, Headers, Method, Request};

/// Largest request head (request line plus headers) accepted.
pub const MAX_HEAD_BYTES: usize = 1 << 20;

/// Longest chunk-size line accepted before the framing is declared malformed.
const MAX_CHUNK_LINE: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    InvalidRequest,
    InvalidMethod,
    InvalidHeader,
    InvalidContentLength,
    UnsupportedVersion,
    UnsupportedTransferEncoding,
    HeadTooLarge,
    Incomplete,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            ParseError::InvalidRequest => "malformed request line",
            ParseError::InvalidMethod => "invalid method",
            ParseError::InvalidHeader => "malformed header",
            ParseError::InvalidContentLength => "invalid Content-Length",
            ParseError::UnsupportedVersion => "unsupported HTTP version",
            ParseError::UnsupportedTransferEncoding => "unsupported Transfer-Encoding",
            ParseError::HeadTooLarge => "request head too large",
            ParseError::Incomplete => "incomplete request",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for ParseError {}

/// Request line and headers, before the body has been read.
#[derive(Debug, Clone)]
pub struct RequestHead {
    pub method: Method,
    pub path: String,
    pub version: String,
    pub host: Option<String>,
    pub headers: Headers,
}

impl RequestHead {
    pub fn into_request(self, body: Result<Vec<u8>, BodyError>) -> Request {
        Request {
            method: self.method,
            path: self.path,
            version: self.version,
            host: self.host,
            headers: self.headers,
            body,
        }
    }

    /// Removes the headers that only described the body's framing.
    ///
    /// `Transfer-Encoding` always goes once the body is decoded, and so does
    /// `Content-Length` when the body arrived chunked.
    pub fn strip_framing(&mut self, framing: BodyFraming) {
        self.headers.remove("Transfer-Encoding");
        if framing == BodyFraming::Chunked {
            self.headers.remove("Content-Length");
        }
    }

    fn expects_continue(&self) -> bool {
        self.headers
            .get("Expect")
            .and_then(|v| v.first())
            .map(|v| v.trim().eq_ignore_ascii_case("100-continue"))
            .unwrap_or(false)
    }
}

/// How the body following a request head is delimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFraming {
    Empty,
    Length(usize),
    Chunked,
}

impl BodyFraming {
    pub fn is_empty(&self) -> bool {
        matches!(self, BodyFraming::Empty | BodyFraming::Length(0))
    }
}

/// Parses the request line and headers at the front of `buf`.
///
/// Returns the head and the number of bytes it occupied, blank line
/// included. Empty lines ahead of the request line are skipped.
pub fn parse_request_head(buf: &[u8]) -> Result<(RequestHead, usize), ParseError> {
    let skip = leading_blank_lines(buf);
    let buf = &buf[skip..];

    let headers_end = match find_headers_end(buf) {
        Some(end) => end,
        None if buf.len() > MAX_HEAD_BYTES => return Err(ParseError::HeadTooLarge),
        None => return Err(ParseError::Incomplete),
    };
    if headers_end > MAX_HEAD_BYTES {
        return Err(ParseError::HeadTooLarge);
    }

    let mut lines = split_crlf(&buf[..headers_end]);

    // Request line
    let request_line = lines.next().ok_or(ParseError::InvalidRequest)?;
    let request_line = std::str::from_utf8(request_line).map_err(|_| ParseError::InvalidRequest)?;
    let mut parts = request_line.split(' ');
    let (Some(method_str), Some(path), Some(version), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(ParseError::InvalidRequest);
    };

    let method = Method::from_str(method_str).ok_or(ParseError::InvalidMethod)?;
    if path.is_empty() {
        return Err(ParseError::InvalidRequest);
    }
    if !version.starts_with("HTTP/") {
        return Err(ParseError::InvalidRequest);
    }
    if version != "HTTP/1.1" && version != "HTTP/1.0" {
        return Err(ParseError::UnsupportedVersion);
    }

    // Headers. Names must be tokens; values may carry obs-text, which is
    // kept lossily.
    let mut host = None;
    let mut headers = Headers::new();

    for line in lines {
        if line.is_empty() {
            continue;
        }
        // obsolete line folding is not accepted
        if line.starts_with(b" ") || line.starts_with(b"\t") {
            return Err(ParseError::InvalidHeader);
        }

        let colon = line
            .iter()
            .position(|&b| b == b':')
            .ok_or(ParseError::InvalidHeader)?;
        let key = std::str::from_utf8(&line[..colon]).map_err(|_| ParseError::InvalidHeader)?;
        if !is_token(key) {
            return Err(ParseError::InvalidHeader);
        }
        let value = String::from_utf8_lossy(&line[colon + 1..]);
        insert_header(&mut host, &mut headers, key, value.trim().to_string());
    }

    let head = RequestHead {
        method,
        path: path.to_string(),
        version: version.to_string(),
        host,
        headers,
    };

    Ok((head, skip + headers_end + 4))
}

/// Works out how the body is delimited from the head's framing headers.
///
/// `Transfer-Encoding: chunked` wins over `Content-Length`. Repeated
/// `Content-Length` values must agree.
pub fn body_framing(head: &RequestHead) -> Result<BodyFraming, ParseError> {
    if let Some(codings) = head.headers.get("Transfer-Encoding") {
        let last = codings
            .iter()
            .flat_map(|v| v.split(','))
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .last();
        return match last {
            Some(c) if c.eq_ignore_ascii_case("chunked") => Ok(BodyFraming::Chunked),
            _ => Err(ParseError::UnsupportedTransferEncoding),
        };
    }

    let Some(values) = head.headers.get("Content-Length") else {
        return Ok(BodyFraming::Empty);
    };

    let mut length = None;
    for value in values.iter().flat_map(|v| v.split(',')).map(str::trim) {
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseError::InvalidContentLength);
        }
        let n = value
            .parse::<usize>()
            .map_err(|_| ParseError::InvalidContentLength)?;
        match length {
            Some(prev) if prev != n => return Err(ParseError::InvalidContentLength),
            _ => length = Some(n),
        }
    }

    Ok(length.map_or(BodyFraming::Empty, BodyFraming::Length))
}

/// Decodes a body from the front of `buf`.
///
/// `Ok(None)` means more bytes are needed. On success returns the decoded
/// body and the number of bytes consumed, chunk framing included.
pub fn decode_body(
    buf: &[u8],
    framing: BodyFraming,
) -> Result<Option<(Vec<u8>, usize)>, BodyError> {
    match framing {
        BodyFraming::Empty => Ok(Some((Vec::new(), 0))),
        BodyFraming::Length(n) if buf.len() >= n => Ok(Some((buf[..n].to_vec(), n))),
        BodyFraming::Length(_) => Ok(None),
        BodyFraming::Chunked => decode_chunked(buf),
    }
}

fn decode_chunked(buf: &[u8]) -> Result<Option<(Vec<u8>, usize)>, BodyError> {
    let mut body = Vec::new();
    let mut pos = 0;

    loop {
        let Some(line_end) = find_crlf(&buf[pos..]) else {
            if buf.len() - pos > MAX_CHUNK_LINE {
                return Err(BodyError::InvalidChunk);
            }
            return Ok(None);
        };

        let size = parse_chunk_size(&buf[pos..pos + line_end])?;
        pos += line_end + 2;

        if size == 0 {
            // trailer section, ignored up to the terminating blank line
            loop {
                let Some(line_end) = find_crlf(&buf[pos..]) else {
                    return Ok(None);
                };
                pos += line_end + 2;
                if line_end == 0 {
                    return Ok(Some((body, pos)));
                }
            }
        }

        let data_end = pos.checked_add(size).ok_or(BodyError::InvalidChunk)?;
        let chunk_end = data_end.checked_add(2).ok_or(BodyError::InvalidChunk)?;
        if buf.len() < chunk_end {
            return Ok(None);
        }
        if &buf[data_end..chunk_end] != b"\r\n" {
            return Err(BodyError::InvalidChunk);
        }

        body.extend_from_slice(&buf[pos..data_end]);
        pos = chunk_end;
    }
}

fn parse_chunk_size(line: &[u8]) -> Result<usize, BodyError> {
    // chunk extensions are ignored
    let size = match line.iter().position(|&b| b == b';') {
        Some(i) => &line[..i],
        None => line,
    };
    let size = std::str::from_utf8(size)
        .map_err(|_| BodyError::InvalidChunk)?
        .trim();

    if size.is_empty() || !size.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(BodyError::InvalidChunk);
    }
    usize::from_str_radix(size, 16).map_err(|_| BodyError::InvalidChunk)
}

/// Whether an interim `100 Continue` should go out before reading the body.
pub fn wants_continue(head: &RequestHead, framing: BodyFraming, buffered: usize) -> bool {
    head.version == "HTTP/1.1" && head.expects_continue() && !framing.is_empty() && buffered == 0
}

fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

fn split_crlf(buf: &[u8]) -> impl Iterator<Item = &[u8]> {
    let mut rest = Some(buf);
    std::iter::from_fn(move || {
        let current = rest?;
        match find_crlf(current) {
            Some(i) => {
                rest = Some(&current[i + 2..]);
                Some(&current[..i])
            }
            None => {
                rest = None;
                Some(current)
            }
        }
    })
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

fn leading_blank_lines(buf: &[u8]) -> usize {
    let mut skip = 0;
    while buf[skip..].starts_with(b"\r\n") {
        skip += 2;
    }
    skip
}
