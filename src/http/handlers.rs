//! Request routing and the two endpoints.
//!
//! `/echo` is matched exactly; every other path falls through to the hello
//! handler. Handlers never fail: problems are logged and turned into a
//! response.

use tracing::{info, warn};

use crate::host;
use crate::http::request::{Headers, Method, Request};
use crate::http::response::{Response, StatusCode};

pub const ECHO_ROUTE: &str = "/echo";

/// Body served by `/echo` for anything other than POST.
pub const ECHO_INFO: &str = "Echo server is running. Send POST request to echo content.\n";

pub const BODY_READ_ERROR: &str = "Error reading request body";

pub fn handle(req: Request, peer: &str) -> Response {
    info!(
        source_ip = peer,
        method = %req.method,
        path = req.route(),
        "HTTP request received"
    );

    if req.route() == ECHO_ROUTE {
        echo(req, peer)
    } else {
        hello(&req, peer)
    }
}

/// Greets GET requests with the host name and the headers received.
pub fn hello(req: &Request, peer: &str) -> Response {
    if req.method != Method::GET {
        info!(source_ip = peer, "Served HTTP info page");
        return Response::text(format!("Ignoring HTTP method {}\n", req.method));
    }

    let headers = render_headers(&req.headers).unwrap_or_else(|e| {
        warn!(source_ip = peer, error = %e, "Could not serialize request headers");
        String::new()
    });

    let hostname = host::hostname().unwrap_or_else(|e| {
        warn!(error = %e, "Could not determine hostname");
        String::new()
    });

    info!(source_ip = peer, "Returned home to client");
    Response::text(format!(
        "Hello from {hostname}\nRequest headers: {headers}\n"
    ))
}

/// Sends a POST body straight back.
pub fn echo(req: Request, peer: &str) -> Response {
    if req.method != Method::POST {
        info!(source_ip = peer, "Served HTTP info page");
        return Response::text(ECHO_INFO);
    }

    match req.body {
        Ok(body) => {
            info!(source_ip = peer, bytes = body.len(), "Echoed data to HTTP client");
            Response::text(body)
        }
        Err(e) => {
            warn!(source_ip = peer, error = %e, "Error reading request body");
            Response::error(StatusCode::BadRequest, BODY_READ_ERROR)
        }
    }
}

/// Renders headers as a JSON object of name to list of values.
///
/// `<`, `>` and `&` (plus U+2028/U+2029) are escaped so the output is safe
/// to paste into HTML.
pub fn render_headers(headers: &Headers) -> serde_json::Result<String> {
    let json = serde_json::to_string(headers)?;

    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        match c {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c => out.push(c),
        }
    }
    Ok(out)
}
