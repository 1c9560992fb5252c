use echod::http::request::{BodyError, Method, Request, RequestBuilder};

fn get(headers: &[(&str, &str)]) -> Request {
    headers
        .iter()
        .fold(RequestBuilder::new().method(Method::GET).path("/"), |b, (k, v)| {
            b.header(k, *v)
        })
        .build()
        .unwrap()
}

#[test]
fn test_request_host_is_not_a_header() {
    let req = get(&[("Host", "example.com"), ("Content-Type", "application/json")]);

    assert_eq!(req.host.as_deref(), Some("example.com"));
    assert!(req.header_values("Host").is_empty());
    assert_eq!(req.header_values("content-type"), ["application/json"]);
}

#[test]
fn test_request_header_values() {
    let req = get(&[("Accept", "text/plain"), ("accept", "*/*")]);

    assert_eq!(req.header_values("ACCEPT"), ["text/plain", "*/*"]);
    assert!(req.header_values("X-None").is_empty());
}

#[test]
fn test_request_keep_alive_default_http11() {
    assert!(get(&[]).keep_alive());
}

#[test]
fn test_request_keep_alive_connection_close() {
    let req = get(&[("Connection", "close")]);
    assert!(!req.keep_alive());
}

#[test]
fn test_request_keep_alive_token_list() {
    let req = get(&[("Connection", "Upgrade, Close")]);
    assert!(!req.keep_alive());
}

#[test]
fn test_request_http10_closes_by_default() {
    let req = RequestBuilder::new()
        .method(Method::GET)
        .path("/")
        .version("HTTP/1.0")
        .build()
        .unwrap();
    assert!(!req.keep_alive());
}

#[test]
fn test_request_http10_keep_alive_requested() {
    let req = RequestBuilder::new()
        .method(Method::GET)
        .path("/")
        .version("HTTP/1.0")
        .header("Connection", "Keep-Alive")
        .build()
        .unwrap();
    assert!(req.keep_alive());
}

#[test]
fn test_request_unreadable_body_never_keeps_alive() {
    let req = RequestBuilder::new()
        .method(Method::POST)
        .path("/echo")
        .body_error(BodyError::InvalidChunk)
        .build()
        .unwrap();
    assert!(!req.keep_alive());
}

#[test]
fn test_request_route_strips_query() {
    let req = RequestBuilder::new()
        .method(Method::GET)
        .path("/echo?x=1")
        .build()
        .unwrap();
    assert_eq!(req.route(), "/echo");
}

#[test]
fn test_request_route_strips_scheme_and_authority() {
    let req = RequestBuilder::new()
        .method(Method::POST)
        .path("http://example.com:8080/echo?x=1")
        .build()
        .unwrap();
    assert_eq!(req.route(), "/echo");
}

#[test]
fn test_request_builder_defaults_version() {
    let req = get(&[]);
    assert_eq!(req.version, "HTTP/1.1");
    assert_eq!(req.body, Ok(Vec::new()));
}

#[test]
fn test_request_builder_requires_method_and_path() {
    assert_eq!(RequestBuilder::new().path("/").build().unwrap_err(), "method missing");
    assert_eq!(
        RequestBuilder::new().method(Method::GET).build().unwrap_err(),
        "path missing"
    );
}

#[test]
fn test_method_display() {
    assert_eq!(Method::DELETE.to_string(), "DELETE");
    assert_eq!(Method::Extension("PURGE".into()).to_string(), "PURGE");
}

#[test]
fn test_method_from_str_rejects_non_tokens() {
    assert_eq!(Method::from_str(""), None);
    assert_eq!(Method::from_str("G\"ET"), None);
}
