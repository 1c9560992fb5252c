use echod::http::parser::ParseError;
use echod::http::response::{Response, ResponseBuilder, StatusCode};
use echod::http::writer::serialize_response;

#[test]
fn test_status_code_as_u16() {
    assert_eq!(StatusCode::Ok.as_u16(), 200);
    assert_eq!(StatusCode::BadRequest.as_u16(), 400);
    assert_eq!(StatusCode::RequestHeaderFieldsTooLarge.as_u16(), 431);
    assert_eq!(StatusCode::NotImplemented.as_u16(), 501);
    assert_eq!(StatusCode::HttpVersionNotSupported.as_u16(), 505);
}

#[test]
fn test_status_code_reason_phrase() {
    assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    assert_eq!(StatusCode::BadRequest.reason_phrase(), "Bad Request");
    assert_eq!(
        StatusCode::RequestHeaderFieldsTooLarge.reason_phrase(),
        "Request Header Fields Too Large"
    );
}

#[test]
fn test_response_builder_basic() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .body(b"Hello, World!".to_vec())
        .build();

    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(response.body, b"Hello, World!".to_vec());
}

#[test]
fn test_response_builder_auto_content_length() {
    let body = b"This is the body".to_vec();
    let response = ResponseBuilder::new(StatusCode::Ok).body(body.clone()).build();

    assert_eq!(response.headers["Content-Length"], body.len().to_string());
}

#[test]
fn test_response_builder_preserves_custom_content_length() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Length", "999")
        .body(b"test".to_vec())
        .build();

    assert_eq!(response.headers["Content-Length"], "999");
}

#[test]
fn test_response_builder_empty_body() {
    let response = ResponseBuilder::new(StatusCode::Ok).build();

    assert!(response.body.is_empty());
    assert_eq!(response.headers["Content-Length"], "0");
}

#[test]
fn test_response_text_helper() {
    let response = Response::text("hi\n");

    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(response.headers["Content-Type"], "text/plain");
    assert_eq!(response.body, b"hi\n");
}

#[test]
fn test_response_error_helper() {
    let response = Response::error(StatusCode::BadRequest, "Error reading request body");

    assert_eq!(response.status, StatusCode::BadRequest);
    assert_eq!(response.headers["Content-Type"], "text/plain; charset=utf-8");
    assert_eq!(response.headers["X-Content-Type-Options"], "nosniff");
    assert_eq!(response.body, b"Error reading request body\n");
}

#[test]
fn test_response_for_parse_errors() {
    let cases = [
        (ParseError::InvalidHeader, StatusCode::BadRequest),
        (ParseError::InvalidContentLength, StatusCode::BadRequest),
        (ParseError::HeadTooLarge, StatusCode::RequestHeaderFieldsTooLarge),
        (ParseError::UnsupportedTransferEncoding, StatusCode::NotImplemented),
        (ParseError::UnsupportedVersion, StatusCode::HttpVersionNotSupported),
    ];

    for (err, status) in cases {
        let response = Response::for_parse_error(&err);
        assert_eq!(response.status, status);
        assert_eq!(response.headers["Connection"], "close");
    }
}

#[test]
fn test_response_strip_body_keeps_length() {
    let mut response = Response::text("twelve bytes");
    response.strip_body();

    assert!(response.body.is_empty());
    assert_eq!(response.headers["Content-Length"], "12");
}

#[test]
fn test_serialize_response_layout() {
    let response = ResponseBuilder::new(StatusCode::BadRequest)
        .header("Content-Type", "text/plain")
        .body(b"no".to_vec())
        .build();
    let raw = String::from_utf8(serialize_response(&response)).unwrap();

    assert!(raw.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    assert!(raw.contains("Content-Type: text/plain\r\n"));
    assert!(raw.contains("Content-Length: 2\r\n"));
    assert!(raw.ends_with("\r\n\r\nno"));
}
