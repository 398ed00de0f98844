//! Synthesized HTML error pages, for responses the state machine builds
//! itself (400, 413, 500) rather than ones a response builder supplied.
//!
//! Byte-for-byte the same template as `HTTP_ERROR_PAGE_FRONT`/
//! `HTTP_ERROR_PAGE_BACK` in `logproto-http-server.c`.

use crate::message::Response;
use crate::status::status_code_to_line;
use crate::version::Version;

const FRONT: &str = "<html><head><title>syslog-ng</title></head><body><center><h1>";
const BACK: &str = "</h1></center><hr><center>syslog-ng</center></body></html>";

/// Build the error-page body for `code`. Panics if `code` has no known
/// reason phrase — callers only ever pass the fixed set of codes this
/// engine synthesizes itself (400, 413, 500), all of which are in the
/// table.
pub fn error_page_body(code: u16) -> Vec<u8> {
    let reason = status_code_to_line(code).expect("synthesized error codes are always in the status table");
    format!("{}{} {}{}", FRONT, code, reason, BACK).into_bytes()
}

/// A complete error response: the error-page body, `Content-Type:
/// text/html`, `Connection: close`, and mandatory headers applied.
pub fn error_response(version: Version, code: u16) -> Response {
    let mut response = Response::new(version, code);
    response.message.headers.add_header(b"content-type", b"text/html");
    response.message.headers.add_header(b"connection", b"close");
    response.message.take_body(error_page_body(code));
    crate::serializer::add_mandatory_headers(&mut response);
    response
}
