//! Response serializer: turns a [`Response`](crate::message::Response)
//! into its on-wire byte form.
//!
//! The whole response (headers, status, body) is already a fully-built
//! record by the time `generate_raw` runs, so there's no streaming
//! state machine here, just a single function. Headers are still
//! validated and added one at a time via `add_header` before
//! `generate_raw` assembles the final bytes.

use crate::message::Response;
use crate::status::status_code_to_line;

quick_error! {
    #[derive(Debug)]
    pub enum HeaderError {
        InvalidHeaderName {
            description("header name contains invalid characters")
        }
        InvalidHeaderValue {
            description("header value contains invalid characters")
        }
    }
}

fn invalid_header(value: &[u8]) -> bool {
    value.iter().any(|&x| x == b'\r' || x == b'\n')
}

/// Validated `add_header`: rejects CR/LF in either the name or the
/// value before anything is appended, preventing header injection.
pub fn add_header(response: &mut Response, name: &[u8], value: &[u8]) -> Result<(), HeaderError> {
    if invalid_header(name) {
        return Err(HeaderError::InvalidHeaderName);
    }
    if invalid_header(value) {
        return Err(HeaderError::InvalidHeaderValue);
    }
    response.message.headers.add_header(name, value);
    Ok(())
}

/// Insert `Content-Length`, `Server`, and (with the `date_header`
/// feature) `Date` if the builder didn't already set them. Safe to call
/// more than once: the second call sees the headers already present
/// and is a no-op. Server name mirrors the error page's branding.
pub fn add_mandatory_headers(response: &mut Response) {
    if !response.message.headers.header_exists(b"content-length") {
        let len = response.message.body.len();
        response
            .message
            .headers
            .add_header(b"content-length", len.to_string().as_bytes());
    }
    if !response.message.headers.header_exists(b"server") {
        response.message.headers.add_header(b"server", b"syslog-ng");
    }
    #[cfg(feature = "date_header")]
    {
        if !response.message.headers.header_exists(b"date") {
            let now = httpdate::fmt_http_date(std::time::SystemTime::now());
            response.message.headers.add_header(b"date", now.as_bytes());
        }
    }
}

/// Produce the full on-wire byte sequence for `response`.
///
/// Fails before writing any bytes if `response.status` has no known
/// reason phrase.
pub fn generate_raw(response: &Response) -> Result<Vec<u8>, crate::error::ProtoError> {
    let reason = status_code_to_line(response.status)
        .ok_or(crate::error::ProtoError::StatusCodeUnknown(response.status))?;

    let mut out = Vec::with_capacity(128 + response.message.body.len());
    out.extend_from_slice(
        format!(
            "HTTP/{}.{} {} {}\r\n",
            response.message.version.major(),
            response.message.version.minor(),
            response.status,
            reason
        )
        .as_bytes(),
    );
    response.message.headers.write_raw(&mut out);
    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(&response.message.body);
    Ok(out)
}
