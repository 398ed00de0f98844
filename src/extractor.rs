//! Host-supplied collaborators the protocol state machine calls between
//! parsing a request and serializing a response. Concrete extractors
//! (single-message, newline-split text, JSON arrays) are out of scope
//! here — this module specifies only the interface they implement.

use crate::message::{Request, Response};

/// One extracted log record, handed up to whatever pipeline the host
/// wires in. The core never inspects its contents.
pub type LogRecord = Vec<u8>;

/// Turns a request into zero or more log records. Returning `None` or
/// an empty vector means "nothing to post", not an error.
pub trait Extractor {
    fn extract(&self, request: &Request) -> Option<Vec<LogRecord>>;
}

/// Turns a request into the response to send back. Returning `None`
/// tells the state machine to synthesize a `500 Internal Server Error`
/// (still a normal response, not an ERR-phase close).
pub trait ResponseBuilder {
    fn build_response(&self, request: &Request) -> Option<Response>;
}

impl<F> Extractor for F
where
    F: Fn(&Request) -> Option<Vec<LogRecord>>,
{
    fn extract(&self, request: &Request) -> Option<Vec<LogRecord>> {
        self(request)
    }
}

impl<F> ResponseBuilder for F
where
    F: Fn(&Request) -> Option<Response>,
{
    fn build_response(&self, request: &Request) -> Option<Response> {
        self(request)
    }
}
