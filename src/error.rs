//! The error taxonomy for the protocol engine: parse failures, size
//! limits, transport conditions, and the header-serialization errors
//! reused from [`crate::serializer`]. Built with `quick_error`, the
//! same pattern used for the `HeaderError` and driver-level error
//! enums elsewhere in this crate.

use std::fmt;
use std::io;

use crate::serializer::HeaderError;

quick_error! {
    #[derive(Debug)]
    pub enum ProtoError {
        ParseError(err: httparse::Error) {
            description("malformed HTTP request")
            display("parse error: {}", err)
        }
        UpgradeNotSupported {
            description("HTTP Upgrade is not supported")
        }
        PrematureEof {
            description("connection closed mid-message")
        }
        PayloadTooLarge {
            description("request exceeds the input buffer capacity")
        }
        StatusCodeUnknown(code: u16) {
            description("status code has no known reason phrase")
            display("status code {} has no known reason phrase", code)
        }
        Header(err: HeaderError) {
            from()
            description("header serialization error")
            display("header error: {}", err)
        }
        ChunkSize(err: httparse::InvalidChunkSize) {
            from()
            description("invalid chunk size")
        }
        Io(err: io::Error) {
            from()
            description("I/O error")
            display("I/O error: {}", err)
        }
    }
}

impl From<httparse::Error> for ProtoError {
    fn from(err: httparse::Error) -> ProtoError {
        ProtoError::ParseError(err)
    }
}

/// Connection-facing outcome of a read/write against the transport.
#[derive(Debug)]
pub enum TransportError {
    WouldBlock,
    Io(io::Error),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TransportError::WouldBlock => write!(f, "would block"),
            TransportError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl From<io::Error> for TransportError {
    fn from(err: io::Error) -> TransportError {
        if err.kind() == io::ErrorKind::WouldBlock {
            TransportError::WouldBlock
        } else {
            TransportError::Io(err)
        }
    }
}

pub type TransportResult<T> = Result<T, TransportError>;
