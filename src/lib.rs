//! HTTP ingestion protocol engine: parses HTTP/1.x requests off a
//! non-blocking transport, hands completed requests to a host-supplied
//! extractor/response builder, and serializes the responses back.
#![recursion_limit="100"]

extern crate httparse;
#[macro_use(quick_error)] extern crate quick_error;
#[macro_use] extern crate matches;
#[macro_use] extern crate log;
extern crate socket2;
#[cfg(feature = "date_header")]
extern crate httpdate;

mod buffer;
mod version;
mod status;
mod message;
mod error;
mod serializer;
mod headers;
mod chunked;
mod parser;
mod transport;
mod socket_options;
mod persist;
mod config;
mod extractor;
mod error_page;
mod proto;
mod source;

pub use buffer::ByteBuffer;
pub use config::HttpSourceConfig;
pub use error::{ProtoError, TransportError, TransportResult};
pub use error_page::{error_page_body, error_response};
pub use extractor::{Extractor, LogRecord, ResponseBuilder};
pub use message::{HeaderEntry, HeaderStore, HttpMessage, Request, Response};
pub use parser::{ParsedMessage, Parser, ParserKind};
pub use persist::{connections_key, listen_fd_key, InMemoryPersistStore, PersistPoint, PersistedFd};
pub use proto::{Phase, PrepareAction, ProtocolStateMachine, StepOutcome};
pub use serializer::{add_header, add_mandatory_headers, generate_raw, HeaderError};
pub use socket_options::{Direction, SocketOptions};
pub use source::{AcceptOutcome, ListenerDriver};
pub use status::{is_known_status, status_code_to_line};
pub use transport::{classify_read, classify_write, validate_transport, IoOutcome, Transport, TransportKind, TransportMapError};
pub use version::Version;
