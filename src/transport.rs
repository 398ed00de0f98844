//! The transport seam: a host-supplied non-blocking byte stream this
//! crate reads requests from and writes responses to. TLS negotiation,
//! socket creation and the event loop itself live with the host; this
//! crate only defines the trait surface it needs, mirroring
//! `log_transport_read`/`log_transport_write` and
//! `_convert_io_status_to_log_proto_status` from
//! `logproto-http-server.c`.

use crate::error::{TransportError, TransportResult};

/// A non-blocking byte-stream endpoint. The host owns the concrete
/// socket (TCP, TLS, or anything else) and the registration with its
/// event loop; this crate only ever sees `read`/`write`.
pub trait Transport {
    fn read(&mut self, buf: &mut [u8]) -> TransportResult<usize>;
    fn write(&mut self, buf: &[u8]) -> TransportResult<usize>;
}

/// How a configured transport name maps onto default port and TLS
/// requirements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportKind {
    Tcp,
    Tls,
    Custom(String),
}

impl TransportKind {
    pub fn default_port(&self) -> u16 {
        match self {
            TransportKind::Tcp => 80,
            TransportKind::Tls => 443,
            TransportKind::Custom(_) => 80,
        }
    }

    pub fn requires_tls(&self) -> bool {
        matches!(self, TransportKind::Tls)
    }

    pub fn allows_tls(&self) -> bool {
        !matches!(self, TransportKind::Tcp)
    }
}

/// Raised while resolving a configured transport name against an
/// (optional) supplied TLS context.
#[derive(Debug, PartialEq, Eq)]
pub enum TransportMapError {
    TlsRequiredButMissing,
    TlsSuppliedButDisallowed,
}

/// Validate a `(transport, has_tls_context)` pair against the mapping
/// rules: `tls` requires a context, `tcp` forbids one, anything else
/// (a custom transport) allows either.
pub fn validate_transport(kind: &TransportKind, has_tls_context: bool) -> Result<(), TransportMapError> {
    if kind.requires_tls() && !has_tls_context {
        return Err(TransportMapError::TlsRequiredButMissing);
    }
    if !kind.allows_tls() && has_tls_context {
        return Err(TransportMapError::TlsSuppliedButDisallowed);
    }
    Ok(())
}

/// Translate an I/O result into the tri-state the protocol state
/// machine switches on, matching
/// `_convert_io_status_to_log_proto_status`.
#[derive(Debug, PartialEq, Eq)]
pub enum IoOutcome {
    /// Bytes were read/written; carries the count.
    Progress(usize),
    /// The transport would block; retry on the next wake-up.
    Again,
    /// The peer closed the connection (read side only).
    Eof,
}

pub fn classify_read(result: TransportResult<usize>) -> Result<IoOutcome, TransportError> {
    match result {
        Ok(0) => Ok(IoOutcome::Eof),
        Ok(n) => Ok(IoOutcome::Progress(n)),
        Err(TransportError::WouldBlock) => Ok(IoOutcome::Again),
        Err(e) => Err(e),
    }
}

pub fn classify_write(result: TransportResult<usize>) -> Result<IoOutcome, TransportError> {
    match result {
        Ok(n) => Ok(IoOutcome::Progress(n)),
        Err(TransportError::WouldBlock) => Ok(IoOutcome::Again),
        Err(e) => Err(e),
    }
}
