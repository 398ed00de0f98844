//! Per-connection protocol state machine.
//!
//! Drives a single connection through receive, dispatch, and send
//! phases with a `while` loop over an explicit `Phase` enum, mirroring
//! `logproto-http-server.c`'s `State` enum and its
//! `log_proto_http_server_process` driver loop: `_receive_request`,
//! `_send_response`, and `_generate_error_response`.

use std::collections::VecDeque;

use crate::buffer::ByteBuffer;
use crate::error::TransportError;
use crate::error_page::error_response;
use crate::extractor::{Extractor, LogRecord, ResponseBuilder};
use crate::message::Request;
use crate::parser::{ParsedMessage, Parser};
use crate::serializer::{add_mandatory_headers, generate_raw};
use crate::transport::{classify_read, classify_write, IoOutcome, Transport};
use crate::version::Version;

/// One of the four phases a connection cycles through. Mirrors `State`
/// (`STATE_RECEIVE_HTTP_REQUEST` / `STATE_PROCESS_LOG_MESSAGES` /
/// `STATE_SEND_HTTP_RESPONSE` / `STATE_HTTP_ERROR`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Rx,
    Post,
    Tx,
    Err,
}

/// What the host loop should do before calling `process` again, the
/// `prepare` query's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrepareAction {
    ForceScheduleFetch,
    PollReadable,
    PollWritable,
}

/// Why `process` returned control to the host loop.
#[derive(Debug)]
pub enum StepOutcome {
    /// Transport would block; retry after the next readiness
    /// notification.
    Yield,
    /// One log record was produced; post it upstream, then call
    /// `process` again.
    LogRecord(LogRecord),
    /// The connection is done: either the peer closed cleanly after a
    /// normal response, or an error response finished draining.
    Closed,
    /// An unrecoverable transport error; drop the connection.
    TransportError(TransportError),
}

/// The state threaded through one connection's lifetime.
pub struct ProtocolStateMachine {
    phase: Phase,
    in_buf: ByteBuffer,
    out_buf: ByteBuffer,
    parser: Parser,
    pending_records: VecDeque<LogRecord>,
    /// Version to use for responses synthesized before a request has
    /// been fully parsed (400, 413) — HTTP/1.1 is always safe here.
    default_version: Version,
}

impl ProtocolStateMachine {
    pub fn new(max_request_size: usize) -> ProtocolStateMachine {
        ProtocolStateMachine {
            phase: Phase::Rx,
            in_buf: ByteBuffer::with_capacity(max_request_size),
            out_buf: ByteBuffer::empty(),
            parser: Parser::new_request(),
            pending_records: VecDeque::new(),
            default_version: Version::HTTP_11,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// What the host should poll for before the next `process` call.
    pub fn prepare(&self) -> PrepareAction {
        match self.phase {
            Phase::Post => PrepareAction::ForceScheduleFetch,
            Phase::Tx | Phase::Err => {
                if self.out_buf.is_empty() {
                    PrepareAction::PollWritable
                } else {
                    PrepareAction::ForceScheduleFetch
                }
            }
            Phase::Rx => {
                if self.in_buf.readable() > 0 {
                    PrepareAction::ForceScheduleFetch
                } else {
                    PrepareAction::PollReadable
                }
            }
        }
    }

    /// Drive the connection until it must return control to the host:
    /// a transport would-block, a terminal close/error, or one
    /// extracted log record ready to post upstream.
    pub fn process(
        &mut self,
        transport: &mut dyn Transport,
        extractor: &dyn Extractor,
        response_builder: &dyn ResponseBuilder,
    ) -> StepOutcome {
        loop {
            match self.phase {
                Phase::Rx => match self.receive_step(transport, extractor, response_builder) {
                    Ok(RxResult::Continue) => continue,
                    Ok(RxResult::Yield) => return StepOutcome::Yield,
                    Ok(RxResult::Closed) => return StepOutcome::Closed,
                    Err(e) => return StepOutcome::TransportError(e),
                },
                Phase::Post => match self.pending_records.pop_front() {
                    Some(record) => {
                        if self.pending_records.is_empty() {
                            self.phase = Phase::Tx;
                        }
                        return StepOutcome::LogRecord(record);
                    }
                    None => {
                        self.phase = Phase::Tx;
                        continue;
                    }
                },
                Phase::Tx | Phase::Err => match self.send_step(transport) {
                    Ok(true) => {
                        let was_err = self.phase == Phase::Err;
                        self.out_buf.deallocate();
                        if was_err {
                            return StepOutcome::Closed;
                        }
                        self.phase = Phase::Rx;
                        self.parser.skip();
                        continue;
                    }
                    Ok(false) => return StepOutcome::Yield,
                    Err(e) => return StepOutcome::TransportError(e),
                },
            }
        }
    }

    fn receive_step(
        &mut self,
        transport: &mut dyn Transport,
        extractor: &dyn Extractor,
        response_builder: &dyn ResponseBuilder,
    ) -> Result<RxResult, TransportError> {
        if self.in_buf.free_back() > 0 {
            match classify_read(transport.read(self.in_buf.free_slice_mut()))? {
                IoOutcome::Progress(n) => self.in_buf.advance_write(n),
                IoOutcome::Again => return Ok(RxResult::Yield),
                IoOutcome::Eof => {
                    return Ok(self.handle_eof());
                }
            }
        }

        if self.parser.feed(&mut self.in_buf).is_err() {
            self.enter_error(400);
            return Ok(RxResult::Continue);
        }

        if self.parser.is_complete() {
            self.in_buf.compact();
            if let Some(ParsedMessage::Request(request)) = self.parser.take_message() {
                debug!(
                    "Incoming HTTP request; method={} url={}",
                    request.method,
                    String::from_utf8_lossy(&request.url)
                );
                self.dispatch(request, extractor, response_builder);
            }
            return Ok(RxResult::Continue);
        }

        if self.in_buf.is_full() {
            self.enter_error(413);
            return Ok(RxResult::Continue);
        }

        Ok(RxResult::Yield)
    }

    fn handle_eof(&mut self) -> RxResult {
        match self.parser.signal_eof() {
            Ok(()) => RxResult::Closed,
            Err(_) => {
                self.enter_error(400);
                RxResult::Continue
            }
        }
    }

    /// Extract log records and build the response for a completed
    /// request. Records queue into POST so they are handed to the host
    /// one at a time before the response is serialized to the wire,
    /// preserving "log records precede their response" ordering; with
    /// nothing to post the state machine goes straight to TX.
    fn dispatch(&mut self, request: Request, extractor: &dyn Extractor, response_builder: &dyn ResponseBuilder) {
        let mut response = response_builder.build_response(&request).unwrap_or_else(|| {
            error!("No HTTP response, generating 'Internal Server Error' response");
            error_response(request.message.version, 500)
        });
        add_mandatory_headers(&mut response);
        let bytes = generate_raw(&response).unwrap_or_else(|_| {
            let fallback = error_response(request.message.version, 500);
            generate_raw(&fallback).expect("500 error page is always serializable")
        });
        self.out_buf.adopt(bytes);

        match extractor.extract(&request) {
            Some(records) if !records.is_empty() => {
                self.pending_records.extend(records);
                self.phase = Phase::Post;
            }
            _ => self.phase = Phase::Tx,
        }
    }

    fn enter_error(&mut self, code: u16) {
        match code {
            413 => error!("HTTP request is too long"),
            _ => error!("Invalid HTTP request, code={}", code),
        }
        let response = error_response(self.default_version, code);
        let bytes = generate_raw(&response).expect("synthesized error responses are always serializable");
        self.out_buf.adopt(bytes);
        self.phase = Phase::Err;
    }

    fn send_step(&mut self, transport: &mut dyn Transport) -> Result<bool, TransportError> {
        match classify_write(transport.write(self.out_buf.readable_slice()))? {
            IoOutcome::Progress(n) => {
                self.out_buf.advance_read(n);
                Ok(self.out_buf.is_empty())
            }
            IoOutcome::Again => Ok(false),
            IoOutcome::Eof => Ok(false),
        }
    }
}

enum RxResult {
    Continue,
    Yield,
    Closed,
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::message::Response;
    use std::collections::VecDeque as Deque;

    struct ScriptedTransport {
        reads: Deque<TransportResultScript>,
        written: Vec<u8>,
    }

    enum TransportResultScript {
        Data(Vec<u8>),
        Block,
        Eof,
    }

    impl ScriptedTransport {
        fn new(reads: Vec<TransportResultScript>) -> ScriptedTransport {
            ScriptedTransport { reads: reads.into(), written: Vec::new() }
        }
    }

    impl Transport for ScriptedTransport {
        fn read(&mut self, buf: &mut [u8]) -> crate::error::TransportResult<usize> {
            match self.reads.pop_front() {
                Some(TransportResultScript::Data(bytes)) => {
                    let n = bytes.len().min(buf.len());
                    buf[..n].copy_from_slice(&bytes[..n]);
                    Ok(n)
                }
                Some(TransportResultScript::Block) | None => Err(TransportError::WouldBlock),
                Some(TransportResultScript::Eof) => Ok(0),
            }
        }

        fn write(&mut self, buf: &[u8]) -> crate::error::TransportResult<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }
    }

    fn echo_builder(_req: &Request) -> Option<Response> {
        let mut resp = Response::new(Version::HTTP_11, 200);
        resp.message.take_body(b"ok".to_vec());
        Some(resp)
    }

    fn no_records(_req: &Request) -> Option<Vec<LogRecord>> {
        None
    }

    #[test]
    fn full_request_response_cycle() {
        let request = b"GET / HTTP/1.1\r\nContent-Length: 0\r\n\r\n".to_vec();
        let mut transport = ScriptedTransport::new(vec![TransportResultScript::Data(request)]);
        let mut sm = ProtocolStateMachine::new(4096);

        let outcome = sm.process(&mut transport, &no_records, &echo_builder);
        assert!(matches!(outcome, StepOutcome::Yield));
        assert!(transport.written.starts_with(b"HTTP/1.1 200 OK\r\n"));
        assert!(transport.written.ends_with(b"ok"));
        assert_eq!(sm.phase(), Phase::Rx);
    }

    #[test]
    fn oversize_request_yields_413_then_closes() {
        let huge = vec![b'a'; 32];
        let mut transport = ScriptedTransport::new(vec![TransportResultScript::Data(huge)]);
        let mut sm = ProtocolStateMachine::new(16);

        let outcome = sm.process(&mut transport, &no_records, &echo_builder);
        assert!(matches!(outcome, StepOutcome::Closed));
        assert!(transport.written.starts_with(b"HTTP/1.1 413 Payload Too Large\r\n"));
    }

    #[test]
    fn malformed_request_yields_400_then_closes() {
        let garbage = b"not an http request\r\n\r\n".to_vec();
        let mut transport = ScriptedTransport::new(vec![TransportResultScript::Data(garbage)]);
        let mut sm = ProtocolStateMachine::new(4096);

        let outcome = sm.process(&mut transport, &no_records, &echo_builder);
        assert!(matches!(outcome, StepOutcome::Closed));
        assert!(transport.written.starts_with(b"HTTP/1.1 400 Bad Request\r\n"));
    }

    #[test]
    fn missing_response_builder_synthesizes_500() {
        fn no_response(_req: &Request) -> Option<Response> {
            None
        }
        let request = b"GET / HTTP/1.1\r\n\r\n".to_vec();
        let mut transport = ScriptedTransport::new(vec![TransportResultScript::Data(request)]);
        let mut sm = ProtocolStateMachine::new(4096);

        let outcome = sm.process(&mut transport, &no_records, &no_response);
        assert!(matches!(outcome, StepOutcome::Yield));
        assert!(transport.written.starts_with(b"HTTP/1.1 500 Internal Server Error\r\n"));
    }

    #[test]
    fn peer_eof_with_no_request_closes_cleanly() {
        let mut transport = ScriptedTransport::new(vec![TransportResultScript::Eof]);
        let mut sm = ProtocolStateMachine::new(4096);
        let outcome = sm.process(&mut transport, &no_records, &echo_builder);
        assert!(matches!(outcome, StepOutcome::Closed));
    }

    #[test]
    fn would_block_yields_without_writing() {
        let mut transport = ScriptedTransport::new(vec![TransportResultScript::Block]);
        let mut sm = ProtocolStateMachine::new(4096);
        let outcome = sm.process(&mut transport, &no_records, &echo_builder);
        assert!(matches!(outcome, StepOutcome::Yield));
        assert!(transport.written.is_empty());
    }
}
