//! Integration-level coverage of behavior that cuts across modules:
//! backpressure on partial writes, the connection cap, and
//! cross-reload continuity of the listener driver.

extern crate httpingest;

use std::collections::VecDeque;

use httpingest::{
    AcceptOutcome, Extractor, HttpSourceConfig, InMemoryPersistStore, ListenerDriver, LogRecord,
    PersistedFd, Phase, ProtocolStateMachine, Request, Response, ResponseBuilder, StepOutcome,
    Transport, TransportError, TransportResult, Version,
};

struct ScriptedTransport {
    reads: VecDeque<Vec<u8>>,
    write_block_after: Option<usize>,
    written: Vec<u8>,
}

impl ScriptedTransport {
    fn new(reads: Vec<Vec<u8>>) -> ScriptedTransport {
        ScriptedTransport { reads: reads.into(), write_block_after: None, written: Vec::new() }
    }
}

impl Transport for ScriptedTransport {
    fn read(&mut self, buf: &mut [u8]) -> TransportResult<usize> {
        match self.reads.pop_front() {
            Some(bytes) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                Ok(n)
            }
            None => Err(TransportError::WouldBlock),
        }
    }

    fn write(&mut self, buf: &[u8]) -> TransportResult<usize> {
        let allowed = self.write_block_after.unwrap_or(buf.len()).min(buf.len());
        if allowed == 0 {
            return Err(TransportError::WouldBlock);
        }
        self.written.extend_from_slice(&buf[..allowed]);
        if let Some(remaining) = self.write_block_after.as_mut() {
            *remaining -= allowed;
        }
        Ok(allowed)
    }
}

fn echo_builder(_req: &Request) -> Option<Response> {
    let mut resp = Response::new(Version::HTTP_11, 200);
    resp.message.take_body(b"hi".to_vec());
    Some(resp)
}

fn no_records(_req: &Request) -> Option<Vec<LogRecord>> {
    None
}

#[test]
fn oversize_request_gets_exactly_one_413_then_closes() {
    // Fill in_buf to capacity with header bytes that never complete a
    // request line (no \r\n\r\n).
    let filler = vec![b'x'; 64];
    let mut transport = ScriptedTransport::new(vec![filler]);
    let mut sm = ProtocolStateMachine::new(64);

    let outcome = sm.process(&mut transport, &no_records, &echo_builder);
    assert!(matches!(outcome, StepOutcome::Closed));
    // Exactly one 413 response was written, nothing appended after it.
    assert!(transport.written.starts_with(b"HTTP/1.1 413 Payload Too Large\r\n"));
    assert!(transport.written.windows(b"text/html".len()).any(|w| w == b"text/html"));
    assert!(transport.written.windows(b"close".len()).any(|w| w == b"close"));
}

#[test]
fn partial_write_resumes_without_duplication_or_loss() {
    let request = b"GET / HTTP/1.1\r\nContent-Length: 0\r\n\r\n".to_vec();
    let mut transport = ScriptedTransport::new(vec![request]);
    transport.write_block_after = Some(5);
    let mut sm = ProtocolStateMachine::new(4096);

    let first = sm.process(&mut transport, &no_records, &echo_builder);
    assert!(matches!(first, StepOutcome::Yield));
    assert_eq!(transport.written.len(), 5);
    assert_eq!(sm.phase(), Phase::Tx);

    transport.write_block_after = None;
    let second = sm.process(&mut transport, &no_records, &echo_builder);
    assert!(matches!(second, StepOutcome::Yield));
    assert!(transport.written.starts_with(b"HTTP/1.1 200 OK\r\n"));
    assert!(transport.written.ends_with(b"hi"));
}

#[test]
fn connection_cap_rejects_beyond_max_and_leaves_live_unchanged() {
    let mut cfg = HttpSourceConfig::new();
    cfg.max_connections(2);
    let mut driver = ListenerDriver::new(cfg.done());

    let results = driver.accept_batch(vec![1, 2, 3].into_iter());
    assert_eq!(results[2].1, AcceptOutcome::RejectedAtCapacity);
    assert_eq!(driver.connection_count(), 2);

    // Rejected fd did not get added to live.
    let more = driver.accept_batch(vec![4].into_iter());
    assert_eq!(more[0].1, AcceptOutcome::RejectedAtCapacity);
    assert_eq!(driver.connection_count(), 2);
}

#[test]
fn cross_reload_continuity_preserves_listen_fd_and_live_connections() {
    let mut cfg = HttpSourceConfig::new();
    cfg.max_connections(10);
    let mut driver = ListenerDriver::new(cfg.done());
    driver.accept_batch(vec![100, 101].into_iter());

    let mut store = InMemoryPersistStore::new();
    driver.teardown(&mut store, "http-source", Some(55));

    let mut cfg2 = HttpSourceConfig::new();
    cfg2.max_connections(10);
    let mut reloaded = ListenerDriver::new(cfg2.done());
    let fd = reloaded.restore(&mut store, "http-source");

    assert_eq!(fd, PersistedFd::Fd(55));
    assert_eq!(reloaded.connection_count(), 2);
}

#[test]
fn log_records_precede_response_bytes_on_the_wire() {
    fn two_records(_req: &Request) -> Option<Vec<LogRecord>> {
        Some(vec![b"line-one".to_vec(), b"line-two".to_vec()])
    }

    let request = b"GET / HTTP/1.1\r\nContent-Length: 0\r\n\r\n".to_vec();
    let mut transport = ScriptedTransport::new(vec![request]);
    let mut sm = ProtocolStateMachine::new(4096);

    let first = sm.process(&mut transport, &two_records, &echo_builder);
    let record = match first {
        StepOutcome::LogRecord(r) => r,
        other => panic!("expected a log record, got {:?}", other),
    };
    assert_eq!(record, b"line-one".to_vec());
    assert!(transport.written.is_empty());

    let second = sm.process(&mut transport, &two_records, &echo_builder);
    match second {
        StepOutcome::LogRecord(r) => assert_eq!(r, b"line-two".to_vec()),
        other => panic!("expected a log record, got {:?}", other),
    }
    assert!(transport.written.is_empty());

    let third = sm.process(&mut transport, &two_records, &echo_builder);
    assert!(matches!(third, StepOutcome::Yield));
    assert!(transport.written.starts_with(b"HTTP/1.1 200 OK\r\n"));
}
