//! Streaming HTTP parser wrapper.
//!
//! `httparse` itself is a one-shot header parser: handed a byte slice it
//! either finds a complete header block or says `Partial`. The original
//! C parser (built on a `http_parser`-style state machine, see
//! `original_source/lib/http/http-parser.c`) streams one byte at a time
//! through callbacks (`on_message_begin`, `on_header_field`, ...);
//! wrapping `httparse` collapses that into two stages run against the
//! connection's own buffer instead: header parsing (one `httparse` call
//! per `feed`, retried as more bytes arrive) and body parsing (delegated
//! to [`crate::chunked::ChunkedState`] for chunked bodies, straight byte
//! counting for fixed-length ones).

use httparse::Status;

use crate::buffer::ByteBuffer;
use crate::chunked::ChunkedState;
use crate::error::ProtoError;
use crate::headers::{is_chunked, is_upgrade};
use crate::message::{Request, Response};
use crate::version::Version;

const MAX_HEADERS: usize = 64;

#[derive(Debug)]
enum BodyKind {
    None,
    Fixed(u64),
    Chunked(ChunkedState),
}

#[derive(Debug)]
enum Stage {
    Headers,
    Body(BodyKind),
    /// A complete message is waiting for `take_message`/`skip`.
    Paused,
}

/// Either half of a message the parser can produce.
#[derive(Debug)]
pub enum ParsedMessage {
    Request(Request),
    Response(Response),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserKind {
    Request,
    Response,
}

/// A streaming, pause-on-complete HTTP message parser bound to one
/// connection's input buffer.
#[derive(Debug)]
pub struct Parser {
    kind: ParserKind,
    stage: Stage,
    current: Option<ParsedMessage>,
    last_error: Option<String>,
}

impl Parser {
    pub fn new_request() -> Parser {
        Parser { kind: ParserKind::Request, stage: Stage::Headers, current: None, last_error: None }
    }

    pub fn new_response() -> Parser {
        Parser { kind: ParserKind::Response, stage: Stage::Headers, current: None, last_error: None }
    }

    fn append_body(&mut self, bytes: &[u8]) {
        match &mut self.current {
            Some(ParsedMessage::Request(r)) => r.message.append_body(bytes),
            Some(ParsedMessage::Response(r)) => r.message.append_body(bytes),
            None => unreachable!("append_body called with no in-flight message"),
        }
    }

    fn fail(&mut self, err: ProtoError) -> Result<usize, ProtoError> {
        self.last_error = Some(err.to_string());
        Err(err)
    }

    /// Feed newly-unread bytes from the connection's input buffer.
    ///
    /// Consumes as much as can be parsed right now and advances `buf`'s
    /// read cursor accordingly, returning the number of bytes consumed.
    /// Once a message is complete, the parser pauses: further calls
    /// return `Ok(0)` until [`Parser::take_message`] or [`Parser::skip`]
    /// is called.
    pub fn feed(&mut self, buf: &mut ByteBuffer) -> Result<usize, ProtoError> {
        let mut total = 0usize;
        loop {
            match &mut self.stage {
                Stage::Paused => return Ok(total),
                Stage::Headers => {
                    match self.parse_headers(buf) {
                        Ok(Some(consumed)) => {
                            total += consumed;
                            continue;
                        }
                        Ok(None) => return Ok(total),
                        Err(e) => return self.fail(e).map(|_| 0),
                    }
                }
                Stage::Body(BodyKind::None) => {
                    self.stage = Stage::Paused;
                    return Ok(total);
                }
                Stage::Body(BodyKind::Fixed(remaining)) => {
                    let avail = buf.readable() as u64;
                    if avail == 0 {
                        return Ok(total);
                    }
                    let take = (*remaining).min(avail) as usize;
                    let bytes = buf.readable_slice()[..take].to_vec();
                    self.append_body(&bytes);
                    buf.advance_read(take);
                    total += take;
                    *remaining -= take as u64;
                    if *remaining == 0 {
                        self.stage = Stage::Paused;
                    }
                    return Ok(total);
                }
                Stage::Body(BodyKind::Chunked(state)) => {
                    state.parse(buf)?;
                    let n = state.buffered();
                    if n > 0 {
                        let bytes = buf.readable_slice()[..n].to_vec();
                        self.append_body(&bytes);
                        buf.advance_read(n);
                        state.consume(n);
                        total += n;
                    }
                    if state.is_done() {
                        self.stage = Stage::Paused;
                    }
                    return Ok(total);
                }
            }
        }
    }

    /// Try to parse the header block out of `buf`'s unread bytes.
    /// Returns `Ok(Some(header_len))` on success (and transitions
    /// `self.stage` to `Body`/`Paused`), `Ok(None)` if more bytes are
    /// needed, or an error for malformed input / unsupported Upgrade.
    fn parse_headers(&mut self, buf: &mut ByteBuffer) -> Result<Option<usize>, ProtoError> {
        let data = buf.readable_slice();
        let mut raw_headers = [httparse::EMPTY_HEADER; MAX_HEADERS];

        let (header_len, message, upgrade) = match self.kind {
            ParserKind::Request => {
                let mut req = httparse::Request::new(&mut raw_headers);
                match req.parse(data)? {
                    Status::Partial => return Ok(None),
                    Status::Complete(header_len) => {
                        let version = Version::from_httparse_minor(req.version.unwrap_or(1));
                        let mut request = Request::new(version);
                        request.method = req.method.unwrap_or("").to_ascii_uppercase();
                        request.url = req.path.unwrap_or("").as_bytes().to_vec();
                        let upgrade = scan_headers(&mut request.message.headers, req.headers.iter());
                        (header_len, ParsedMessage::Request(request), upgrade)
                    }
                }
            }
            ParserKind::Response => {
                let mut res = httparse::Response::new(&mut raw_headers);
                match res.parse(data)? {
                    Status::Partial => return Ok(None),
                    Status::Complete(header_len) => {
                        let version = Version::from_httparse_minor(res.version.unwrap_or(1));
                        let mut response = Response::new(version, res.code.unwrap_or(0));
                        let upgrade = scan_headers(&mut response.message.headers, res.headers.iter());
                        (header_len, ParsedMessage::Response(response), upgrade)
                    }
                }
            }
        };

        if upgrade {
            return Err(ProtoError::UpgradeNotSupported);
        }

        let content_length = match &message {
            ParsedMessage::Request(r) => r.message.headers.get_header(b"content-length").map(parse_len),
            ParsedMessage::Response(r) => r.message.headers.get_header(b"content-length").map(parse_len),
        }
        .flatten();
        let chunked = match &message {
            ParsedMessage::Request(r) => r.message.headers.get_header(b"transfer-encoding"),
            ParsedMessage::Response(r) => r.message.headers.get_header(b"transfer-encoding"),
        }
        .map(is_chunked)
        .unwrap_or(false);

        buf.advance_read(header_len);
        self.current = Some(message);

        self.stage = if chunked {
            Stage::Body(BodyKind::Chunked(ChunkedState::new()))
        } else if let Some(n) = content_length {
            if n == 0 { Stage::Body(BodyKind::None) } else { Stage::Body(BodyKind::Fixed(n)) }
        } else {
            Stage::Body(BodyKind::None)
        };

        Ok(Some(header_len))
    }

    /// Signal end of stream. Only valid between messages (nothing
    /// in flight, or the in-flight message is already complete); a
    /// stream ending mid-body or mid-headers is a premature EOF.
    pub fn signal_eof(&mut self) -> Result<(), ProtoError> {
        match &self.stage {
            Stage::Headers if self.current.is_none() => Ok(()),
            Stage::Paused => Ok(()),
            _ => {
                self.last_error = Some("premature EOF".to_string());
                Err(ProtoError::PrematureEof)
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.stage, Stage::Paused) && self.current.is_some()
    }

    /// Transfer ownership of the completed message out, unpausing the
    /// parser for the next message.
    pub fn take_message(&mut self) -> Option<ParsedMessage> {
        if !self.is_complete() {
            return None;
        }
        self.stage = Stage::Headers;
        self.current.take()
    }

    /// Discard the in-flight (or completed) message without returning
    /// it, unpausing the parser.
    pub fn skip(&mut self) {
        self.current = None;
        self.stage = Stage::Headers;
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

fn parse_len(value: &[u8]) -> Option<u64> {
    std::str::from_utf8(value).ok()?.trim().parse().ok()
}

/// Copy `httparse` headers into `store`, reporting whether an Upgrade
/// was requested (`Connection: upgrade` or a bare `Upgrade` header).
fn scan_headers<'a>(
    store: &mut crate::message::HeaderStore,
    headers: impl Iterator<Item = &'a httparse::Header<'a>>,
) -> bool {
    let mut upgrade = false;
    for h in headers {
        store.add_header(h.name.as_bytes(), h.value);
        if h.name.eq_ignore_ascii_case("upgrade") {
            upgrade = true;
        }
        if h.name.eq_ignore_ascii_case("connection") && is_upgrade(h.value) {
            upgrade = true;
        }
    }
    upgrade
}

#[cfg(test)]
mod test {
    use super::*;

    fn feed_all(buf: &mut ByteBuffer, data: &[u8]) {
        buf.free_slice_mut()[..data.len()].copy_from_slice(data);
        buf.advance_write(data.len());
    }

    #[test]
    fn s1_get_single_buffer() {
        let input = b"GET / HTTP/1.1\r\nContent-Type: text/plain\r\nContent-Length: 4\r\n\r\ndeak";
        let mut buf = ByteBuffer::with_capacity(256);
        feed_all(&mut buf, input);
        let mut parser = Parser::new_request();
        let consumed = parser.feed(&mut buf).unwrap();
        assert!(parser.is_complete());
        assert_eq!(consumed, input.len());
        let msg = parser.take_message().unwrap();
        match msg {
            ParsedMessage::Request(r) => {
                assert_eq!(r.method, "GET");
                assert_eq!(r.url, b"/");
                assert_eq!(r.message.version, Version::HTTP_11);
                assert_eq!(r.message.headers.get_header(b"content-type"), Some(&b"text/plain"[..]));
                assert_eq!(r.message.body, b"deak");
            }
            _ => panic!("expected request"),
        }
    }

    #[test]
    fn s2_post_split_feed() {
        let input = b"POST /post_here/0404 HTTP/1.0\r\nAccept: */*\r\nAccept-Language: en-us,en;q=0.5\r\nContent-Length: 6\r\n\r\nferenc";
        let mut buf = ByteBuffer::with_capacity(256);
        let mut parser = Parser::new_request();
        let chunks: [&[u8]; 3] = [&input[..10], &input[10..50], &input[50..]];
        let mut total = 0;
        for chunk in chunks {
            buf.free_slice_mut()[..chunk.len()].copy_from_slice(chunk);
            buf.advance_write(chunk.len());
            total += parser.feed(&mut buf).unwrap();
        }
        assert!(parser.is_complete());
        assert_eq!(total, input.len());
        let msg = parser.take_message().unwrap();
        match msg {
            ParsedMessage::Request(r) => {
                assert_eq!(r.method, "POST");
                assert_eq!(r.url, b"/post_here/0404");
                assert_eq!(r.message.version, Version::HTTP_10);
                assert_eq!(r.message.body, b"ferenc");
            }
            _ => panic!("expected request"),
        }
    }

    #[test]
    fn pauses_after_completion() {
        let input = b"GET / HTTP/1.1\r\n\r\n";
        let mut buf = ByteBuffer::with_capacity(256);
        feed_all(&mut buf, input);
        let mut parser = Parser::new_request();
        parser.feed(&mut buf).unwrap();
        assert!(parser.is_complete());
        feed_all(&mut buf, b"more");
        let consumed = parser.feed(&mut buf).unwrap();
        assert_eq!(consumed, 0);
    }

    #[test]
    fn response_fed_to_request_parser_errors() {
        let input = b"HTTP/1.1 200 OK\r\n\r\n";
        let mut buf = ByteBuffer::with_capacity(256);
        feed_all(&mut buf, input);
        let mut parser = Parser::new_request();
        let result = parser.feed(&mut buf);
        assert!(result.is_err());
        assert!(!parser.is_complete());
        assert!(parser.last_error().is_some());
    }

    #[test]
    fn chunked_body_is_decoded() {
        let input = b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n0\r\n\r\n";
        let mut buf = ByteBuffer::with_capacity(256);
        feed_all(&mut buf, input);
        let mut parser = Parser::new_request();
        parser.feed(&mut buf).unwrap();
        assert!(parser.is_complete());
        let msg = parser.take_message().unwrap();
        match msg {
            ParsedMessage::Request(r) => assert_eq!(r.message.body, b"hello"),
            _ => panic!("expected request"),
        }
    }

    #[test]
    fn upgrade_is_rejected() {
        let input = b"GET / HTTP/1.1\r\nConnection: upgrade\r\nUpgrade: websocket\r\n\r\n";
        let mut buf = ByteBuffer::with_capacity(256);
        feed_all(&mut buf, input);
        let mut parser = Parser::new_request();
        let err = parser.feed(&mut buf).unwrap_err();
        assert!(matches!(err, ProtoError::UpgradeNotSupported));
    }
}
