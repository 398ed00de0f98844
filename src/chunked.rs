//! Chunked transfer-encoding decoder state.
//!
//! Walks a `buffer::ByteBuffer` directly, tracking how much of the
//! buffered data is already-decoded body versus still-pending chunk
//! bytes, without buffering the whole body up front.

use httparse::{parse_chunk_size, InvalidChunkSize, Status};

use crate::buffer::ByteBuffer;

/// Decoder state for a chunked body: tracks how many already-seen bytes
/// are real body data (`buffered`) versus how many more bytes of the
/// current chunk are still expected (`pending`).
#[derive(Debug, Clone)]
pub struct ChunkedState {
    buffered: usize,
    pending: usize,
    done: bool,
}

impl ChunkedState {
    pub fn new() -> ChunkedState {
        ChunkedState { buffered: 0, pending: 0, done: false }
    }

    /// Scan newly-received bytes in `buf`, stripping chunk-size lines and
    /// trailing CRLFs in place so `buffered` always counts pure body
    /// bytes. `buf` must expose the same unread bytes across calls; sizes
    /// are never moved, only consumed.
    pub fn parse(&mut self, buf: &mut ByteBuffer) -> Result<(), InvalidChunkSize> {
        while self.buffered < buf.readable() {
            if self.pending == 0 {
                let rest = &buf.readable_slice()[self.buffered..];
                match parse_chunk_size(rest)? {
                    Status::Complete((header_len, 0)) => {
                        buf.remove_range(self.buffered, self.buffered + header_len);
                        self.done = true;
                    }
                    Status::Complete((header_len, chunk_size)) => {
                        buf.remove_range(self.buffered, self.buffered + header_len);
                        self.pending = chunk_size as usize;
                    }
                    Status::Partial => return Ok(()),
                }
            } else {
                let available = buf.readable() - self.buffered;
                if self.pending <= available {
                    self.buffered += self.pending;
                    self.pending = 0;
                } else {
                    self.pending -= available;
                    self.buffered += available;
                }
            }
        }
        Ok(())
    }

    pub fn buffered(&self) -> usize {
        self.buffered
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn consume(&mut self, n: usize) {
        assert!(self.buffered >= n);
        self.buffered -= n;
    }
}

impl Default for ChunkedState {
    fn default() -> ChunkedState {
        ChunkedState::new()
    }
}

#[cfg(test)]
mod test {
    use super::ChunkedState;
    use crate::buffer::ByteBuffer;

    fn feed(buf: &mut ByteBuffer, data: &[u8]) {
        buf.free_slice_mut()[..data.len()].copy_from_slice(data);
        buf.advance_write(data.len());
    }

    #[test]
    fn single_chunk_then_terminator() {
        let mut buf = ByteBuffer::with_capacity(64);
        feed(&mut buf, b"5\r\nhello\r\n0\r\n\r\n");
        let mut st = ChunkedState::new();
        st.parse(&mut buf).unwrap();
        assert!(st.is_done());
        assert_eq!(st.buffered(), 5);
    }

    #[test]
    fn partial_chunk_size_waits_for_more() {
        let mut buf = ByteBuffer::with_capacity(64);
        feed(&mut buf, b"5");
        let mut st = ChunkedState::new();
        st.parse(&mut buf).unwrap();
        assert!(!st.is_done());
        assert_eq!(st.buffered(), 0);
    }

    #[test]
    fn two_chunks_accumulate() {
        let mut buf = ByteBuffer::with_capacity(64);
        feed(&mut buf, b"3\r\nabc\r\n2\r\nde\r\n0\r\n\r\n");
        let mut st = ChunkedState::new();
        st.parse(&mut buf).unwrap();
        assert!(st.is_done());
        assert_eq!(st.buffered(), 5);
    }
}
