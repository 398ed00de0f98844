//! The shared HTTP message model: case-insensitive, wire-order-preserving
//! headers plus the request/response records built on top of them.
//!
//! Grounded on `lib/http/http-message.h`'s `HTTPMessage`/`HTTPRequest`/
//! `HTTPResponse` (`raw_headers` blob + `header_positions` index), but
//! follows option (a) from the design notes: the ordered list of
//! `(key, value)` pairs is the authoritative store, and the lookup index
//! is built over it rather than over a raw byte blob. Duplicate keys are
//! kept in insertion order and serialized verbatim; the index always
//! resolves to the most recently inserted occurrence.

use crate::version::Version;

/// A single header as it arrived (or was added): lowercase-normalized
/// key bytes and raw value bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderEntry {
    pub name: Vec<u8>,
    pub value: Vec<u8>,
}

/// Ordered header collection with case-insensitive lookup.
///
/// `add_header` normalizes `name` to lowercase before storing it (§4.2:
/// "normalizes key to lowercase, appends key: value\r\n to
/// raw_headers"), appends to the ordered list, and updates the index so
/// that `get_header` returns the last-inserted value for a given
/// normalized key, matching the "last insertion wins for lookup" rule;
/// earlier duplicates stay in the list (also lowercase) and are still
/// serialized.
#[derive(Debug, Clone, Default)]
pub struct HeaderStore {
    entries: Vec<HeaderEntry>,
    index: std::collections::HashMap<Vec<u8>, usize>,
}

fn lowercase(key: &[u8]) -> Vec<u8> {
    key.to_ascii_lowercase()
}

impl HeaderStore {
    pub fn new() -> HeaderStore {
        HeaderStore { entries: Vec::new(), index: std::collections::HashMap::new() }
    }

    /// Add a header. `name` is normalized to lowercase before storage,
    /// so the wire form and the lookup key always agree; the lookup
    /// index is updated to point at this occurrence.
    pub fn add_header(&mut self, name: &[u8], value: &[u8]) {
        let key = lowercase(name);
        self.entries.push(HeaderEntry { name: key.clone(), value: value.to_vec() });
        self.index.insert(key, self.entries.len() - 1);
    }

    /// Case-insensitive lookup; returns the most recently added value
    /// for `key` if present.
    pub fn get_header(&self, key: &[u8]) -> Option<&[u8]> {
        let key = lowercase(key);
        self.index.get(&key).map(|&i| self.entries[i].value.as_slice())
    }

    pub fn header_exists(&self, normalized_key: &[u8]) -> bool {
        self.index.contains_key(&lowercase(normalized_key))
    }

    /// All header entries in wire order, duplicates included.
    pub fn entries(&self) -> &[HeaderEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize every entry verbatim, in insertion order, as
    /// `name: value\r\n` lines.
    pub fn write_raw(&self, out: &mut Vec<u8>) {
        for entry in &self.entries {
            out.extend_from_slice(&entry.name);
            out.extend_from_slice(b": ");
            out.extend_from_slice(&entry.value);
            out.extend_from_slice(b"\r\n");
        }
    }
}

/// Fields shared by requests and responses.
#[derive(Debug, Clone)]
pub struct HttpMessage {
    pub version: Version,
    pub headers: HeaderStore,
    pub body: Vec<u8>,
}

impl HttpMessage {
    pub fn new(version: Version) -> HttpMessage {
        HttpMessage { version, headers: HeaderStore::new(), body: Vec::new() }
    }

    pub fn take_body(&mut self, bytes: Vec<u8>) {
        self.body = bytes;
    }

    pub fn append_body(&mut self, bytes: &[u8]) {
        self.body.extend_from_slice(bytes);
    }
}

#[derive(Debug, Clone)]
pub struct Request {
    pub message: HttpMessage,
    pub method: String,
    pub url: Vec<u8>,
}

impl Request {
    pub fn new(version: Version) -> Request {
        Request { message: HttpMessage::new(version), method: String::new(), url: Vec::new() }
    }
}

#[derive(Debug, Clone)]
pub struct Response {
    pub message: HttpMessage,
    pub status: u16,
}

impl Response {
    pub fn new(version: Version, status: u16) -> Response {
        Response { message: HttpMessage::new(version), status }
    }
}

#[cfg(test)]
mod test {
    use super::HeaderStore;

    #[test]
    fn lookup_is_case_insensitive() {
        let mut h = HeaderStore::new();
        h.add_header(b"Content-Type", b"text/plain");
        assert_eq!(h.get_header(b"content-type"), Some(&b"text/plain"[..]));
        assert_eq!(h.get_header(b"CONTENT-TYPE"), Some(&b"text/plain"[..]));
    }

    #[test]
    fn duplicate_keys_last_wins_for_lookup_but_all_serialize() {
        let mut h = HeaderStore::new();
        h.add_header(b"X-Foo", b"first");
        h.add_header(b"x-foo", b"second");
        assert_eq!(h.get_header(b"X-FOO"), Some(&b"second"[..]));
        let mut out = Vec::new();
        h.write_raw(&mut out);
        assert_eq!(out, b"x-foo: first\r\nx-foo: second\r\n".to_vec());
    }

    #[test]
    fn serialized_key_is_lowercase_normalized_even_when_added_uppercase() {
        let mut h = HeaderStore::new();
        h.add_header(b"X-Foo", b"bar");
        let mut out = Vec::new();
        h.write_raw(&mut out);
        assert_eq!(out, b"x-foo: bar\r\n".to_vec());
    }

    #[test]
    fn missing_header_is_none() {
        let h = HeaderStore::new();
        assert_eq!(h.get_header(b"nope"), None);
        assert!(!h.header_exists(b"nope"));
    }
}
