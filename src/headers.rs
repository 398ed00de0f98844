//! Byte-sequence matchers for header *values* that drive framing
//! decisions (`Transfer-Encoding: chunked`, `Connection: close`,
//! `Expect: 100-continue`, `Connection: upgrade`/`Upgrade: ...`).
//!
//! Case-insensitive and tolerant of surrounding whitespace, matching
//! what real clients send.

pub fn is_close(val: &[u8]) -> bool {
    if val.len() < "close".len() {
        return false;
    }
    let mut iter = val.iter();
    for (idx, &ch) in iter.by_ref().enumerate() {
        match ch {
            b'\r' | b'\n' | b' ' | b'\t' => continue,
            b'c' | b'C' => {
                if idx + "close".len() > val.len() {
                    return false;
                }
                break;
            }
            _ => return false,
        }
    }
    for (idx, ch) in iter.by_ref().take(4).enumerate() {
        if b"lose"[idx] != ch.to_ascii_lowercase() {
            return false;
        }
    }
    for &ch in iter {
        if !matches!(ch, b'\r' | b'\n' | b' ' | b'\t') {
            return false;
        }
    }
    true
}

pub fn is_chunked(val: &[u8]) -> bool {
    if val.len() < "chunked".len() {
        return false;
    }
    let mut iter = val.iter();
    for (idx, &ch) in iter.by_ref().enumerate() {
        match ch {
            b'\r' | b'\n' | b' ' | b'\t' => continue,
            b'c' | b'C' => {
                if idx + "chunked".len() > val.len() {
                    return false;
                }
                break;
            }
            _ => return false,
        }
    }
    for (idx, ch) in iter.by_ref().take(6).enumerate() {
        if b"hunked"[idx] != ch.to_ascii_lowercase() {
            return false;
        }
    }
    for &ch in iter {
        if !matches!(ch, b'\r' | b'\n' | b' ' | b'\t') {
            return false;
        }
    }
    true
}

pub fn is_continue(val: &[u8]) -> bool {
    if val.len() < "100-continue".len() {
        return false;
    }
    let mut iter = val.iter();
    for (idx, &ch) in iter.by_ref().enumerate() {
        match ch {
            b'\r' | b'\n' | b' ' | b'\t' => continue,
            b'1' => {
                if idx + "100-continue".len() > val.len() {
                    return false;
                }
                break;
            }
            _ => return false,
        }
    }
    for (idx, ch) in iter.by_ref().take(11).enumerate() {
        if b"00-continue"[idx] != ch.to_ascii_lowercase() {
            return false;
        }
    }
    for &ch in iter {
        if !matches!(ch, b'\r' | b'\n' | b' ' | b'\t') {
            return false;
        }
    }
    true
}

/// Matches a `Connection: upgrade` (or any header naming the literal
/// token `upgrade`) value, case-insensitively, ignoring surrounding
/// whitespace. Used to detect Upgrade requests, which this engine
/// does not support and answers with an error response instead.
pub fn is_upgrade(val: &[u8]) -> bool {
    let trimmed: &[u8] = {
        let start = val.iter().position(|&c| !c.is_ascii_whitespace()).unwrap_or(val.len());
        let end = val.iter().rposition(|&c| !c.is_ascii_whitespace()).map_or(start, |p| p + 1);
        &val[start..end]
    };
    trimmed.eq_ignore_ascii_case(b"upgrade")
}
