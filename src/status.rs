//! HTTP status code -> reason phrase lookup.
//!
//! Grounded on the `HTTP_STATUS_MAP_200/300/400/500` X-macro tables
//! (`lib/http/http-status.h`): codes are grouped by hundreds, and a few
//! codes inside an otherwise-contiguous range carry no reason phrase
//! (418/419/420/425/427/430/509 were reserved and later withdrawn). Those
//! gaps must round-trip as `None`, not as a synthesized reason, so the
//! group tables are arrays indexed by `code - base` holding
//! `Option<&'static str>` rather than a contiguous enum.

const GROUP_200: &[Option<&str>] = &[
    Some("OK"),                              // 200
    Some("Created"),                         // 201
    Some("Accepted"),                        // 202
    Some("Non-Authoritative Information"),   // 203
    Some("No Content"),                      // 204
    Some("Reset Content"),                   // 205
    Some("Partial Content"),                 // 206
    Some("Multi-Status"),                    // 207
    Some("Already Reported"),                // 208
];

const GROUP_300: &[Option<&str>] = &[
    Some("Multiple Choices"),    // 300
    Some("Moved Permanently"),   // 301
    Some("Found"),               // 302
    Some("See Other"),           // 303
    Some("Not Modified"),        // 304
    Some("Use Proxy"),           // 305
    Some("Switch Proxy"),        // 306
    Some("Temporary Redirect"),  // 307
    Some("Permanent Redirect"),  // 308
];

const GROUP_400: &[Option<&str>] = &[
    Some("Bad Request"),                         // 400
    Some("Unauthorized"),                        // 401
    Some("Payment Required"),                    // 402
    Some("Forbidden"),                           // 403
    Some("Not Found"),                           // 404
    Some("Method Not Allowed"),                  // 405
    Some("Not Acceptable"),                      // 406
    Some("Proxy Authentication Required"),       // 407
    Some("Request Timeout"),                     // 408
    Some("Conflict"),                            // 409
    Some("Gone"),                                // 410
    Some("Length Required"),                     // 411
    Some("Precondition Failed"),                 // 412
    Some("Payload Too Large"),                   // 413
    Some("URI Too Long"),                        // 414
    Some("Unsupported Media Type"),              // 415
    Some("Range Not Satisfiable"),                // 416
    Some("Expectation Failed"),                  // 417
    None,                                         // 418 UNUSED_418
    None,                                         // 419 UNUSED_419
    None,                                         // 420 UNUSED_420
    Some("Misdirected Request"),                  // 421
    Some("Unprocessable Entity"),                 // 422
    Some("Locked"),                               // 423
    Some("Failed Dependency"),                    // 424
    None,                                         // 425 UNUSED_425
    Some("Upgrade Required"),                     // 426
    None,                                         // 427 UNUSED_427
    Some("Precondition Required"),                // 428
    Some("Too Many Requests"),                    // 429
    None,                                         // 430 UNUSED_430
    Some("Request Header Fields Too Large"),      // 431
];

const GROUP_500: &[Option<&str>] = &[
    Some("Internal Server Error"),            // 500
    Some("Not Implemented"),                  // 501
    Some("Bad Gateway"),                      // 502
    Some("Service Unavailable"),               // 503
    Some("Gateway Timeout"),                  // 504
    Some("HTTP Version Not Supported"),       // 505
    Some("Variant Also Negotiates"),           // 506
    Some("Insufficient Storage"),             // 507
    Some("Loop Detected"),                    // 508
    None,                                      // 509 UNUSED_509
    Some("Not Extended"),                     // 510
    Some("Network Authentication Required"),  // 511
];

fn group_for(code: u16) -> Option<(&'static [Option<&'static str>], u16)> {
    match code {
        200..=299 => Some((GROUP_200, 200)),
        300..=399 => Some((GROUP_300, 300)),
        400..=499 => Some((GROUP_400, 400)),
        500..=599 => Some((GROUP_500, 500)),
        _ => None,
    }
}

/// Look up the reason phrase for a status code.
///
/// Returns `None` both for codes outside any known group and for the
/// reserved placeholder codes inside the 400 group (418, 419, 420, 425,
/// 427, 430) and the 500 group (509).
pub fn status_code_to_line(code: u16) -> Option<&'static str> {
    let (group, base) = group_for(code)?;
    group.get((code - base) as usize).copied().flatten()
}

/// True if `code` has an assigned reason phrase.
pub fn is_known_status(code: u16) -> bool {
    status_code_to_line(code).is_some()
}
