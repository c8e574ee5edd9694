//! Retryability classification for backend status signals

/// Whether an HTTP status code signals a retryable condition
///
/// Retryable: 408 (request timeout), 429 (too many requests), and the 5xx
/// range except 501 (not implemented) and 505 (version not supported), both
/// of which no amount of retrying will fix.
pub fn is_retryable_http_status(code: u16) -> bool {
    matches!(code, 408 | 429) || (500..=599).contains(&code) && code != 501 && code != 505
}
