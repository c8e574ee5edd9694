//! Security controls: credential redaction and outbound header filtering
//!
//! Both run before anything leaves the engine: error text is masked before it
//! reaches logs or the response envelope, and caller-supplied headers are
//! reduced to an explicit allowlist before the HTTP executor forwards them.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// Matches bearer-scheme credentials wherever they appear in free text
static BEARER_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)bearer\s+[a-z0-9\-\._~\+/]+=*").expect("valid redaction pattern")
});

const REDACTED: &str = "bearer ***redacted***";

/// Mask credential-bearing substrings with a fixed placeholder
///
/// Idempotent: already-masked text passes through unchanged.
pub fn mask_credentials(text: &str) -> String {
    BEARER_TOKEN.replace_all(text, REDACTED).into_owned()
}

/// Allowlist-based filter for headers forwarded to backends
///
/// Matching is a case-insensitive prefix check, so `X-Forward-` admits the
/// whole forwarding namespace while everything else (internal routing and
/// auth headers included) is dropped.
#[derive(Debug, Clone)]
pub struct HeaderFilter {
    allowed_prefixes: Vec<String>,
}

impl Default for HeaderFilter {
    fn default() -> Self {
        Self {
            allowed_prefixes: ["Accept", "Content-Type", "User-Agent", "Authorization", "X-Forward-"]
                .iter()
                .map(|s| s.to_ascii_lowercase())
                .collect(),
        }
    }
}

impl HeaderFilter {
    pub fn new(allowed_prefixes: impl IntoIterator<Item = String>) -> Self {
        Self {
            allowed_prefixes: allowed_prefixes
                .into_iter()
                .map(|s| s.to_ascii_lowercase())
                .collect(),
        }
    }

    /// Keep only the entries whose name starts with an allowlisted prefix
    pub fn filter_outgoing(
        &self,
        headers: Option<&HashMap<String, String>>,
    ) -> HashMap<String, String> {
        let Some(headers) = headers else {
            return HashMap::new();
        };
        headers
            .iter()
            .filter(|(name, _)| {
                let name = name.to_ascii_lowercase();
                self.allowed_prefixes
                    .iter()
                    .any(|prefix| name.starts_with(prefix))
            })
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}
