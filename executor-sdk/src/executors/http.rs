//! Outbound HTTP call executor
//!
//! Builds a request from the `HttpSpec`, forwards only allowlisted headers,
//! and classifies the result: any received response is a Success attempt
//! whose payload carries the status code, response headers, and a bounded
//! body snippet. Transport failures are transient; cancellation is a
//! timeout; everything else (bad URL, bad method) is permanent.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Method;
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::core::{AttemptContext, Executor};
use crate::model::{AttemptResult, HttpSpec, NormalizedRequest, HTTP_EXECUTOR};
use crate::security::HeaderFilter;

/// Maximum number of response-body bytes captured in the attempt payload
const MAX_BODY_SNIPPET_BYTES: usize = 4096;

/// Executor for the `http` type tag, backed by a shared reqwest client
pub struct HttpExecutor {
    client: reqwest::Client,
    header_filter: HeaderFilter,
}

impl HttpExecutor {
    pub fn new(client: reqwest::Client, header_filter: HeaderFilter) -> Self {
        Self {
            client,
            header_filter,
        }
    }

    fn build_url(spec: &HttpSpec) -> Result<Url, String> {
        let base = spec.base_url.trim_end_matches('/');
        let path = match spec.path.as_deref() {
            Some(p) if !p.trim().is_empty() => format!("/{}", p.trim_start_matches('/')),
            _ => String::new(),
        };
        let mut url =
            Url::parse(&format!("{base}{path}")).map_err(|e| format!("invalid url: {e}"))?;
        if let Some(query) = &spec.query {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Transport-level failures are worth retrying; anything the client
    /// refused to even send is not
    fn classify_send_error(err: &reqwest::Error) -> AttemptResult {
        if err.is_builder() {
            AttemptResult::permanent(err.to_string())
        } else {
            AttemptResult::transient(err.to_string())
        }
    }

    async fn capture_response(resp: reqwest::Response) -> AttemptResult {
        let status = resp.status().as_u16();
        let headers: HashMap<String, String> = resp
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();

        let bytes = match resp.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return Self::classify_send_error(&e),
        };
        let truncated = bytes.len() > MAX_BODY_SNIPPET_BYTES;
        let snippet_len = bytes.len().min(MAX_BODY_SNIPPET_BYTES);
        let body_snippet = String::from_utf8_lossy(&bytes[..snippet_len]).into_owned();

        AttemptResult::success(json!({
            "statusCode": status,
            "headers": headers,
            "bodySnippet": body_snippet,
            "bodyTruncated": truncated,
            "bytes": bytes.len(),
        }))
    }
}

#[async_trait]
impl Executor for HttpExecutor {
    fn kind(&self) -> &str {
        HTTP_EXECUTOR
    }

    async fn execute(&self, req: &NormalizedRequest, ctx: &AttemptContext) -> AttemptResult {
        let Some(spec) = &req.http else {
            return AttemptResult::permanent("http spec missing");
        };

        let url = match Self::build_url(spec) {
            Ok(url) => url,
            Err(e) => return AttemptResult::permanent(e),
        };
        let method = match Method::from_bytes(spec.method.to_uppercase().as_bytes()) {
            Ok(method) => method,
            Err(_) => {
                return AttemptResult::permanent(format!("invalid method '{}'", spec.method))
            }
        };

        let mut builder = self.client.request(method.clone(), url);
        for (name, value) in self.header_filter.filter_outgoing(spec.headers.as_ref()) {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(&value),
            ) {
                (Ok(name), Ok(value)) => builder = builder.header(name, value),
                _ => debug!(header = %name, "dropping malformed outbound header"),
            }
        }

        // Only methods that conventionally carry a body get one, and only as JSON
        if let Some(body) = &spec.body {
            if matches!(method, Method::POST | Method::PUT | Method::PATCH) {
                builder = builder.json(body);
            }
        }

        let response = tokio::select! {
            resp = builder.send() => resp,
            _ = ctx.cancelled() => {
                let reason = if ctx.caller_gave_up() {
                    "request cancelled by caller"
                } else {
                    "attempt deadline expired"
                };
                return AttemptResult::timeout(reason);
            }
        };

        match response {
            Ok(resp) => Self::capture_response(resp).await,
            Err(e) => Self::classify_send_error(&e),
        }
    }
}
