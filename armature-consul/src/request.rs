//! Request descriptor.
//!
//! A [`Request`] is the fully assembled, not-yet-sent form of one agent
//! call. It is seeded from the client [`Config`], optionally overlaid with
//! per-call options, and consumed exactly once by the transport invoker.

use crate::config::duration_to_millis_param;
use crate::transport::TransportRequest;
use crate::{Config, Headers, JsonEncoding, Params, QueryOptions, WriteOptions};
use bytes::Bytes;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Header carrying the ACL token.
pub const HEADER_TOKEN: &str = "X-Consul-Token";

/// Header carrying agent-cache directives.
pub const HEADER_CACHE_CONTROL: &str = "Cache-Control";

const PATH_TRAILING: &[char] = &[' ', '\t', '\n', '\r', '\0', '\x0B', '&', '?'];
const PATH_LEADING: &[char] = &[' ', '\t', '\n', '\r', '\0', '\x0B', '/'];

/// A single agent request.
#[derive(Debug)]
pub struct Request {
    config: Arc<Config>,
    method: String,
    path: String,
    headers: Headers,
    params: Params,
    body: Option<Bytes>,
    timeout: Option<Duration>,
    uri: Option<String>,
}

impl Request {
    /// Create a request seeded with the config defaults.
    ///
    /// When `body` is provided exactly one encoded buffer is attached, see
    /// [`encode_body`].
    pub fn new(
        method: impl AsRef<str>,
        path: impl Into<String>,
        config: Arc<Config>,
        body: Option<&Value>,
    ) -> Self {
        let mut headers = Headers::new();
        let mut params = Params::new();

        if !config.datacenter.is_empty() {
            params.set("dc", config.datacenter.as_str());
        }
        if !config.namespace.is_empty() {
            params.set("ns", config.namespace.as_str());
        }
        if let Some(wait) = config.wait_param() {
            params.set("wait", wait);
        }
        if !config.token.is_empty() {
            headers.set(HEADER_TOKEN, config.token.as_str());
        }

        let body = body.map(|value| encode_body(value, config.json_encoding));

        Self {
            method: method.as_ref().to_uppercase(),
            path: path.into(),
            headers,
            params,
            body,
            timeout: None,
            uri: None,
            config,
        }
    }

    /// Get the upper-case method.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Get the path as given.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Get the request headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Get the request headers for modification.
    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// Get the query parameters.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Get the query parameters for modification.
    ///
    /// Invalidates the cached URI.
    pub fn params_mut(&mut self) -> &mut Params {
        self.uri = None;
        &mut self.params
    }

    /// Get the encoded body.
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Replace the body with pre-encoded bytes.
    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = Some(body.into());
    }

    /// Get the per-call timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Overlay write options. `None` is a no-op.
    pub fn apply_write_options(&mut self, opts: Option<&WriteOptions>) {
        let Some(opts) = opts else {
            return;
        };

        self.override_param("ns", opts.namespace.as_deref());
        self.override_param("dc", opts.datacenter.as_deref());
        self.override_token(opts.token.as_deref());
        if let Some(relay_factor) = opts.relay_factor {
            self.params.set("relay-factor", relay_factor.to_string());
        }
        if let Some(timeout) = opts.timeout {
            self.timeout = Some(timeout);
        }

        self.uri = None;
    }

    /// Overlay query options. `None` is a no-op.
    pub fn apply_query_options(&mut self, opts: Option<&QueryOptions>) {
        let Some(opts) = opts else {
            return;
        };

        self.override_param("ns", opts.namespace.as_deref());
        self.override_param("dc", opts.datacenter.as_deref());
        self.override_token(opts.token.as_deref());

        if opts.allow_stale {
            self.params.set("stale", "");
        }
        if opts.require_consistent {
            self.params.set("consistent", "");
        }
        if let Some(index) = opts.wait_index {
            self.params.set("index", index.to_string());
        }
        self.override_param("hash", opts.wait_hash.as_deref());
        if let Some(wait) = opts.wait_time {
            match duration_to_millis_param(wait) {
                Some(wait) => self.params.set("wait", wait),
                None => {
                    self.params.remove("wait");
                }
            }
        }
        self.override_param("near", opts.near.as_deref());
        for (key, value) in &opts.node_meta {
            self.params.add("node-meta", format!("{}:{}", key, value));
        }
        if let Some(relay_factor) = opts.relay_factor {
            self.params.set("relay-factor", relay_factor.to_string());
        }
        if opts.local_only {
            self.params.set("local-only", "true");
        }
        if let Some(filter) = opts.filter.as_deref() {
            self.filter_query(filter);
        }

        if opts.use_cache {
            self.params.set("cached", "");

            let mut directives = Vec::new();
            if let Some(max_age) = opts.max_age.filter(|d| !d.is_zero()) {
                directives.push(format!("max-age={}", max_age.as_secs()));
            }
            if let Some(stale) = opts.stale_if_error.filter(|d| !d.is_zero()) {
                directives.push(format!("stale-if-error={}", stale.as_secs()));
            }
            if !directives.is_empty() {
                self.headers.set(HEADER_CACHE_CONTROL, directives.join(", "));
            }
        }

        if let Some(timeout) = opts.timeout {
            self.timeout = Some(timeout);
        }

        self.uri = None;
    }

    /// Set the `filter` parameter. An empty expression is ignored.
    pub fn filter_query(&mut self, filter: &str) {
        if filter.is_empty() {
            return;
        }
        self.params.set("filter", filter);
        self.uri = None;
    }

    fn override_param(&mut self, key: &str, value: Option<&str>) {
        match value {
            None => {}
            Some("") => {
                self.params.remove(key);
            }
            Some(value) => self.params.set(key, value),
        }
    }

    fn override_token(&mut self, token: Option<&str>) {
        match token {
            None => {}
            Some("") => {
                self.headers.remove(HEADER_TOKEN);
            }
            Some(token) => self.headers.set(HEADER_TOKEN, token),
        }
    }

    /// Get the full request URI, computing and caching it on first use.
    pub fn uri(&mut self) -> &str {
        let uri = self
            .uri
            .get_or_insert_with(|| build_uri(&self.config, &self.path, &self.params));
        uri.as_str()
    }

    /// Consume the descriptor into a transport request.
    pub fn into_transport_request(mut self) -> TransportRequest {
        self.uri();
        TransportRequest {
            method: self.method,
            uri: self.uri.unwrap_or_default(),
            headers: self.headers,
            body: self.body,
            timeout: self.timeout,
        }
    }
}

fn build_uri(config: &Config, path: &str, params: &Params) -> String {
    let path = path
        .trim_end_matches(PATH_TRAILING)
        .trim_start_matches(PATH_LEADING);
    let mut uri = format!(
        "{}://{}/{}",
        config.scheme.trim(),
        config.address.trim().trim_end_matches('/'),
        path
    );
    if !params.is_empty() {
        uri.push('?');
        uri.push_str(&params.encode());
    }
    uri
}

/// Encode a body value for the wire.
///
/// Objects and arrays become JSON, numbers their decimal form, strings pass
/// through verbatim, booleans become `true`/`false` and `null` an empty
/// body.
pub fn encode_body(value: &Value, encoding: JsonEncoding) -> Bytes {
    match value {
        Value::Object(_) | Value::Array(_) => {
            let encoded = match encoding {
                JsonEncoding::Compact => serde_json::to_vec(value),
                JsonEncoding::Pretty => serde_json::to_vec_pretty(value),
            };
            match encoded {
                Ok(bytes) => Bytes::from(bytes),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize JSON body");
                    Bytes::new()
                }
            }
        }
        Value::Number(n) => Bytes::from(n.to_string()),
        Value::String(s) => Bytes::from(s.clone()),
        Value::Bool(b) => Bytes::from_static(if *b { b"true" } else { b"false" }),
        Value::Null => Bytes::new(),
    }
}
