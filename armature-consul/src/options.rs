//! Per-call query and write options.
//!
//! Options never touch the client [`Config`](crate::Config). They are
//! overlaid onto a single [`Request`](crate::Request) and only fields that
//! were explicitly set take effect:
//!
//! - `None` leaves the config default in place.
//! - `Some(value)` overrides it.
//! - `Some("")` (or a zero wait time) clears the config default for that
//!   call.
//!
//! Boolean switches are plain `bool`s: `false` adds nothing.

use std::time::Duration;

/// Options for read (query) requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Namespace override (`ns`).
    pub namespace: Option<String>,
    /// Datacenter override (`dc`).
    pub datacenter: Option<String>,
    /// ACL token override (`X-Consul-Token`).
    pub token: Option<String>,
    /// Allow any server to answer, not only the leader (`stale`).
    pub allow_stale: bool,
    /// Force a consistent read through the leader (`consistent`).
    pub require_consistent: bool,
    /// Blocking-query index (`index`).
    pub wait_index: Option<u64>,
    /// Blocking-query content hash (`hash`).
    pub wait_hash: Option<String>,
    /// Blocking-query wait time (`wait`).
    pub wait_time: Option<Duration>,
    /// Sort results by round-trip time from this node (`near`).
    pub near: Option<String>,
    /// Node metadata filters (`node-meta=key:value`, repeated).
    pub node_meta: Vec<(String, String)>,
    /// Write fan-out hint (`relay-factor`).
    pub relay_factor: Option<u8>,
    /// Only return results local to the agent (`local-only`).
    pub local_only: bool,
    /// Filter expression (`filter`).
    pub filter: Option<String>,
    /// Serve the result from the agent cache (`cached`).
    pub use_cache: bool,
    /// Maximum acceptable age of a cached result.
    pub max_age: Option<Duration>,
    /// Serve a stale cached result for this long if the servers fail.
    pub stale_if_error: Option<Duration>,
    /// Per-call timeout recorded for the transport.
    pub timeout: Option<Duration>,
}

impl QueryOptions {
    /// Create empty query options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set the datacenter.
    pub fn with_datacenter(mut self, datacenter: impl Into<String>) -> Self {
        self.datacenter = Some(datacenter.into());
        self
    }

    /// Set the ACL token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Allow stale reads.
    pub fn stale(mut self) -> Self {
        self.allow_stale = true;
        self
    }

    /// Require consistent reads.
    pub fn consistent(mut self) -> Self {
        self.require_consistent = true;
        self
    }

    /// Block until the index moves past `index` or `wait` elapses.
    pub fn blocking(mut self, index: u64, wait: Duration) -> Self {
        self.wait_index = Some(index);
        self.wait_time = Some(wait);
        self
    }

    /// Set the blocking-query content hash.
    pub fn with_wait_hash(mut self, hash: impl Into<String>) -> Self {
        self.wait_hash = Some(hash.into());
        self
    }

    /// Sort by proximity to a node.
    pub fn with_near(mut self, node: impl Into<String>) -> Self {
        self.near = Some(node.into());
        self
    }

    /// Add a node metadata filter.
    pub fn with_node_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.node_meta.push((key.into(), value.into()));
        self
    }

    /// Set the relay factor.
    pub fn with_relay_factor(mut self, relay_factor: u8) -> Self {
        self.relay_factor = Some(relay_factor);
        self
    }

    /// Set a filter expression.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Serve from the agent cache, optionally bounding the result age.
    pub fn cached(mut self, max_age: Option<Duration>) -> Self {
        self.use_cache = true;
        self.max_age = max_age;
        self
    }

    /// Set the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Options for write requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Namespace override (`ns`).
    pub namespace: Option<String>,
    /// Datacenter override (`dc`).
    pub datacenter: Option<String>,
    /// ACL token override (`X-Consul-Token`).
    pub token: Option<String>,
    /// Write fan-out hint (`relay-factor`).
    pub relay_factor: Option<u8>,
    /// Per-call timeout recorded for the transport.
    pub timeout: Option<Duration>,
}

impl WriteOptions {
    /// Create empty write options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set the datacenter.
    pub fn with_datacenter(mut self, datacenter: impl Into<String>) -> Self {
        self.datacenter = Some(datacenter.into());
        self
    }

    /// Set the ACL token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the relay factor.
    pub fn with_relay_factor(mut self, relay_factor: u8) -> Self {
        self.relay_factor = Some(relay_factor);
        self
    }

    /// Set the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_options_default_is_empty() {
        let opts = QueryOptions::new();
        assert!(opts.namespace.is_none());
        assert!(!opts.allow_stale);
        assert!(opts.node_meta.is_empty());
        assert!(opts.timeout.is_none());
    }

    #[test]
    fn test_query_options_builders() {
        let opts = QueryOptions::new()
            .with_datacenter("dc2")
            .stale()
            .blocking(10, Duration::from_secs(30))
            .with_node_meta("rack", "r1")
            .cached(Some(Duration::from_secs(60)));

        assert_eq!(opts.datacenter.as_deref(), Some("dc2"));
        assert!(opts.allow_stale);
        assert_eq!(opts.wait_index, Some(10));
        assert_eq!(opts.wait_time, Some(Duration::from_secs(30)));
        assert_eq!(opts.node_meta, vec![("rack".to_string(), "r1".to_string())]);
        assert!(opts.use_cache);
        assert_eq!(opts.max_age, Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_write_options_builders() {
        let opts = WriteOptions::new()
            .with_token("t")
            .with_relay_factor(3)
            .with_timeout(Duration::from_secs(2));

        assert_eq!(opts.token.as_deref(), Some("t"));
        assert_eq!(opts.relay_factor, Some(3));
        assert_eq!(opts.timeout, Some(Duration::from_secs(2)));
    }
}
