//! Query and write metadata built from response headers and timing.

use crate::transport::TransportResponse;
use std::time::Duration;

/// Raft index of the returned data.
pub const HEADER_INDEX: &str = "X-Consul-Index";
/// Hash of the returned data, for hash-based blocking queries.
pub const HEADER_CONTENT_HASH: &str = "X-Consul-ContentHash";
/// Whether the serving node knew of a leader.
pub const HEADER_KNOWN_LEADER: &str = "X-Consul-KnownLeader";
/// Milliseconds since the serving node last heard from the leader.
pub const HEADER_LAST_CONTACT: &str = "X-Consul-LastContact";
/// Whether addresses in the result were translated for WAN access.
pub const HEADER_TRANSLATE_ADDRESSES: &str = "X-Consul-Translate-Addresses";
/// Agent cache outcome (`HIT` or `MISS`), or the cache age in seconds.
pub const HEADER_CACHE: &str = "X-Cache";
/// Age in seconds of a cached result.
pub const HEADER_AGE: &str = "Age";
/// Default ACL policy of the cluster.
pub const HEADER_DEFAULT_ACL_POLICY: &str = "X-Consul-Default-ACL-Policy";
/// Whether ACLs removed entries from the result.
pub const HEADER_RESULTS_FILTERED_BY_ACLS: &str = "X-Consul-Results-Filtered-By-ACLs";

/// Metadata returned with the result of a read.
///
/// Every field keeps its zero value when the corresponding header is
/// missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryMeta {
    /// Time spent executing the request.
    pub request_time: Duration,
    /// URL the request was sent to.
    pub request_url: String,
    /// Index to pass as `wait_index` for a blocking follow-up.
    pub last_index: u64,
    /// Hash to pass as `wait_hash` for a blocking follow-up.
    pub last_content_hash: String,
    /// Whether the serving node knew of a leader.
    pub known_leader: bool,
    /// Time since the serving node last contacted the leader.
    pub last_contact: Duration,
    /// Whether addresses were translated.
    pub address_translation_enabled: bool,
    /// Whether the agent cache served the result.
    pub cache_hit: bool,
    /// Age of the cached result.
    pub cache_age: Duration,
    /// Cluster default ACL policy, when reported.
    pub default_acl_policy: String,
    /// Whether ACLs filtered the result.
    pub results_filtered_by_acls: bool,
}

/// Metadata returned with the result of a write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteMeta {
    /// Time spent executing the request.
    pub request_time: Duration,
}

/// Build query metadata from a response.
pub fn build_query_meta(duration: Duration, response: &TransportResponse, url: &str) -> QueryMeta {
    let mut meta = QueryMeta {
        request_time: duration,
        request_url: url.to_string(),
        ..QueryMeta::default()
    };
    let header = |name: &str| response.header_line(name);

    let h = header(HEADER_INDEX);
    if !h.is_empty() {
        meta.last_index = parse_leading_u64(&h);
    }

    meta.last_content_hash = header(HEADER_CONTENT_HASH);

    let h = header(HEADER_KNOWN_LEADER);
    if !h.is_empty() {
        meta.known_leader = parse_bool(&h).unwrap_or(false);
    }

    let h = header(HEADER_LAST_CONTACT);
    if !h.is_empty() {
        meta.last_contact = Duration::from_millis(parse_leading_u64(&h));
    }

    let h = header(HEADER_TRANSLATE_ADDRESSES);
    if !h.is_empty() {
        meta.address_translation_enabled = parse_bool(&h).unwrap_or(false);
    }

    // The cache header may carry the age itself; `Age` wins when present.
    let h = header(HEADER_CACHE);
    if !h.is_empty() {
        meta.cache_hit = h.trim().eq_ignore_ascii_case("HIT");
        meta.cache_age = Duration::from_secs(parse_leading_u64(&h));
    }

    let h = header(HEADER_AGE);
    if !h.is_empty() {
        meta.cache_age = Duration::from_secs(parse_leading_u64(&h));
    }

    meta.default_acl_policy = header(HEADER_DEFAULT_ACL_POLICY);

    let h = header(HEADER_RESULTS_FILTERED_BY_ACLS);
    if !h.is_empty() {
        meta.results_filtered_by_acls = parse_bool(&h).unwrap_or(false);
    }

    meta
}

/// Build write metadata.
pub fn build_write_meta(duration: Duration) -> WriteMeta {
    WriteMeta {
        request_time: duration,
    }
}

/// Parse a boolean string (`1`, `t`, `true`, `0`, `f`, `false` and their
/// upper/title-case forms).
pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// Parse the leading decimal digits of a header value; `0` when none.
fn parse_leading_u64(value: &str) -> u64 {
    let value = value.trim_start();
    let end = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    value[..end].parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "http://127.0.0.1:8500/v1/kv/foo";

    #[test]
    fn test_index_header() {
        let response = TransportResponse::new(200).with_header("X-Consul-Index", "42");
        let meta = build_query_meta(Duration::from_millis(3), &response, URL);

        assert_eq!(meta.last_index, 42);
        assert_eq!(meta.request_time, Duration::from_millis(3));
        assert_eq!(meta.request_url, URL);
    }

    #[test]
    fn test_missing_headers_keep_zero_values() {
        let response = TransportResponse::new(200);
        let meta = build_query_meta(Duration::from_millis(1), &response, URL);

        assert_eq!(
            meta,
            QueryMeta {
                request_time: Duration::from_millis(1),
                request_url: URL.to_string(),
                ..QueryMeta::default()
            }
        );
    }

    #[test]
    fn test_all_headers() {
        let response = TransportResponse::new(200)
            .with_header("x-consul-index", "1001")
            .with_header("x-consul-contenthash", "5f1c2d")
            .with_header("x-consul-knownleader", "true")
            .with_header("x-consul-lastcontact", "25")
            .with_header("x-consul-translate-addresses", "true")
            .with_header("x-cache", "HIT")
            .with_header("age", "30")
            .with_header("x-consul-default-acl-policy", "deny")
            .with_header("x-consul-results-filtered-by-acls", "true");

        let meta = build_query_meta(Duration::ZERO, &response, URL);

        assert_eq!(meta.last_index, 1001);
        assert_eq!(meta.last_content_hash, "5f1c2d");
        assert!(meta.known_leader);
        assert_eq!(meta.last_contact, Duration::from_millis(25));
        assert!(meta.address_translation_enabled);
        assert!(meta.cache_hit);
        assert_eq!(meta.cache_age, Duration::from_secs(30));
        assert_eq!(meta.default_acl_policy, "deny");
        assert!(meta.results_filtered_by_acls);
    }

    #[test]
    fn test_false_and_junk_values() {
        let response = TransportResponse::new(200)
            .with_header("X-Consul-KnownLeader", "false")
            .with_header("X-Consul-Index", "abc")
            .with_header("X-Cache", "MISS")
            .with_header("Age", "12s");

        let meta = build_query_meta(Duration::ZERO, &response, URL);

        assert!(!meta.known_leader);
        assert_eq!(meta.last_index, 0);
        assert!(!meta.cache_hit);
        assert_eq!(meta.cache_age, Duration::from_secs(12));
    }

    #[test]
    fn test_cache_header_carries_age() {
        let response = TransportResponse::new(200).with_header("X-Cache", "30");
        let meta = build_query_meta(Duration::ZERO, &response, URL);

        assert_eq!(meta.cache_age, Duration::from_secs(30));
        assert!(!meta.cache_hit);

        let response = TransportResponse::new(200).with_header("X-Cache", "45s");
        let meta = build_query_meta(Duration::ZERO, &response, URL);
        assert_eq!(meta.cache_age, Duration::from_secs(45));
    }

    #[test]
    fn test_age_header_overrides_cache_header() {
        let response = TransportResponse::new(200)
            .with_header("X-Cache", "30")
            .with_header("Age", "4");
        let meta = build_query_meta(Duration::ZERO, &response, URL);

        assert_eq!(meta.cache_age, Duration::from_secs(4));
    }

    #[test]
    fn test_write_meta() {
        let meta = build_write_meta(Duration::from_millis(9));
        assert_eq!(meta.request_time, Duration::from_millis(9));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("True"), Some(true));
        assert_eq!(parse_bool(" false "), Some(false));
        assert_eq!(parse_bool("yes"), None);
    }

    #[test]
    fn test_parse_leading_u64() {
        assert_eq!(parse_leading_u64("42"), 42);
        assert_eq!(parse_leading_u64(" 7ms"), 7);
        assert_eq!(parse_leading_u64(""), 0);
        assert_eq!(parse_leading_u64("-1"), 0);
    }
}
