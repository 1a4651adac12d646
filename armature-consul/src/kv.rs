//! Key/value store endpoints.

use crate::client::json_kind;
use crate::decode::from_value;
use crate::{ConsulClient, ConsulError, QueryMeta, QueryOptions, Result, WriteMeta, WriteOptions};
use http::Method;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// A key/value entry.
///
/// `value` holds the raw bytes; the agent transfers them base64-encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KvPair {
    /// Full key path.
    #[serde(rename = "Key")]
    pub key: String,
    /// Index at which the key was created.
    #[serde(rename = "CreateIndex", default)]
    pub create_index: u64,
    /// Index of the last modification; used for check-and-set.
    #[serde(rename = "ModifyIndex", default)]
    pub modify_index: u64,
    /// Number of times the key lock was acquired.
    #[serde(rename = "LockIndex", default)]
    pub lock_index: u64,
    /// Opaque user flags.
    #[serde(rename = "Flags", default)]
    pub flags: u64,
    /// Raw value.
    #[serde(rename = "Value", default, with = "base64_value")]
    pub value: Vec<u8>,
    /// Session holding the lock, if any.
    #[serde(rename = "Session", default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
}

impl KvPair {
    /// Create a pair with a key and value.
    pub fn new(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            ..Self::default()
        }
    }

    /// Set the flags.
    pub fn with_flags(mut self, flags: u64) -> Self {
        self.flags = flags;
        self
    }

    /// Set the modify index used by [`Kv::cas`].
    pub fn with_modify_index(mut self, index: u64) -> Self {
        self.modify_index = index;
        self
    }

    /// Set the session used by [`Kv::acquire`] and [`Kv::release`].
    pub fn with_session(mut self, session: impl Into<String>) -> Self {
        self.session = Some(session.into());
        self
    }

    /// Value as UTF-8 text, if it is valid UTF-8.
    pub fn value_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.value).ok()
    }
}

mod base64_value {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(encoded) => STANDARD
                .decode(encoded.as_bytes())
                .map_err(serde::de::Error::custom),
            None => Ok(Vec::new()),
        }
    }
}

/// Key/value endpoints, borrowed from a [`ConsulClient`].
#[derive(Debug, Clone, Copy)]
pub struct Kv<'a> {
    client: &'a ConsulClient,
}

/// Characters escaped in a key. `/` stays literal so prefixes keep their
/// hierarchy.
const KEY_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

fn kv_path(key: &str) -> String {
    let key = key.trim_start_matches('/');
    format!("/v1/kv/{}", utf8_percent_encode(key, KEY_ENCODE_SET))
}

impl<'a> Kv<'a> {
    pub(crate) fn new(client: &'a ConsulClient) -> Self {
        Self { client }
    }

    /// Look up a single key. A missing key yields `None`.
    pub async fn get(
        &self,
        key: &str,
        opts: Option<&QueryOptions>,
    ) -> Result<(Option<KvPair>, QueryMeta)> {
        let request = self.client.query_request(kv_path(key), opts);
        let (value, meta) = self
            .client
            .send_query_allow_missing(request)
            .await
            .into_result()?;

        let pair = match value {
            Some(value) => from_value::<Vec<KvPair>>(value)?.into_iter().next(),
            None => None,
        };
        Ok((pair, meta))
    }

    /// List every entry under a prefix.
    pub async fn list(
        &self,
        prefix: &str,
        opts: Option<&QueryOptions>,
    ) -> Result<(Vec<KvPair>, QueryMeta)> {
        let mut request = self.client.query_request(kv_path(prefix), opts);
        request.params_mut().set("recurse", "");

        let (value, meta) = self
            .client
            .send_query_allow_missing(request)
            .await
            .into_result()?;

        let pairs: Vec<KvPair> = match value {
            Some(value) => from_value(value)?,
            None => Vec::new(),
        };
        debug!(prefix = %prefix, count = pairs.len(), "Listed KV entries");
        Ok((pairs, meta))
    }

    /// List the keys under a prefix, optionally only up to `separator`.
    pub async fn keys(
        &self,
        prefix: &str,
        separator: Option<&str>,
        opts: Option<&QueryOptions>,
    ) -> Result<(Vec<String>, QueryMeta)> {
        let mut request = self.client.query_request(kv_path(prefix), opts);
        request.params_mut().set("keys", "");
        if let Some(separator) = separator.filter(|s| !s.is_empty()) {
            request.params_mut().set("separator", separator);
        }

        let (value, meta) = self
            .client
            .send_query_allow_missing(request)
            .await
            .into_result()?;

        let keys: Vec<String> = match value {
            Some(value) => from_value(value)?,
            None => Vec::new(),
        };
        Ok((keys, meta))
    }

    /// Write a pair. Returns whether the agent accepted the write.
    pub async fn put(
        &self,
        pair: &KvPair,
        opts: Option<&WriteOptions>,
    ) -> Result<(bool, WriteMeta)> {
        self.write(pair, &[], opts).await
    }

    /// Write a pair only if its `modify_index` still matches.
    pub async fn cas(
        &self,
        pair: &KvPair,
        opts: Option<&WriteOptions>,
    ) -> Result<(bool, WriteMeta)> {
        let index = pair.modify_index.to_string();
        self.write(pair, &[("cas", index.as_str())], opts).await
    }

    /// Write a pair while acquiring its lock for `pair.session`.
    pub async fn acquire(
        &self,
        pair: &KvPair,
        opts: Option<&WriteOptions>,
    ) -> Result<(bool, WriteMeta)> {
        let session = require_session(pair)?;
        self.write(pair, &[("acquire", session)], opts).await
    }

    /// Write a pair while releasing the lock held by `pair.session`.
    pub async fn release(
        &self,
        pair: &KvPair,
        opts: Option<&WriteOptions>,
    ) -> Result<(bool, WriteMeta)> {
        let session = require_session(pair)?;
        self.write(pair, &[("release", session)], opts).await
    }

    async fn write(
        &self,
        pair: &KvPair,
        extra: &[(&str, &str)],
        opts: Option<&WriteOptions>,
    ) -> Result<(bool, WriteMeta)> {
        let mut request = self
            .client
            .write_request(Method::PUT, kv_path(&pair.key), None, opts);
        if pair.flags != 0 {
            request.params_mut().set("flags", pair.flags.to_string());
        }
        for (key, value) in extra {
            request.params_mut().set(*key, *value);
        }
        request.set_body(pair.value.clone());

        let (value, meta) = self.client.send_write_value(request).await.into_result()?;
        Ok((expect_bool(value)?, meta))
    }

    /// Delete a single key.
    pub async fn delete(&self, key: &str, opts: Option<&WriteOptions>) -> Result<WriteMeta> {
        self.client.delete(&kv_path(key), opts).await.into_result()
    }

    /// Delete every key under a prefix.
    pub async fn delete_tree(
        &self,
        prefix: &str,
        opts: Option<&WriteOptions>,
    ) -> Result<WriteMeta> {
        let mut request = self
            .client
            .write_request(Method::DELETE, kv_path(prefix), None, opts);
        request.params_mut().set("recurse", "");
        self.client.send_write(request).await.into_result()
    }
}

fn require_session(pair: &KvPair) -> Result<&str> {
    pair.session
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            ConsulError::InvalidArgument(format!("key {} has no session to lock with", pair.key))
        })
}

fn expect_bool(value: Value) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(b),
        other => Err(ConsulError::Shape(format!(
            "expected a JSON boolean, got {}",
            json_kind(Some(&other))
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kv_pair_decodes_base64_value() {
        let pairs: Vec<KvPair> = serde_json::from_value(json!([{
            "Key": "app/config",
            "CreateIndex": 100,
            "ModifyIndex": 200,
            "LockIndex": 0,
            "Flags": 0,
            "Value": "aGVsbG8=",
            "Session": null
        }]))
        .unwrap();

        assert_eq!(pairs[0].key, "app/config");
        assert_eq!(pairs[0].modify_index, 200);
        assert_eq!(pairs[0].value_str(), Some("hello"));
        assert_eq!(pairs[0].session, None);
    }

    #[test]
    fn test_kv_pair_null_value() {
        let pair: KvPair = serde_json::from_value(json!({"Key": "dir/", "Value": null})).unwrap();
        assert!(pair.value.is_empty());
    }

    #[test]
    fn test_kv_pair_serializes_base64() {
        let value = serde_json::to_value(KvPair::new("a", "hi")).unwrap();
        assert_eq!(value["Value"], json!("aGk="));
        assert!(value.get("Session").is_none());
    }

    #[test]
    fn test_kv_path() {
        assert_eq!(kv_path("foo/bar"), "/v1/kv/foo/bar");
        assert_eq!(kv_path("/foo"), "/v1/kv/foo");
        assert_eq!(kv_path("svc/"), "/v1/kv/svc/");
    }

    #[test]
    fn test_kv_path_escapes_reserved_characters() {
        assert_eq!(kv_path("reports/q1#draft"), "/v1/kv/reports/q1%23draft");
        assert_eq!(kv_path("a?b"), "/v1/kv/a%3Fb");
        assert_eq!(kv_path("100%/done"), "/v1/kv/100%25/done");
        assert_eq!(kv_path("my key"), "/v1/kv/my%20key");
        assert_eq!(kv_path("a&b+c"), "/v1/kv/a%26b%2Bc");
    }

    #[test]
    fn test_escaped_key_keeps_query_params() {
        let client = ConsulClient::new(crate::Config::default()).unwrap();
        let mut request = client.query_request(kv_path("reports/q1#draft"), None);
        request.params_mut().set("recurse", "");

        assert_eq!(
            request.uri(),
            "http://127.0.0.1:8500/v1/kv/reports/q1%23draft?recurse="
        );
    }

    #[test]
    fn test_require_session() {
        assert!(matches!(
            require_session(&KvPair::new("k", "v")),
            Err(ConsulError::InvalidArgument(_))
        ));
        let pair = KvPair::new("k", "v").with_session("abc");
        assert_eq!(require_session(&pair).unwrap(), "abc");
    }

    #[test]
    fn test_expect_bool() {
        assert!(expect_bool(json!(true)).unwrap());
        assert!(!expect_bool(json!(false)).unwrap());
        assert!(matches!(expect_bool(json!("yes")), Err(ConsulError::Shape(_))));
    }
}
