//! Consul client: transport invocation and the composite call patterns.

use crate::decode::{decode_body, from_value};
use crate::meta::{build_query_meta, build_write_meta};
use crate::transport::ReqwestTransport;
use crate::{
    Config, ConsulError, Kv, QueryMeta, QueryOptions, Request, RequestResponse, Result, Status,
    ValuedQueryResponse, ValuedWriteResponse, ValuedWriteStringResponse, WriteOptions,
    WriteResponse,
};
use http::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Client for the Consul agent HTTP API.
///
/// The client holds its own snapshot of the configuration, taken at
/// construction. Cloning is cheap and clones share the snapshot.
#[derive(Clone, Debug)]
pub struct ConsulClient {
    config: Arc<Config>,
}

impl ConsulClient {
    /// Create a client from a configuration.
    ///
    /// The configuration is copied; later changes to the caller's value do
    /// not affect the client. A missing transport is not an error here, but
    /// every call will then fail with [`ConsulError::Transport`].
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
        })
    }

    /// Create a client, installing a [`ReqwestTransport`] if the
    /// configuration has none.
    pub fn with_default_transport(mut config: Config) -> Result<Self> {
        if config.transport.is_none() {
            config.transport = Some(Arc::new(ReqwestTransport::new()?));
        }
        Self::new(config)
    }

    /// Create a client from the process environment with the default
    /// transport.
    pub fn from_env() -> Result<Self> {
        Self::with_default_transport(Config::from_env()?)
    }

    /// Get the client configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Key/value endpoints.
    pub fn kv(&self) -> Kv<'_> {
        Kv::new(self)
    }

    /// Status endpoints.
    pub fn status(&self) -> Status<'_> {
        Status::new(self)
    }

    /// Build a request seeded with the client config.
    pub fn new_request(
        &self,
        method: Method,
        path: impl Into<String>,
        body: Option<&Value>,
    ) -> Request {
        Request::new(method, path, Arc::clone(&self.config), body)
    }

    /// Build a write request with options applied.
    pub fn write_request(
        &self,
        method: Method,
        path: impl Into<String>,
        body: Option<&Value>,
        opts: Option<&WriteOptions>,
    ) -> Request {
        let mut request = self.new_request(method, path, body);
        request.apply_write_options(opts);
        request
    }

    /// Build a GET request with options applied.
    pub fn query_request(&self, path: impl Into<String>, opts: Option<&QueryOptions>) -> Request {
        let mut request = self.new_request(Method::GET, path, None);
        request.apply_query_options(opts);
        request
    }

    /// Execute a request against the configured transport.
    ///
    /// Never fails outright: transport failures are recorded in the result,
    /// which always carries the elapsed time.
    pub async fn execute(&self, request: Request) -> RequestResponse {
        let request = request.into_transport_request();
        let url = request.uri.clone();
        let method = request.method.clone();
        let start = Instant::now();

        let Some(transport) = self.config.transport.as_ref() else {
            let error = ConsulError::Transport {
                uri: url.clone(),
                message: "Unable to execute query as no transport has been defined".to_string(),
            };
            warn!(method = %method, url = %url, "No transport configured");
            return RequestResponse::new(start.elapsed(), url, None, Some(error));
        };

        match transport.send(request).await {
            Ok(response) => {
                let duration = start.elapsed();
                debug!(
                    method = %method,
                    url = %url,
                    status = response.status,
                    elapsed_ms = duration.as_millis() as u64,
                    "Consul request completed"
                );
                RequestResponse::new(duration, url, Some(response), None)
            }
            Err(e) => {
                let duration = start.elapsed();
                warn!(
                    method = %method,
                    url = %url,
                    error = %e,
                    elapsed_ms = duration.as_millis() as u64,
                    "Consul request failed"
                );
                let error = ConsulError::Transport {
                    uri: url.clone(),
                    message: e.to_string(),
                };
                RequestResponse::new(duration, url, None, Some(error))
            }
        }
    }

    /// Execute a write without decoding the body.
    pub async fn send_write(&self, request: Request) -> WriteResponse {
        let result = self.execute(request).await.require_ok();
        WriteResponse {
            meta: build_write_meta(result.duration),
            error: result.error,
        }
    }

    /// Execute a write and decode its JSON body.
    pub async fn send_write_value(&self, request: Request) -> ValuedWriteResponse {
        let (duration, _, outcome) = self.execute(request).await.require_ok().into_parts();
        let response = match outcome {
            Ok(response) => response,
            Err(e) => return ValuedWriteResponse::failed(e),
        };

        let decoded = decode_body(&response.body);
        if let Some(e) = decoded.error {
            return ValuedWriteResponse::failed(e);
        }

        ValuedWriteResponse {
            value: decoded.decoded,
            meta: Some(build_write_meta(duration)),
            error: None,
        }
    }

    /// Execute a read and decode its JSON body.
    pub async fn send_query(&self, request: Request) -> ValuedQueryResponse {
        self.run_query(request, false).await
    }

    /// Execute a read where `404 Not Found` means "no value".
    ///
    /// A 404 yields `value: None` with metadata and no error.
    pub async fn send_query_allow_missing(&self, request: Request) -> ValuedQueryResponse {
        self.run_query(request, true).await
    }

    async fn run_query(&self, request: Request, allow_missing: bool) -> ValuedQueryResponse {
        let result = self.execute(request).await;

        if allow_missing
            && result.error.is_none()
            && let Some(response) = result.response.as_ref()
            && response.status == 404
        {
            return ValuedQueryResponse {
                value: None,
                meta: Some(build_query_meta(result.duration, response, &result.url)),
                error: None,
            };
        }

        let (duration, url, outcome) = result.require_ok().into_parts();
        let response = match outcome {
            Ok(response) => response,
            Err(e) => return ValuedQueryResponse::failed(e),
        };

        let decoded = decode_body(&response.body);
        if let Some(e) = decoded.error {
            return ValuedQueryResponse::failed(e);
        }

        ValuedQueryResponse {
            value: decoded.decoded,
            meta: Some(build_query_meta(duration, &response, &url)),
            error: None,
        }
    }

    /// `PUT` a body; no response body is decoded.
    pub async fn put(
        &self,
        path: &str,
        body: Option<&Value>,
        opts: Option<&WriteOptions>,
    ) -> WriteResponse {
        self.send_write(self.write_request(Method::PUT, path, body, opts))
            .await
    }

    /// `PUT` a body, keeping only the outcome.
    pub async fn put_no_response(
        &self,
        path: &str,
        body: Option<&Value>,
        opts: Option<&WriteOptions>,
    ) -> Result<()> {
        let result = self
            .execute(self.write_request(Method::PUT, path, body, opts))
            .await
            .require_ok();
        match result.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// `PUT` a body and decode a JSON string response.
    pub async fn put_with_string_result(
        &self,
        path: &str,
        body: Option<&Value>,
        opts: Option<&WriteOptions>,
    ) -> ValuedWriteStringResponse {
        let (duration, _, outcome) = self
            .execute(self.write_request(Method::PUT, path, body, opts))
            .await
            .require_ok()
            .into_parts();
        let response = match outcome {
            Ok(response) => response,
            Err(e) => return ValuedWriteStringResponse::failed(e),
        };

        let decoded = decode_body(&response.body);
        if let Some(e) = decoded.error {
            return ValuedWriteStringResponse::failed(e);
        }

        match decoded.decoded {
            Some(Value::String(value)) => ValuedWriteStringResponse {
                value,
                meta: Some(build_write_meta(duration)),
                error: None,
            },
            other => ValuedWriteStringResponse::failed(ConsulError::Shape(format!(
                "expected a JSON string, got {}",
                json_kind(other.as_ref())
            ))),
        }
    }

    /// `PUT` a body and decode a JSON response of any shape.
    pub async fn put_with_value(
        &self,
        path: &str,
        body: Option<&Value>,
        opts: Option<&WriteOptions>,
    ) -> ValuedWriteResponse {
        self.send_write_value(self.write_request(Method::PUT, path, body, opts))
            .await
    }

    /// `DELETE` a resource.
    pub async fn delete(&self, path: &str, opts: Option<&WriteOptions>) -> WriteResponse {
        self.send_write(self.write_request(Method::DELETE, path, None, opts))
            .await
    }

    /// `GET` a resource and decode its JSON body.
    pub async fn query(&self, path: &str, opts: Option<&QueryOptions>) -> ValuedQueryResponse {
        self.send_query(self.query_request(path, opts)).await
    }

    /// `GET` a resource and deserialize it into `T`.
    pub async fn query_as<T: DeserializeOwned>(
        &self,
        path: &str,
        opts: Option<&QueryOptions>,
    ) -> Result<(T, QueryMeta)> {
        let (value, meta) = self.query(path, opts).await.into_result()?;
        Ok((from_value(value.unwrap_or(Value::Null))?, meta))
    }
}

pub(crate) fn json_kind(value: Option<&Value>) -> &'static str {
    match value {
        None | Some(Value::Null) => "null",
        Some(Value::Bool(_)) => "boolean",
        Some(Value::Number(_)) => "number",
        Some(Value::String(_)) => "string",
        Some(Value::Array(_)) => "array",
        Some(Value::Object(_)) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_client_rejects_invalid_config() {
        let config = Config::builder().address("").build();
        assert!(matches!(ConsulClient::new(config), Err(ConsulError::Config(_))));
    }

    #[test]
    fn test_client_snapshots_config() {
        let mut config = Config::builder().datacenter("dc1").build();
        let client = ConsulClient::new(config.clone()).unwrap();

        config.datacenter = "dc2".to_string();
        assert_eq!(client.config().datacenter, "dc1");
    }

    #[test]
    fn test_with_default_transport_installs_reqwest() {
        let client = ConsulClient::with_default_transport(Config::default()).unwrap();
        assert!(client.config().transport.is_some());
    }

    #[test]
    fn test_query_request_applies_options() {
        let client = ConsulClient::new(Config::default()).unwrap();
        let mut request =
            client.query_request("/v1/catalog/nodes", Some(&QueryOptions::new().stale()));

        assert_eq!(request.method(), "GET");
        assert_eq!(request.uri(), "http://127.0.0.1:8500/v1/catalog/nodes?stale=");
    }

    #[test]
    fn test_write_request_applies_options() {
        let client = ConsulClient::new(Config::default()).unwrap();
        let request = client.write_request(
            Method::PUT,
            "/v1/kv/a",
            Some(&json!({"a": 1})),
            Some(&WriteOptions::new().with_timeout(Duration::from_secs(2))),
        );

        assert_eq!(request.method(), "PUT");
        assert_eq!(request.timeout(), Some(Duration::from_secs(2)));
        assert_eq!(request.body().map(|b| &b[..]), Some(&br#"{"a":1}"#[..]));
    }

    #[tokio::test]
    async fn test_execute_without_transport() {
        let client = ConsulClient::new(Config::default()).unwrap();
        let result = client
            .execute(client.new_request(Method::GET, "/v1/agent/self", None))
            .await;

        assert!(result.response.is_none());
        match result.error {
            Some(ConsulError::Transport { uri, .. }) => {
                assert_eq!(uri, "http://127.0.0.1:8500/v1/agent/self");
            }
            other => panic!("expected transport error, got {:?}", other),
        }
    }

    #[test]
    fn test_put_no_response_without_transport() {
        let client = ConsulClient::new(Config::default()).unwrap();
        let err = tokio_test::block_on(client.put_no_response("/v1/agent/leave", None, None))
            .unwrap_err();

        assert!(err.is_transport());
        assert!(err.to_string().contains("no transport has been defined"));
    }

    #[test]
    fn test_json_kind() {
        assert_eq!(json_kind(None), "null");
        assert_eq!(json_kind(Some(&json!(1))), "number");
        assert_eq!(json_kind(Some(&json!({}))), "object");
    }
}
