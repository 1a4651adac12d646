//! Consul client configuration.

use crate::meta::parse_bool;
use crate::{ConsulError, HttpTransport, Result};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default agent address.
pub const DEFAULT_ADDRESS: &str = "127.0.0.1:8500";

/// Default URI scheme.
pub const DEFAULT_SCHEME: &str = "http";

/// Environment variable holding the agent address.
pub const ENV_HTTP_ADDR: &str = "CONSUL_HTTP_ADDR";
/// Environment variable holding the ACL token.
pub const ENV_HTTP_TOKEN: &str = "CONSUL_HTTP_TOKEN";
/// Environment variable switching the scheme to https.
pub const ENV_HTTP_SSL: &str = "CONSUL_HTTP_SSL";
/// Environment variable holding the default namespace.
pub const ENV_NAMESPACE: &str = "CONSUL_NAMESPACE";
/// Environment variable holding the default datacenter.
pub const ENV_DATACENTER: &str = "CONSUL_DATACENTER";

/// How structured request bodies are rendered as JSON.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JsonEncoding {
    /// Compact single-line JSON.
    #[default]
    Compact,
    /// Indented JSON.
    Pretty,
}

/// Consul client configuration.
///
/// Empty strings and a zero wait time mean "not configured": they add no
/// query parameter or header to outgoing requests.
#[derive(Clone)]
pub struct Config {
    /// Agent address as `host:port`.
    pub address: String,
    /// URI scheme, `http` or `https`.
    pub scheme: String,
    /// Default datacenter.
    pub datacenter: String,
    /// Default namespace.
    pub namespace: String,
    /// Default ACL token.
    pub token: String,
    /// Default blocking-query wait time.
    pub wait_time: Duration,
    /// JSON rendering of structured bodies.
    pub json_encoding: JsonEncoding,
    /// Transport used to execute requests.
    pub transport: Option<Arc<dyn HttpTransport>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            scheme: DEFAULT_SCHEME.to_string(),
            datacenter: String::new(),
            namespace: String::new(),
            token: String::new(),
            wait_time: Duration::ZERO,
            json_encoding: JsonEncoding::Compact,
            transport: None,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("address", &self.address)
            .field("scheme", &self.scheme)
            .field("datacenter", &self.datacenter)
            .field("namespace", &self.namespace)
            .field("token", &if self.token.is_empty() { "" } else { "<redacted>" })
            .field("wait_time", &self.wait_time)
            .field("json_encoding", &self.json_encoding)
            .field("transport", &self.transport.as_ref().map(|_| "<transport>"))
            .finish()
    }
}

impl Config {
    /// Create a new configuration builder.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Load configuration from the process environment.
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup(ENV_HTTP_ADDR).filter(|v| !v.is_empty()) {
            let addr = addr.trim().trim_end_matches('/');
            if let Some(rest) = addr.strip_prefix("https://") {
                config.scheme = "https".to_string();
                config.address = rest.to_string();
            } else if let Some(rest) = addr.strip_prefix("http://") {
                config.address = rest.to_string();
            } else {
                config.address = addr.to_string();
            }
        }

        if let Some(token) = lookup(ENV_HTTP_TOKEN) {
            config.token = token;
        }

        if let Some(ssl) = lookup(ENV_HTTP_SSL).filter(|v| !v.is_empty()) {
            let enabled = parse_bool(&ssl).ok_or_else(|| {
                ConsulError::Config(format!("{} must be a boolean, got \"{}\"", ENV_HTTP_SSL, ssl))
            })?;
            if enabled {
                config.scheme = "https".to_string();
            }
        }

        if let Some(namespace) = lookup(ENV_NAMESPACE) {
            config.namespace = namespace;
        }

        if let Some(datacenter) = lookup(ENV_DATACENTER) {
            config.datacenter = datacenter;
        }

        Ok(config)
    }

    /// Check the invariants a request needs: non-empty address and scheme.
    pub fn validate(&self) -> Result<()> {
        if self.address.trim().is_empty() {
            return Err(ConsulError::Config("address must not be empty".to_string()));
        }
        if self.scheme.trim().is_empty() {
            return Err(ConsulError::Config("scheme must not be empty".to_string()));
        }
        Ok(())
    }

    /// Render the default wait time as a query parameter value.
    pub(crate) fn wait_param(&self) -> Option<String> {
        duration_to_millis_param(self.wait_time)
    }
}

/// Render a duration the way the agent expects for `wait`: `"{ms}ms"`.
///
/// Returns `None` for a zero duration.
pub(crate) fn duration_to_millis_param(duration: Duration) -> Option<String> {
    if duration.is_zero() {
        None
    } else {
        Some(format!("{}ms", duration.as_millis()))
    }
}

/// Builder for Consul client configuration.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the agent address (`host:port`).
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.config.address = address.into();
        self
    }

    /// Set the URI scheme.
    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.config.scheme = scheme.into();
        self
    }

    /// Set the default datacenter.
    pub fn datacenter(mut self, datacenter: impl Into<String>) -> Self {
        self.config.datacenter = datacenter.into();
        self
    }

    /// Set the default namespace.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.namespace = namespace.into();
        self
    }

    /// Set the default ACL token.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.config.token = token.into();
        self
    }

    /// Set the default blocking-query wait time.
    pub fn wait_time(mut self, wait_time: Duration) -> Self {
        self.config.wait_time = wait_time;
        self
    }

    /// Set the JSON rendering of structured bodies.
    pub fn json_encoding(mut self, encoding: JsonEncoding) -> Self {
        self.config.json_encoding = encoding;
        self
    }

    /// Set the transport.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.config.transport = Some(transport);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Config {
        self.config
    }
}
