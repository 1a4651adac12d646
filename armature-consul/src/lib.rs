//! # Armature Consul
//!
//! Client for the Consul agent HTTP API.
//!
//! Every call runs through the same pipeline:
//!
//! 1. **Build** a [`Request`] from the client [`Config`], per-call
//!    [`QueryOptions`] / [`WriteOptions`] and an optional body.
//! 2. **Execute** it against a pluggable [`HttpTransport`], timing the call.
//! 3. **Classify** the outcome, requiring the expected status code.
//! 4. **Decode** the JSON body and the agent's metadata headers into
//!    [`QueryMeta`] / [`WriteMeta`].
//!
//! Each stage passes the first error it sees through untouched, and the
//! elapsed time survives even when a call fails.
//!
//! ## Features
//!
//! - **Typed options**: unset overrides are distinguishable from explicit
//!   empty values
//! - **Consistency metadata**: last index, known leader, last contact, cache
//!   age
//! - **Pluggable transport**: `reqwest` by default, anything implementing
//!   [`HttpTransport`] otherwise
//! - **Façades**: [`Kv`] and [`Status`] built on the composite calls
//!
//! No retries, caching or blocking-query loops are performed; layer those on
//! top of the primitives here.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use armature_consul::{Config, ConsulClient, KvPair};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ConsulClient::with_default_transport(Config::default())?;
//!
//!     client.kv().put(&KvPair::new("app/mode", "blue"), None).await?;
//!
//!     let (pair, meta) = client.kv().get("app/mode", None).await?;
//!     let value = pair.and_then(|p| p.value_str().map(String::from));
//!     println!("{:?} at index {}", value, meta.last_index);
//!     Ok(())
//! }
//! ```
//!
//! ## Composite Calls
//!
//! ```rust,no_run
//! use armature_consul::{Config, ConsulClient, QueryOptions, WriteOptions};
//! use serde_json::json;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::builder()
//!         .address("consul.service:8500")
//!         .datacenter("dc1")
//!         .build();
//!     let client = ConsulClient::with_default_transport(config)?;
//!
//!     // Write, keeping only success or failure
//!     client
//!         .put_no_response(
//!             "/v1/agent/service/register",
//!             Some(&json!({"Name": "web", "Port": 8080})),
//!             Some(&WriteOptions::new().with_timeout(Duration::from_secs(5))),
//!         )
//!         .await?;
//!
//!     // Read, with consistency metadata
//!     let (services, meta) = client
//!         .query("/v1/catalog/services", Some(&QueryOptions::new().stale()))
//!         .await
//!         .into_result()?;
//!     println!("{:?} (known leader: {})", services, meta.known_leader);
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod decode;
mod error;
mod headers;
mod kv;
mod meta;
mod options;
mod params;
mod request;
mod response;
mod status;
mod transport;

pub use client::ConsulClient;
pub use config::{
    Config, ConfigBuilder, DEFAULT_ADDRESS, DEFAULT_SCHEME, ENV_DATACENTER, ENV_HTTP_ADDR,
    ENV_HTTP_SSL, ENV_HTTP_TOKEN, ENV_NAMESPACE, JsonEncoding,
};
pub use decode::{DecodedBody, decode_body, from_value};
pub use error::{ConsulError, Result};
pub use headers::Headers;
pub use kv::{Kv, KvPair};
pub use meta::{
    HEADER_AGE, HEADER_CACHE, HEADER_CONTENT_HASH, HEADER_DEFAULT_ACL_POLICY, HEADER_INDEX,
    HEADER_KNOWN_LEADER, HEADER_LAST_CONTACT, HEADER_RESULTS_FILTERED_BY_ACLS,
    HEADER_TRANSLATE_ADDRESSES, QueryMeta, WriteMeta, build_query_meta, build_write_meta,
};
pub use options::{QueryOptions, WriteOptions};
pub use params::Params;
pub use request::{HEADER_CACHE_CONTROL, HEADER_TOKEN, Request, encode_body};
pub use response::{
    RequestResponse, ValuedQueryResponse, ValuedWriteResponse, ValuedWriteStringResponse,
    WriteResponse, require_ok, require_status,
};
pub use status::Status;
pub use transport::{BoxError, HttpTransport, ReqwestTransport, TransportRequest, TransportResponse};

// Re-export common types
pub use bytes::Bytes;
pub use http::Method;
pub use serde_json::Value;

/// Prelude for common imports.
///
/// ```
/// use armature_consul::prelude::*;
/// ```
pub mod prelude {
    pub use crate::client::ConsulClient;
    pub use crate::config::{Config, ConfigBuilder, JsonEncoding};
    pub use crate::error::{ConsulError, Result};
    pub use crate::kv::{Kv, KvPair};
    pub use crate::meta::{QueryMeta, WriteMeta};
    pub use crate::options::{QueryOptions, WriteOptions};
    pub use crate::response::{
        RequestResponse, ValuedQueryResponse, ValuedWriteResponse, ValuedWriteStringResponse,
        WriteResponse,
    };
    pub use crate::transport::{
        HttpTransport, ReqwestTransport, TransportRequest, TransportResponse,
    };
}
