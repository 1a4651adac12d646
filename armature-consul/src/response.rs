//! Raw call results and the typed responses built from them.

use crate::transport::TransportResponse;
use crate::{ConsulError, QueryMeta, Result, WriteMeta};
use serde_json::Value;
use std::time::Duration;

/// Outcome of executing one request against the transport.
///
/// The duration is always populated, even when the call failed.
#[derive(Debug, Clone)]
pub struct RequestResponse {
    /// Wall-clock time spent in the transport.
    pub duration: Duration,
    /// URL the request was sent to.
    pub url: String,
    /// Response, when one was received.
    pub response: Option<TransportResponse>,
    /// First error seen for this call.
    pub error: Option<ConsulError>,
}

impl RequestResponse {
    /// Create a new result.
    pub fn new(
        duration: Duration,
        url: impl Into<String>,
        response: Option<TransportResponse>,
        error: Option<ConsulError>,
    ) -> Self {
        Self {
            duration,
            url: url.into(),
            response,
            error,
        }
    }

    /// Require the response status to be `expected`.
    ///
    /// An existing error is passed through untouched, and so is a result
    /// without a response. Otherwise a mismatching status replaces the
    /// result's error with [`ConsulError::Status`]; the response and the
    /// duration are kept.
    pub fn require_status(mut self, expected: u16) -> Self {
        if self.error.is_some() {
            return self;
        }
        let Some(response) = &self.response else {
            return self;
        };

        if !(100..=999).contains(&response.status) {
            self.error = Some(ConsulError::Shape(format!(
                "response carries invalid status code {}",
                response.status
            )));
            return self;
        }

        if response.status != expected {
            self.error = Some(ConsulError::Status {
                expected,
                actual: response.status,
                reason: response.reason.clone(),
            });
        }

        self
    }

    /// Require a `200 OK` response.
    pub fn require_ok(self) -> Self {
        self.require_status(200)
    }

    /// Check whether an error has been recorded.
    pub fn is_err(&self) -> bool {
        self.error.is_some()
    }

    /// Split into the response or the first error.
    ///
    /// A result with neither is reported as a shape error since there is
    /// nothing to decode.
    pub(crate) fn into_parts(self) -> (Duration, String, Result<TransportResponse>) {
        let outcome = match (self.error, self.response) {
            (Some(err), _) => Err(err),
            (None, Some(response)) => Ok(response),
            (None, None) => Err(ConsulError::Shape("no response received".to_string())),
        };
        (self.duration, self.url, outcome)
    }
}

/// Require the response status to be `expected`.
pub fn require_status(result: RequestResponse, expected: u16) -> RequestResponse {
    result.require_status(expected)
}

/// Require a `200 OK` response.
pub fn require_ok(result: RequestResponse) -> RequestResponse {
    result.require_ok()
}

fn missing_meta() -> ConsulError {
    ConsulError::Shape("response carries neither metadata nor error".to_string())
}

/// Result of a write without a decoded body.
#[derive(Debug, Clone)]
pub struct WriteResponse {
    /// Write metadata; populated even when the call failed.
    pub meta: WriteMeta,
    /// First error seen for this call.
    pub error: Option<ConsulError>,
}

impl WriteResponse {
    /// Convert into a plain `Result`.
    pub fn into_result(self) -> Result<WriteMeta> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.meta),
        }
    }
}

/// Result of a write whose body is a JSON string.
#[derive(Debug, Clone)]
pub struct ValuedWriteStringResponse {
    /// Decoded string; empty on error.
    pub value: String,
    /// Write metadata, absent on error.
    pub meta: Option<WriteMeta>,
    /// First error seen for this call.
    pub error: Option<ConsulError>,
}

impl ValuedWriteStringResponse {
    pub(crate) fn failed(error: ConsulError) -> Self {
        Self {
            value: String::new(),
            meta: None,
            error: Some(error),
        }
    }

    /// Convert into a plain `Result`.
    pub fn into_result(self) -> Result<(String, WriteMeta)> {
        match (self.error, self.meta) {
            (Some(err), _) => Err(err),
            (None, Some(meta)) => Ok((self.value, meta)),
            (None, None) => Err(missing_meta()),
        }
    }
}

/// Result of a write whose body is arbitrary JSON.
#[derive(Debug, Clone)]
pub struct ValuedWriteResponse {
    /// Decoded value, absent on error.
    pub value: Option<Value>,
    /// Write metadata, absent on error.
    pub meta: Option<WriteMeta>,
    /// First error seen for this call.
    pub error: Option<ConsulError>,
}

impl ValuedWriteResponse {
    pub(crate) fn failed(error: ConsulError) -> Self {
        Self {
            value: None,
            meta: None,
            error: Some(error),
        }
    }

    /// Convert into a plain `Result`.
    pub fn into_result(self) -> Result<(Value, WriteMeta)> {
        match (self.error, self.meta) {
            (Some(err), _) => Err(err),
            (None, Some(meta)) => Ok((self.value.unwrap_or(Value::Null), meta)),
            (None, None) => Err(missing_meta()),
        }
    }
}

/// Result of a read.
#[derive(Debug, Clone)]
pub struct ValuedQueryResponse {
    /// Decoded value; `None` on error or when the agent reported absence.
    pub value: Option<Value>,
    /// Query metadata, absent on error.
    pub meta: Option<QueryMeta>,
    /// First error seen for this call.
    pub error: Option<ConsulError>,
}

impl ValuedQueryResponse {
    pub(crate) fn failed(error: ConsulError) -> Self {
        Self {
            value: None,
            meta: None,
            error: Some(error),
        }
    }

    /// Convert into a plain `Result`.
    pub fn into_result(self) -> Result<(Option<Value>, QueryMeta)> {
        match (self.error, self.meta) {
            (Some(err), _) => Err(err),
            (None, Some(meta)) => Ok((self.value, meta)),
            (None, None) => Err(missing_meta()),
        }
    }
}
