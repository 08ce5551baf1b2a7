//! Inbound event types for the relay.
//!
//! The [`Event`] struct is whatever JSON document the invoking environment
//! hands us. The relay never looks inside it; it only logs it and forwards
//! it as the input of a new workflow execution.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// An event delivered to the relay.
///
/// Events carry no fixed schema. Any JSON document the runtime delivers is
/// accepted as-is and forwarded without transformation.
///
/// # Example
///
/// ```json
/// {
///   "bucket": "training-data",
///   "key": "2025/12/11/batch-001.csv"
/// }
/// ```
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(transparent)]
pub struct Event(Value);

impl Event {
    /// Wrap an arbitrary JSON value
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Borrow the underlying JSON value
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consume the event, returning the underlying JSON value
    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for Event {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Compact JSON, used when the event is written to the log.
impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Opaque handle describing the invocation that delivered an event.
///
/// The relay attaches these fields to its tracing span and otherwise
/// ignores them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationContext {
    /// Request ID assigned by the invoking environment
    pub request_id: String,

    /// ARN of the function being invoked, when running under Lambda
    pub invoked_function_arn: Option<String>,
}

impl InvocationContext {
    /// Create a context with just a request ID
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            invoked_function_arn: None,
        }
    }

    /// Set the invoked function ARN
    pub fn with_function_arn(mut self, arn: impl Into<String>) -> Self {
        self.invoked_function_arn = Some(arn.into());
        self
    }
}

impl From<&lambda_runtime::Context> for InvocationContext {
    fn from(ctx: &lambda_runtime::Context) -> Self {
        Self::new(ctx.request_id.clone()).with_function_arn(ctx.invoked_function_arn.clone())
    }
}
