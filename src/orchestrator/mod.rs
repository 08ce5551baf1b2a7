//! Workflow orchestrator abstraction.
//!
//! The relay only ever needs one capability from the orchestrator: start a
//! new execution of a named workflow with a JSON text input. The
//! [`Orchestrator`] trait captures exactly that, so the relay can be driven
//! by AWS Step Functions in production and by a test double in tests.
//!
//! ## Implementations
//!
//! - [`StepFunctionsOrchestrator`]: `StartExecution` against AWS Step Functions
//!
//! ## Custom Orchestrators
//!
//! ```rust,ignore
//! use trigger_relay::orchestrator::{ExecutionHandle, Orchestrator, OrchestratorError};
//! use async_trait::async_trait;
//!
//! struct Recorder;
//!
//! #[async_trait]
//! impl Orchestrator for Recorder {
//!     async fn start_execution(
//!         &self,
//!         workflow_id: &str,
//!         input: String,
//!     ) -> Result<ExecutionHandle, OrchestratorError> {
//!         Ok(ExecutionHandle::new(format!("{workflow_id}:local")))
//!     }
//! }
//! ```

pub mod step_functions;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

pub use step_functions::StepFunctionsOrchestrator;

/// Errors returned by an orchestrator when starting an execution.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// The orchestrator answered and refused the request
    /// (access denied, unknown workflow, throttling, quota, ...)
    #[error("{}", render_rejection(.code, .message.as_deref()))]
    Rejected {
        code: String,
        message: Option<String>,
    },

    /// The request never produced an answer from the orchestrator
    #[error("{0}")]
    Transport(String),
}

impl OrchestratorError {
    /// Shorthand for a rejection without a message
    pub fn rejected(code: impl Into<String>) -> Self {
        Self::Rejected {
            code: code.into(),
            message: None,
        }
    }
}

fn render_rejection(code: &str, message: Option<&str>) -> String {
    match message {
        Some(message) if !message.is_empty() => format!("{}: {}", code, message),
        _ => code.to_string(),
    }
}

/// Acknowledgement that the orchestrator accepted a start request.
///
/// This says nothing about whether the workflow itself succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionHandle {
    /// Identifier of the started execution (an execution ARN for Step Functions)
    pub execution_id: String,
}

impl ExecutionHandle {
    pub fn new(execution_id: impl Into<String>) -> Self {
        Self {
            execution_id: execution_id.into(),
        }
    }
}

/// The external service that runs workflows.
///
/// Implementations must be `Send + Sync`: one client is built at cold start
/// and shared by every invocation.
#[async_trait]
pub trait Orchestrator: Send + Sync {
    /// Start one execution of `workflow_id` with `input` as its JSON input.
    ///
    /// Returns once the orchestrator has acknowledged the request, not when
    /// the execution finishes.
    async fn start_execution(
        &self,
        workflow_id: &str,
        input: String,
    ) -> Result<ExecutionHandle, OrchestratorError>;
}

#[async_trait]
impl<T: Orchestrator + ?Sized> Orchestrator for Arc<T> {
    async fn start_execution(
        &self,
        workflow_id: &str,
        input: String,
    ) -> Result<ExecutionHandle, OrchestratorError> {
        (**self).start_execution(workflow_id, input).await
    }
}
