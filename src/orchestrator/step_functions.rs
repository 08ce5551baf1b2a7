//! Step Functions orchestrator - starts state machine executions.
//!
//! The [`StepFunctionsOrchestrator`] wraps an `aws-sdk-sfn` client and
//! issues one `StartExecution` call per request.
//!
//! # Example
//!
//! ```rust,ignore
//! use trigger_relay::config::AwsConfig;
//! use trigger_relay::orchestrator::StepFunctionsOrchestrator;
//!
//! let orchestrator = StepFunctionsOrchestrator::from_config(&AwsConfig::default()).await;
//! ```

use super::{ExecutionHandle, Orchestrator, OrchestratorError};
use crate::config::AwsConfig;
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_sfn::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_sfn::operation::start_execution::StartExecutionError;
use aws_sdk_sfn::Client;
use tracing::debug;

/// An orchestrator backed by AWS Step Functions.
///
/// The SDK client is cheap to clone and pools its connections, so one
/// instance is built at cold start and shared by all invocations.
#[derive(Debug, Clone)]
pub struct StepFunctionsOrchestrator {
    client: Client,
}

impl StepFunctionsOrchestrator {
    /// Wrap an existing Step Functions client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the default AWS provider chain, applying the
    /// region and endpoint overrides from configuration.
    pub async fn from_config(aws: &AwsConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        if let Some(region) = &aws.region {
            loader = loader.region(Region::new(region.clone()));
        }

        if let Some(endpoint_url) = &aws.endpoint_url {
            debug!(endpoint_url = %endpoint_url, "Using custom Step Functions endpoint");
            loader = loader.endpoint_url(endpoint_url);
        }

        let shared = loader.load().await;
        Self::new(Client::new(&shared))
    }
}

#[async_trait]
impl Orchestrator for StepFunctionsOrchestrator {
    async fn start_execution(
        &self,
        workflow_id: &str,
        input: String,
    ) -> Result<ExecutionHandle, OrchestratorError> {
        let output = self
            .client
            .start_execution()
            .state_machine_arn(workflow_id)
            .input(input)
            .send()
            .await
            .map_err(classify)?;

        Ok(ExecutionHandle::new(output.execution_arn()))
    }
}

/// Split SDK failures into service rejections and everything else.
fn classify(err: SdkError<StartExecutionError>) -> OrchestratorError {
    if let Some(rejection) = err.as_service_error().and_then(rejection) {
        return rejection;
    }
    OrchestratorError::Transport(DisplayErrorContext(&err).to_string())
}

fn rejection(err: &StartExecutionError) -> Option<OrchestratorError> {
    let code = err.code()?;
    Some(OrchestratorError::Rejected {
        code: code.to_string(),
        message: err.message().map(str::to_string),
    })
}
