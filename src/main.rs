//! Lambda entry point.
//!
//! Builds the Step Functions client and the relay once per cold start, then
//! hands every invocation to [`TriggerRelay::handle`].
//!
//! ## Configuration
//!
//! - `RELAY_CONFIG`: path to the TOML config (default: `config/relay.toml`)
//! - `STATE_MACHINE_ARN`: overrides `workflow.state_machine_arn`
//! - `RUST_LOG`: overrides `logging.filter`

use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use std::sync::Arc;
use tracing::info;

use trigger_relay::config::RelayConfig;
use trigger_relay::orchestrator::StepFunctionsOrchestrator;
use trigger_relay::{Event, InvocationContext, TriggerRelay};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = RelayConfig::load()?;
    config.logging.init();

    let orchestrator = StepFunctionsOrchestrator::from_config(&config.aws).await;
    let relay = Arc::new(TriggerRelay::new(
        orchestrator,
        config.workflow.state_machine_arn.clone(),
    ));

    info!(
        state_machine_arn = %relay.workflow_id(),
        region = ?config.aws.region,
        "Trigger relay ready"
    );

    run(service_fn(move |event: LambdaEvent<Event>| {
        let relay = Arc::clone(&relay);
        async move {
            let context = InvocationContext::from(&event.context);
            relay.handle(&event.payload, &context).await;
            Ok::<(), Error>(())
        }
    }))
    .await
}
