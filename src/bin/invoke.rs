//! Relay Invoke - run the relay once outside Lambda.
//!
//! Reads a single JSON event from the file given as the first argument, or
//! from stdin when no argument (or `-`) is given, and handles it exactly as
//! the Lambda entry point would.
//!
//! ```text
//! relay-invoke event.json
//! echo '{"id": 1}' | relay-invoke
//! ```
//!
//! A `.env` file in the working directory is loaded first.

use std::env;
use tokio::io::AsyncReadExt;
use tracing::info;

use trigger_relay::config::RelayConfig;
use trigger_relay::orchestrator::StepFunctionsOrchestrator;
use trigger_relay::{Event, InvocationContext, TriggerRelay};

async fn read_event(source: Option<&str>) -> Result<Event, Box<dyn std::error::Error>> {
    let raw = match source {
        Some(path) if path != "-" => tokio::fs::read_to_string(path).await?,
        _ => {
            let mut buf = String::new();
            tokio::io::stdin().read_to_string(&mut buf).await?;
            buf
        }
    };

    Ok(serde_json::from_str(&raw)?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let config = RelayConfig::load()?;
    config.logging.init();

    let source = env::args().nth(1);
    let event = read_event(source.as_deref()).await?;

    let orchestrator = StepFunctionsOrchestrator::from_config(&config.aws).await;
    let relay = TriggerRelay::new(orchestrator, config.workflow.state_machine_arn.clone());

    let context = InvocationContext::new(format!("local-{}", std::process::id()));
    info!(
        request_id = %context.request_id,
        state_machine_arn = %relay.workflow_id(),
        "Invoking relay locally"
    );

    relay.handle(&event, &context).await;
    Ok(())
}
