//! Trigger Relay - turns one event into one workflow execution.
//!
//! The [`TriggerRelay`] logs the event, renders it as pretty-printed JSON and
//! asks the orchestrator to start the configured workflow with that text as
//! input.
//!
//! # Architecture
//!
//! ```text
//! Event {"id": 1}
//!     │
//!     ▼
//! ┌─────────────────────────────────────┐
//! │          TRIGGER RELAY              │
//! │                                     │
//! │  1. info!: Received event           │
//! │  2. render_input -> "{\n    ..."    │
//! │  3. start_execution(workflow, input)│
//! └─────────────────────────────────────┘
//!     │                      │
//!     ▼ Ok                   ▼ Err
//!   (nothing)          "Error: <message>" -> Diagnostics
//! ```
//!
//! # Failure posture
//!
//! [`TriggerRelay::handle`] never fails. Anything that goes wrong while
//! forwarding is written to the [`Diagnostics`] sink as `Error: <message>`
//! and dropped, so the invoking environment always sees a successful
//! invocation. Callers that need the outcome use [`TriggerRelay::forward`].
//!
//! # Example
//!
//! ```rust,ignore
//! use trigger_relay::{Event, InvocationContext, TriggerRelay};
//! use trigger_relay::orchestrator::StepFunctionsOrchestrator;
//! use serde_json::json;
//!
//! let relay = TriggerRelay::new(orchestrator, "arn:aws:states:us-east-1:123456789012:stateMachine:Training");
//! relay.handle(&Event::new(json!({"id": 1})), &InvocationContext::new("req-1")).await;
//! ```

use crate::diagnostics::{Diagnostics, Stdout};
use crate::event::InvocationContext;
use crate::orchestrator::{ExecutionHandle, Orchestrator, OrchestratorError};
use serde::ser::Error as _;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, info_span, Instrument};

/// Indentation used for the execution input
const INPUT_INDENT: &[u8] = b"    ";

/// Anything that stopped an event from reaching the orchestrator.
#[derive(Error, Debug)]
pub enum ForwardingError {
    /// The event could not be rendered as JSON
    #[error("failed to serialize event: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The orchestrator refused or never answered the start request
    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),
}

/// Render a value as JSON with 4-space indentation.
///
/// Empty objects and arrays stay on one line (`{}`, `[]`).
pub fn render_input<T>(value: &T) -> Result<String, serde_json::Error>
where
    T: Serialize + ?Sized,
{
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(INPUT_INDENT);
    let mut serializer = Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    String::from_utf8(buf).map_err(serde_json::Error::custom)
}

/// Forwards events to a single, fixed workflow.
///
/// The orchestrator client, workflow identifier and diagnostic sink are
/// fixed at construction. The relay keeps no per-invocation state, so one
/// instance can serve concurrent invocations behind an `Arc`.
pub struct TriggerRelay<O, D = Stdout> {
    orchestrator: O,
    workflow_id: String,
    diagnostics: D,
}

impl<O: Orchestrator> TriggerRelay<O, Stdout> {
    /// Create a relay that reports failures on stdout.
    pub fn new(orchestrator: O, workflow_id: impl Into<String>) -> Self {
        Self {
            orchestrator,
            workflow_id: workflow_id.into(),
            diagnostics: Stdout,
        }
    }
}

impl<O: Orchestrator, D: Diagnostics> TriggerRelay<O, D> {
    /// Replace the diagnostic sink
    pub fn with_diagnostics<D2: Diagnostics>(self, diagnostics: D2) -> TriggerRelay<O, D2> {
        TriggerRelay {
            orchestrator: self.orchestrator,
            workflow_id: self.workflow_id,
            diagnostics,
        }
    }

    /// The workflow every event is forwarded to
    pub fn workflow_id(&self) -> &str {
        &self.workflow_id
    }

    /// Handle one inbound event.
    ///
    /// Logs the event, then forwards it. Always returns normally: a failed
    /// forward produces one `Error: <message>` diagnostic line and nothing
    /// else.
    pub async fn handle<E>(&self, event: &E, context: &InvocationContext)
    where
        E: Serialize + fmt::Display + Sync + ?Sized,
    {
        let span = info_span!(
            "invocation",
            request_id = %context.request_id,
            function_arn = context.invoked_function_arn.as_deref(),
        );

        async {
            info!(event = %event, "Received event");

            // Deliberately dropped: failures are reported, never propagated.
            if let Err(e) = self.forward(event).await {
                self.diagnostics.report(&format!("Error: {}", e));
            }
        }
        .instrument(span)
        .await
    }

    /// Render the event and start one execution of the configured workflow.
    ///
    /// No retries: every call issues at most one start request, and repeated
    /// calls with the same event start independent executions.
    pub async fn forward<E>(&self, event: &E) -> Result<ExecutionHandle, ForwardingError>
    where
        E: Serialize + Sync + ?Sized,
    {
        let input = render_input(event)?;

        let handle = self
            .orchestrator
            .start_execution(&self.workflow_id, input)
            .await?;

        debug!(
            workflow_id = %self.workflow_id,
            execution_id = %handle.execution_id,
            "Workflow execution started"
        );

        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tracing::{Level, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    const WORKFLOW: &str = "arn:aws:states:us-east-1:123456789012:stateMachine:Training";

    /// Records every start request; optionally rejects all of them.
    #[derive(Default)]
    struct RecordingOrchestrator {
        calls: Mutex<Vec<(String, String)>>,
        reject_with: Option<&'static str>,
        info_logs_seen: Mutex<Vec<usize>>,
        info_counter: Option<Arc<AtomicUsize>>,
    }

    impl RecordingOrchestrator {
        fn rejecting(code: &'static str) -> Self {
            Self {
                reject_with: Some(code),
                ..Default::default()
            }
        }

        fn watching(counter: Arc<AtomicUsize>) -> Self {
            Self {
                info_counter: Some(counter),
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Orchestrator for RecordingOrchestrator {
        async fn start_execution(
            &self,
            workflow_id: &str,
            input: String,
        ) -> Result<ExecutionHandle, OrchestratorError> {
            if let Some(counter) = &self.info_counter {
                self.info_logs_seen
                    .lock()
                    .unwrap()
                    .push(counter.load(Ordering::SeqCst));
            }

            let mut calls = self.calls.lock().unwrap();
            calls.push((workflow_id.to_string(), input));

            match self.reject_with {
                Some(code) => Err(OrchestratorError::rejected(code)),
                None => Ok(ExecutionHandle::new(format!("{}:exec-{}", workflow_id, calls.len()))),
            }
        }
    }

    #[derive(Default)]
    struct CapturedDiagnostics {
        lines: Mutex<Vec<String>>,
    }

    impl CapturedDiagnostics {
        fn lines(&self) -> Vec<String> {
            self.lines.lock().unwrap().clone()
        }
    }

    impl Diagnostics for CapturedDiagnostics {
        fn report(&self, line: &str) {
            self.lines.lock().unwrap().push(line.to_string());
        }
    }

    /// Counts tracing events by level.
    #[derive(Clone, Default)]
    struct CountingLayer {
        info: Arc<AtomicUsize>,
        total: Arc<AtomicUsize>,
    }

    impl<S: Subscriber> Layer<S> for CountingLayer {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            self.total.fetch_add(1, Ordering::SeqCst);
            if *event.metadata().level() == Level::INFO {
                self.info.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    /// Serializes to an error, like a map with non-string keys would.
    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("key must be a string"))
        }
    }

    impl fmt::Display for Unserializable {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("<unserializable>")
        }
    }

    fn relay_with(
        orchestrator: Arc<RecordingOrchestrator>,
    ) -> (
        TriggerRelay<Arc<RecordingOrchestrator>, Arc<CapturedDiagnostics>>,
        Arc<CapturedDiagnostics>,
    ) {
        let diagnostics = Arc::new(CapturedDiagnostics::default());
        let relay = TriggerRelay::new(orchestrator, WORKFLOW).with_diagnostics(diagnostics.clone());
        (relay, diagnostics)
    }

    fn ctx() -> InvocationContext {
        InvocationContext::new("req-1")
    }

    #[test]
    fn test_render_input_uses_four_space_indent() {
        let rendered = render_input(&json!({"id": 1})).unwrap();
        assert_eq!(rendered, "{\n    \"id\": 1\n}");
    }

    #[test]
    fn test_render_input_nested() {
        let rendered = render_input(&json!({"detail": {"tags": ["a"]}})).unwrap();
        assert_eq!(
            rendered,
            "{\n    \"detail\": {\n        \"tags\": [\n            \"a\"\n        ]\n    }\n}"
        );
    }

    #[test]
    fn test_render_input_empty_containers() {
        assert_eq!(render_input(&json!({})).unwrap(), "{}");
        assert_eq!(render_input(&json!([])).unwrap(), "[]");
    }

    #[test]
    fn test_render_input_is_lossless() {
        let original = json!({
            "id": 42,
            "ratio": 0.5,
            "name": "batch \"7\" – ünïcode",
            "flags": [true, false, null],
            "nested": {"empty": {}, "list": []}
        });

        let rendered = render_input(&original).unwrap();
        let parsed: Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_render_input_keeps_large_integers_exact() {
        let event: Event =
            serde_json::from_str(r#"{"id": 123456789012345678901234567890}"#).unwrap();

        let rendered = render_input(&event).unwrap();
        assert_eq!(rendered, "{\n    \"id\": 123456789012345678901234567890\n}");
    }

    #[test]
    fn test_render_input_keeps_key_order() {
        let event: Event = serde_json::from_str(r#"{"zeta": 1, "alpha": 2, "mid": 3}"#).unwrap();

        let rendered = render_input(&event).unwrap();
        assert_eq!(
            rendered,
            "{\n    \"zeta\": 1,\n    \"alpha\": 2,\n    \"mid\": 3\n}"
        );
    }

    #[test]
    fn test_render_input_reports_serialization_failure() {
        assert!(render_input(&Unserializable).is_err());
    }

    #[tokio::test]
    async fn test_handle_forwards_pretty_printed_event() {
        let orchestrator = Arc::new(RecordingOrchestrator::default());
        let (relay, diagnostics) = relay_with(orchestrator.clone());

        relay.handle(&Event::new(json!({"id": 1})), &ctx()).await;

        assert_eq!(
            orchestrator.calls(),
            vec![(WORKFLOW.to_string(), "{\n    \"id\": 1\n}".to_string())]
        );
        assert!(diagnostics.lines().is_empty());
    }

    #[tokio::test]
    async fn test_handle_empty_event() {
        let orchestrator = Arc::new(RecordingOrchestrator::default());
        let (relay, diagnostics) = relay_with(orchestrator.clone());

        relay.handle(&Event::new(json!({})), &ctx()).await;

        assert_eq!(
            orchestrator.calls(),
            vec![(WORKFLOW.to_string(), "{}".to_string())]
        );
        assert!(diagnostics.lines().is_empty());
    }

    #[tokio::test]
    async fn test_handle_swallows_rejection() {
        let orchestrator = Arc::new(RecordingOrchestrator::rejecting("AccessDenied"));
        let (relay, diagnostics) = relay_with(orchestrator.clone());

        relay.handle(&Event::new(json!({"id": 1})), &ctx()).await;

        assert_eq!(orchestrator.calls().len(), 1);
        assert_eq!(diagnostics.lines(), vec!["Error: AccessDenied".to_string()]);
    }

    #[tokio::test]
    async fn test_handle_swallows_serialization_failure() {
        let orchestrator = Arc::new(RecordingOrchestrator::default());
        let (relay, diagnostics) = relay_with(orchestrator.clone());

        relay.handle(&Unserializable, &ctx()).await;

        assert!(orchestrator.calls().is_empty());
        let lines = diagnostics.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("Error: failed to serialize event"));
        assert!(lines[0].contains("key must be a string"));
    }

    #[tokio::test]
    async fn test_handle_is_not_idempotent() {
        let orchestrator = Arc::new(RecordingOrchestrator::default());
        let (relay, _) = relay_with(orchestrator.clone());
        let event = Event::new(json!({"id": 7}));

        relay.handle(&event, &ctx()).await;
        relay.handle(&event, &ctx()).await;

        let calls = orchestrator.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], calls[1]);
    }

    #[tokio::test]
    async fn test_forward_returns_execution_handle() {
        let orchestrator = Arc::new(RecordingOrchestrator::default());
        let (relay, _) = relay_with(orchestrator);

        let handle = relay.forward(&Event::new(json!({"id": 1}))).await.unwrap();
        assert_eq!(handle.execution_id, format!("{}:exec-1", WORKFLOW));
    }

    #[tokio::test]
    async fn test_forward_surfaces_rejection() {
        let orchestrator = Arc::new(RecordingOrchestrator::rejecting("ExecutionLimitExceeded"));
        let (relay, _) = relay_with(orchestrator);

        let err = relay.forward(&Event::new(json!({}))).await.unwrap_err();
        assert!(matches!(err, ForwardingError::Orchestrator(_)));
        assert_eq!(err.to_string(), "ExecutionLimitExceeded");
    }

    #[tokio::test]
    async fn test_event_logged_once_before_start_request() {
        let layer = CountingLayer::default();
        let subscriber = tracing_subscriber::registry().with(layer.clone());
        let _guard = tracing::subscriber::set_default(subscriber);

        let orchestrator = Arc::new(RecordingOrchestrator::watching(layer.info.clone()));
        let (relay, diagnostics) = relay_with(orchestrator.clone());

        relay.handle(&Event::new(json!({"id": 1})), &ctx()).await;

        assert_eq!(*orchestrator.info_logs_seen.lock().unwrap(), vec![1]);
        assert_eq!(layer.info.load(Ordering::SeqCst), 1);
        assert!(diagnostics.lines().is_empty());
    }

    #[tokio::test]
    async fn test_failure_is_not_logged_through_tracing() {
        let layer = CountingLayer::default();
        let subscriber = tracing_subscriber::registry().with(layer.clone());
        let _guard = tracing::subscriber::set_default(subscriber);

        let orchestrator = Arc::new(RecordingOrchestrator::rejecting("AccessDenied"));
        let (relay, diagnostics) = relay_with(orchestrator);

        relay.handle(&Event::new(json!({"id": 1})), &ctx()).await;

        // Only the "Received event" line; the failure goes to diagnostics.
        assert_eq!(layer.total.load(Ordering::SeqCst), 1);
        assert_eq!(diagnostics.lines().len(), 1);
    }

    #[test]
    fn test_workflow_id_is_fixed_at_construction() {
        let relay = TriggerRelay::new(Arc::new(RecordingOrchestrator::default()), WORKFLOW);
        assert_eq!(relay.workflow_id(), WORKFLOW);
    }

    #[test]
    fn test_new_reports_to_stdout() {
        let relay: TriggerRelay<_, Stdout> =
            TriggerRelay::new(Arc::new(RecordingOrchestrator::default()), WORKFLOW);
        assert_eq!(
            std::any::type_name_of_val(&relay.diagnostics),
            std::any::type_name::<Stdout>()
        );
    }
}
