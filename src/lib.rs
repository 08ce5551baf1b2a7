//! # Trigger Relay
//!
//! Forwards each inbound event, unchanged, as the input of a new execution
//! of one fixed AWS Step Functions state machine.
//!
//! ## Architecture
//!
//! ```text
//! Lambda runtime -> TriggerRelay -> Orchestrator (Step Functions StartExecution)
//!                        │
//!                        └─ on failure: "Error: <message>" -> Diagnostics (stdout)
//! ```
//!
//! ## Modules
//!
//! - [`event`]: Inbound event and invocation context types
//! - [`relay`]: The relay itself and its forwarding error
//! - [`orchestrator`]: Orchestrator trait and the Step Functions client
//! - [`diagnostics`]: Plain-text failure output
//! - [`config`]: TOML/environment configuration and logging setup

pub mod config;
pub mod diagnostics;
pub mod event;
pub mod orchestrator;
pub mod relay;

// Re-export commonly used types at crate root
pub use event::{Event, InvocationContext};
pub use orchestrator::{ExecutionHandle, Orchestrator, OrchestratorError};
pub use relay::{ForwardingError, TriggerRelay};
