//! Configuration module for the relay.
//!
//! Loads configuration from a TOML file with environment variable
//! substitution. Everything has a default, so a missing file is fine.
//!
//! # Example
//!
//! ```toml
//! [workflow]
//! state_machine_arn = "${STATE_MACHINE_ARN}"
//!
//! [aws]
//! region = "us-east-1"
//!
//! [logging]
//! filter = "info"
//! ansi = false
//! ```

use regex::Regex;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Environment variable naming the config file
pub const CONFIG_PATH_VAR: &str = "RELAY_CONFIG";

/// Config file used when `RELAY_CONFIG` is unset
pub const DEFAULT_CONFIG_PATH: &str = "config/relay.toml";

/// Environment variable that overrides `workflow.state_machine_arn`
pub const STATE_MACHINE_ARN_VAR: &str = "STATE_MACHINE_ARN";

/// State machine started when nothing else is configured
pub const DEFAULT_STATE_MACHINE_ARN: &str =
    "arn:aws:states:us-east-1:779527000053:stateMachine:TrainingStateMachine-fL4fPKOcTkI4";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Root configuration structure
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct RelayConfig {
    #[serde(default)]
    pub workflow: WorkflowConfig,

    #[serde(default)]
    pub aws: AwsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// The workflow every event is forwarded to
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct WorkflowConfig {
    #[serde(default = "default_state_machine_arn")]
    pub state_machine_arn: String,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            state_machine_arn: default_state_machine_arn(),
        }
    }
}

fn default_state_machine_arn() -> String {
    DEFAULT_STATE_MACHINE_ARN.to_string()
}

/// AWS client overrides. Unset fields fall back to the SDK's provider chain.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct AwsConfig {
    #[serde(default)]
    pub region: Option<String>,

    /// Alternative endpoint, e.g. Step Functions Local
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// `EnvFilter` directives; `RUST_LOG` wins when set
    #[serde(default = "default_filter")]
    pub filter: String,

    #[serde(default)]
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            ansi: false,
        }
    }
}

fn default_filter() -> String {
    "info".to_string()
}

impl LoggingConfig {
    /// Install the global `tracing` subscriber.
    ///
    /// Safe to call more than once; later calls are no-ops.
    pub fn init(&self) {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.filter))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(self.ansi)
            .with_target(false)
            .try_init();
    }
}

impl RelayConfig {
    /// Load configuration from the default path or `RELAY_CONFIG`.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let mut config = if path.exists() {
            info!(path = %path.display(), "Loading configuration");
            let content = fs::read_to_string(path)?;
            Self::from_toml(&content)?
        } else {
            info!(
                path = %path.display(),
                "Config file not found, using defaults"
            );
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;

        info!(
            state_machine_arn = %config.workflow.state_machine_arn,
            region = ?config.aws.region,
            endpoint_url = ?config.aws.endpoint_url,
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Parse TOML text after substituting `${VAR}` placeholders.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let content = substitute_env_vars(content);

        debug!("Parsing TOML configuration");
        Ok(toml::from_str(&content)?)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(arn) = env::var(STATE_MACHINE_ARN_VAR) {
            if !arn.is_empty() {
                debug!(var = STATE_MACHINE_ARN_VAR, "State machine ARN overridden from environment");
                self.workflow.state_machine_arn = arn;
            }
        }
    }

    /// Validate the configuration
    fn validate(&self) -> Result<(), ConfigError> {
        let arn = &self.workflow.state_machine_arn;

        if arn.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "workflow.state_machine_arn is empty".to_string(),
            ));
        }

        if arn.contains("${") {
            return Err(ConfigError::ValidationError(format!(
                "workflow.state_machine_arn contains an unsubstituted environment variable: {}",
                arn
            )));
        }

        // Malformed ARNs are left for Step Functions to reject at call time.
        if !looks_like_state_machine_arn(arn) {
            warn!(
                state_machine_arn = %arn,
                "State machine ARN does not look like arn:<partition>:states:<region>:<account>:stateMachine:<name>"
            );
        }

        if let Some(url) = &self.aws.endpoint_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::ValidationError(format!(
                    "aws.endpoint_url must start with http:// or https://, got '{}'",
                    url
                )));
            }
        }

        if let Some(region) = &self.aws.region {
            if region.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "aws.region is empty".to_string(),
                ));
            }
        }

        if let Err(e) = EnvFilter::try_new(&self.logging.filter) {
            return Err(ConfigError::ValidationError(format!(
                "logging.filter '{}' is invalid: {}",
                self.logging.filter, e
            )));
        }

        Ok(())
    }
}

fn looks_like_state_machine_arn(arn: &str) -> bool {
    let parts: Vec<&str> = arn.splitn(7, ':').collect();
    parts.len() == 7
        && parts[0] == "arn"
        && parts[2] == "states"
        && parts[5] == "stateMachine"
        && !parts[6].is_empty()
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern is valid")
    })
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(content: &str) -> String {
    placeholder_pattern()
        .replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            match env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    debug!(var = %var_name, "Environment variable not set, keeping placeholder");
                    caps[0].to_string()
                }
            }
        })
        .to_string()
}
