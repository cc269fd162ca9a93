use std::fmt::Formatter;

use crate::labels::LabelCommand;

/// A label command that kept failing until the retry deadline passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeLabelError {
    pub(crate) command: LabelCommand,
}

impl NodeLabelError {
    pub fn command(&self) -> &LabelCommand {
        &self.command
    }
}

impl std::error::Error for NodeLabelError {}

impl std::fmt::Display for NodeLabelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.command.retry_message())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    // Labeling
    #[error("{0}")]
    NodeLabel(#[from] NodeLabelError),
    #[error("Command {0:?} failed: {1}")]
    CommandError(Vec<String>, String),
    #[error("Unable to determine node name: {0}")]
    NodeNameUnavailable(String),
    #[error("Unable to determine application name")]
    ApplicationNameUnavailable,

    // Configuration and state
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("IO error {0}")]
    Io(#[from] std::io::Error),

    // Misc libs
    #[error("JSON error {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML error {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Error parsing value: {0}")]
    ParseHumanize(#[from] humanize_rs::ParseError),

    // Tracing
    #[error("Failed to install tracing subscriber: {0}")]
    TracingSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
    #[error("Failed to set up trace export: {0}")]
    TraceExport(#[from] opentelemetry::trace::TraceError),

    // Custom/generic
    #[error("Task ended unexpectedly: {0}")]
    UnexpectedExit(#[from] tokio::task::JoinError),
}
