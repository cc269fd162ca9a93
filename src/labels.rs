//! Parsing of the `labels` setting and the label commands sent to kubectl.

use std::collections::BTreeMap;
use std::fmt::Formatter;
use std::path::Path;

use tracing::{debug, warn};

/// Label key to label value.
pub type LabelSet = BTreeMap<String, String>;

/// Parse a space-separated list of `key=value` tokens.
///
/// Each token is split at its first `=`. Tokens without one are skipped with a
/// warning and returned alongside the parsed set. Empty tokens from repeated
/// spaces are dropped with a debug line only. A key given twice keeps the last value.
pub fn parse_labels(input: &str) -> (LabelSet, Vec<String>) {
    let mut labels = LabelSet::new();
    let mut skipped = Vec::new();
    for item in input.split(' ') {
        if item.is_empty() {
            debug!("Skipping empty option.");
            continue;
        }
        match item.split_once('=') {
            Some((key, value)) => {
                labels.insert(key.to_string(), value.to_string());
            }
            None => {
                warn!("Skipping malformed option: {}.", item);
                skipped.push(item.to_string());
            }
        }
    }
    (labels, skipped)
}

/// A single mutation of one label on the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelCommand {
    Set { key: String, value: String },
    Remove { key: String },
}

impl LabelCommand {
    pub fn set(key: impl Into<String>, value: impl Into<String>) -> Self {
        LabelCommand::Set {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn remove(key: impl Into<String>) -> Self {
        LabelCommand::Remove { key: key.into() }
    }

    pub fn key(&self) -> &str {
        match self {
            LabelCommand::Set { key, .. } | LabelCommand::Remove { key } => key,
        }
    }

    /// kubectl arguments for this command, without the binary itself.
    pub fn args(&self, kubeconfig: &Path, node: &str) -> Vec<String> {
        let mut args = vec![
            format!("--kubeconfig={}", kubeconfig.display()),
            String::from("label"),
            String::from("node"),
            node.to_string(),
        ];
        match self {
            LabelCommand::Set { key, value } => {
                args.push(format!("{key}={value}"));
                args.push(String::from("--overwrite"));
            }
            LabelCommand::Remove { key } => args.push(format!("{key}-")),
        }
        args
    }

    /// Logged after every failed attempt, and carried by the final error.
    pub fn retry_message(&self) -> String {
        match self {
            LabelCommand::Set { key, value } => {
                format!("Failed to apply label {key}={value}. Will retry.")
            }
            LabelCommand::Remove { key } => format!("Failed to remove label {key}. Will retry."),
        }
    }
}

impl std::fmt::Display for LabelCommand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LabelCommand::Set { key, value } => write!(f, "set {key}={value}"),
            LabelCommand::Remove { key } => write!(f, "remove {key}"),
        }
    }
}
