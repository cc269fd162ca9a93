//! Unit configuration, as handed over by the charm.

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use tracing::debug;

use crate::cloud::CloudSignal;
use crate::errors::Error;
use crate::retry::RetryPolicy;

static DEFAULT_KUBECONFIG: &str = "/root/.kube/config";
static DEFAULT_KUBECTL: &str = "kubectl";
static DEFAULT_STATE_PATH: &str = ".unit-state.json";
static DEFAULT_RETRY_DEADLINE: &str = "180s";
static DEFAULT_RETRY_INTERVAL: &str = "1s";

/// Environment variable holding the `application/unit-number` name of this unit.
static UNIT_NAME_VAR: &str = "JUJU_UNIT_NAME";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Space separated `key=value` labels for this node.
    pub labels: Option<String>,

    /// kubeconfig passed to kubectl.
    pub kubeconfig: Option<PathBuf>,
    /// kubectl binary.
    pub kubectl: Option<PathBuf>,

    /// Node to label; defaults to the host name.
    pub node_name: Option<String>,
    /// Value of the application label; defaults to the application of `$JUJU_UNIT_NAME`.
    pub application_name: Option<String>,

    /// Where the applied labels are remembered between passes.
    pub state_path: Option<PathBuf>,

    /// Cloud integrations that are ready.
    #[serde(default)]
    pub ready_endpoints: Vec<CloudSignal>,

    /// How long to keep retrying one label command, e.g. `3m`.
    pub retry_deadline: Option<String>,
    /// Pause between attempts, e.g. `1s`.
    pub retry_interval: Option<String>,
}

impl Config {
    /// Load from a file if one is given, otherwise use builtin defaults.
    pub fn new(config_path: Option<&Path>) -> Result<Self, Error> {
        match config_path {
            Some(config_path) => Self::from_file(config_path),
            None => {
                debug!("No config file given, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_file(config_path: &Path) -> Result<Self, Error> {
        debug!(?config_path, "Loading config from file");
        let config_str = std::fs::read_to_string(config_path).map_err(|err| {
            Error::Config(format!(
                "Failed to load config file {}: {err}",
                config_path.display()
            ))
        })?;
        config_str.parse().map_err(|err| {
            Error::Config(format!(
                "Failed to parse config file {}: {err}",
                config_path.display()
            ))
        })
    }

    pub fn kubeconfig_or_default(&self) -> &Path {
        self.kubeconfig
            .as_deref()
            .unwrap_or(Path::new(DEFAULT_KUBECONFIG))
    }

    pub fn kubectl_or_default(&self) -> &Path {
        self.kubectl.as_deref().unwrap_or(Path::new(DEFAULT_KUBECTL))
    }

    pub fn state_path_or_default(&self) -> &Path {
        self.state_path
            .as_deref()
            .unwrap_or(Path::new(DEFAULT_STATE_PATH))
    }

    pub fn cloud(&self) -> CloudSignal {
        CloudSignal::from_ready(&self.ready_endpoints)
    }

    pub fn retry_policy(&self) -> Result<RetryPolicy, Error> {
        RetryPolicy::parse(
            self.retry_deadline.as_deref().unwrap_or(DEFAULT_RETRY_DEADLINE),
            self.retry_interval.as_deref().unwrap_or(DEFAULT_RETRY_INTERVAL),
        )
    }

    pub fn application_name(&self) -> Result<String, Error> {
        application_name_from(
            self.application_name.as_deref(),
            env::var(UNIT_NAME_VAR).ok().as_deref(),
        )
    }
}

impl FromStr for Config {
    type Err = serde_yaml::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(s)
    }
}

/// `explicit` if set, else the part of `unit_name` before the `/`.
fn application_name_from(explicit: Option<&str>, unit_name: Option<&str>) -> Result<String, Error> {
    explicit
        .or_else(|| unit_name.and_then(|unit| unit.split('/').next()))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .ok_or(Error::ApplicationNameUnavailable)
}
