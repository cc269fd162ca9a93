//! Keep the labels of a Kubernetes node in line with a unit's `labels` setting.
//!
//! Each `reconcile` run compares the configured labels with the ones applied by
//! the previous run, sends the difference to kubectl, and records what was
//! applied. The `juju-application` and `juju.io/cloud` labels are set on every run.

mod cloud;
mod config;
mod errors;
mod kubectl;
mod labels;
mod labels_and_annotations;
mod logging;
mod node;
mod reconciler;
mod retry;
mod state;
mod utils;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing::{error, info};

use crate::cloud::CloudSignal;
use crate::config::Config;
use crate::errors::Error;
use crate::kubectl::{Kubectl, ProcessRunner};
use crate::labels::parse_labels;
use crate::logging::setup_tracing;
use crate::node::resolve_node_name;
use crate::reconciler::{LabelReconciler, ReconcileReport};
use crate::retry::SystemClock;
use crate::state::{FileStore, LabelStore};
use crate::utils::strings::VERSION;

#[derive(Parser)]
#[command(name = "node-labeler")]
#[command(about = "Reconcile Kubernetes node labels against unit configuration")]
#[command(version = VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a YAML configuration file.
    ///
    /// Without one, built-in defaults and command line options are used.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one reconciliation pass
    Reconcile {
        #[command(flatten)]
        overrides: Overrides,
    },

    /// Print the labels recorded as applied
    ShowState {
        /// State file to read.
        #[arg(long)]
        state: Option<PathBuf>,
    },

    /// Parse a labels setting and print the resulting labels
    Parse {
        /// Space separated `key=value` labels.
        labels: String,
    },
}

/// Command line values that take precedence over the configuration file.
#[derive(Args, Debug, Default)]
struct Overrides {
    /// Space separated `key=value` labels.
    #[arg(long)]
    labels: Option<String>,

    /// kubeconfig passed to kubectl.
    #[arg(long)]
    kubeconfig: Option<PathBuf>,

    /// Node to label.
    #[arg(long)]
    node_name: Option<String>,

    /// Value of the juju-application label.
    #[arg(long)]
    application: Option<String>,

    /// A cloud integration that is ready; may be repeated.
    #[arg(long = "ready", value_enum)]
    ready: Vec<CloudSignal>,

    /// Treat no cloud integration as ready, whatever the configuration says.
    #[arg(long, conflicts_with = "ready")]
    no_cloud: bool,

    /// State file recording the applied labels.
    #[arg(long)]
    state: Option<PathBuf>,
}

impl Overrides {
    fn apply(self, config: &mut Config) {
        if self.labels.is_some() {
            config.labels = self.labels;
        }
        if self.kubeconfig.is_some() {
            config.kubeconfig = self.kubeconfig;
        }
        if self.node_name.is_some() {
            config.node_name = self.node_name;
        }
        if self.application.is_some() {
            config.application_name = self.application;
        }
        if self.no_cloud {
            config.ready_endpoints.clear();
        } else if !self.ready.is_empty() {
            config.ready_endpoints = self.ready;
        }
        if self.state.is_some() {
            config.state_path = self.state;
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let _provider = match setup_tracing() {
        Ok(provider) => provider,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };
    match inner_main().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn inner_main() -> Result<(), Error> {
    let cli = Cli::parse();
    let mut config = Config::new(cli.config.as_deref())?;

    match cli.command {
        Commands::Reconcile { overrides } => {
            overrides.apply(&mut config);
            let report = tokio::task::spawn_blocking(move || reconcile_once(&config)).await??;
            if let Some(summary) = skipped_summary(&report) {
                info!("{}", summary);
            }
        }
        Commands::ShowState { state } => {
            if state.is_some() {
                config.state_path = state;
            }
            let labels = FileStore::new(config.state_path_or_default()).load()?;
            println!("{}", serde_json::to_string_pretty(&labels)?);
        }
        Commands::Parse { labels } => {
            let (labels, _skipped) = parse_labels(&labels);
            println!("{}", serde_json::to_string_pretty(&labels)?);
        }
    }
    Ok(())
}

/// Count of malformed options; each one was already logged when parsed.
fn skipped_summary(report: &ReconcileReport) -> Option<String> {
    match report.skipped.len() {
        0 => None,
        count => Some(format!("{count} malformed label options ignored")),
    }
}

/// Resolve identities from `config` and run a single blocking pass.
fn reconcile_once(config: &Config) -> Result<ReconcileReport, Error> {
    let node = resolve_node_name(config.node_name.as_deref())?;
    let application = config.application_name()?;
    let cloud = config.cloud();
    info!(%node, %application, ?cloud, "starting label reconciliation");

    let kubectl = Kubectl::new(
        config.kubectl_or_default(),
        config.kubeconfig_or_default(),
        node,
        ProcessRunner,
    );
    let store = FileStore::new(config.state_path_or_default());
    let policy = config.retry_policy()?;
    let mut reconciler = LabelReconciler::new(kubectl, store, policy, SystemClock);
    reconciler.reconcile(config.labels.as_deref(), &application, cloud)
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn overrides_take_precedence() {
        let mut config: Config = "labels: a=1\nready_endpoints: [aws]\nnode_name: from-file"
            .parse()
            .unwrap();
        let cli = Cli::parse_from([
            "node-labeler",
            "reconcile",
            "--labels",
            "b=2",
            "--ready",
            "gcp",
            "--ready",
            "azure",
        ]);
        let Commands::Reconcile { overrides } = cli.command else {
            panic!("expected reconcile");
        };
        overrides.apply(&mut config);
        assert_eq!(config.labels.as_deref(), Some("b=2"));
        assert_eq!(config.cloud(), CloudSignal::Gcp);
        assert_eq!(config.node_name.as_deref(), Some("from-file"));
    }

    #[test]
    fn no_cloud_clears_configured_endpoints() {
        let mut config: Config = "ready_endpoints: [aws, gcp]".parse().unwrap();
        let cli = Cli::parse_from(["node-labeler", "reconcile", "--no-cloud"]);
        let Commands::Reconcile { overrides } = cli.command else {
            panic!("expected reconcile");
        };
        overrides.apply(&mut config);
        assert!(config.ready_endpoints.is_empty());
        assert_eq!(config.cloud(), CloudSignal::None);
    }

    #[test]
    fn no_cloud_conflicts_with_ready() {
        let result =
            Cli::try_parse_from(["node-labeler", "reconcile", "--no-cloud", "--ready", "aws"]);
        assert!(result.is_err());
    }

    #[test]
    fn skipped_tokens_are_summarized_by_count() {
        let mut report = ReconcileReport::default();
        assert_eq!(skipped_summary(&report), None);

        report.skipped = vec![String::from("oops"), String::from("garbage")];
        let summary = skipped_summary(&report).unwrap();
        assert_eq!(summary, "2 malformed label options ignored");
        assert!(!summary.contains("oops"));
    }

    #[test]
    fn empty_overrides_keep_config() {
        let mut config: Config = "labels: a=1\nready_endpoints: [vsphere]".parse().unwrap();
        Overrides::default().apply(&mut config);
        assert_eq!(config.labels.as_deref(), Some("a=1"));
        assert_eq!(config.cloud(), CloudSignal::VSphere);
    }
}
