use tracing::{debug, error, info, instrument};

use crate::cloud::CloudSignal;
use crate::errors::{Error, NodeLabelError};
use crate::kubectl::{CommandRunner, Kubectl};
use crate::labels::{parse_labels, LabelCommand, LabelSet};
use crate::labels_and_annotations::{APPLICATION_LABEL, CLOUD_LABEL, IMPLICIT_LABELS};
use crate::retry::{Clock, RetryPolicy};
use crate::state::LabelStore;

/// What a reconciliation pass did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Commands that succeeded, in the order they ran.
    pub applied: Vec<LabelCommand>,
    /// Malformed tokens from the labels setting.
    pub skipped: Vec<String>,
}

/// Brings the labels of one node in line with the configured set.
pub struct LabelReconciler<R, S, C> {
    kubectl: Kubectl<R>,
    store: S,
    policy: RetryPolicy,
    clock: C,
}

impl<R, S, C> LabelReconciler<R, S, C>
where
    R: CommandRunner,
    S: LabelStore,
    C: Clock,
{
    pub fn new(kubectl: Kubectl<R>, store: S, policy: RetryPolicy, clock: C) -> Self {
        LabelReconciler {
            kubectl,
            store,
            policy,
            clock,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run one pass.
    ///
    /// `labels` is the raw setting; `None` means no labels are configured. A
    /// command that keeps failing past the retry deadline stops the pass; labels
    /// stored before that point stay stored.
    #[instrument(skip(self, labels), fields(node = %self.kubectl.node()))]
    pub fn reconcile(
        &mut self,
        labels: Option<&str>,
        application: &str,
        cloud: CloudSignal,
    ) -> Result<ReconcileReport, Error> {
        let (desired, skipped) = parse_labels(labels.unwrap_or_default());
        let mut applied = self.store.load()?;
        let mut report = ReconcileReport {
            skipped,
            ..Default::default()
        };

        match self.apply_delta(&desired, &mut applied, application, cloud, &mut report) {
            Ok(()) => {
                info!(
                    "labels reconciled: {} commands, {} labels stored",
                    report.applied.len(),
                    applied.len()
                );
                Ok(report)
            }
            Err(err) => {
                error!("{}", err);
                Err(err)
            }
        }
    }

    fn apply_delta(
        &mut self,
        desired: &LabelSet,
        applied: &mut LabelSet,
        application: &str,
        cloud: CloudSignal,
        report: &mut ReconcileReport,
    ) -> Result<(), Error> {
        // Labels removed from the configuration
        let stale: Vec<String> = applied
            .keys()
            .filter(|key| !desired.contains_key(*key) && !IMPLICIT_LABELS.contains(&key.as_str()))
            .cloned()
            .collect();
        for key in stale {
            self.remove_label(&key, report)?;
            applied.remove(&key);
            self.store.save(applied)?;
        }

        // New or changed labels
        for (key, value) in desired {
            if applied.get(key) == Some(value) {
                debug!("label {} already set to {}", key, value);
                continue;
            }
            self.set_label(key, value, report)?;
            applied.insert(key.clone(), value.clone());
            self.store.save(applied)?;
        }

        self.set_label(APPLICATION_LABEL, application, report)?;
        applied.insert(String::from(APPLICATION_LABEL), String::from(application));
        self.store.save(applied)?;

        match cloud.label_value() {
            Some(value) => {
                self.set_label(CLOUD_LABEL, value, report)?;
                applied.insert(String::from(CLOUD_LABEL), String::from(value));
            }
            None => {
                self.remove_label(CLOUD_LABEL, report)?;
                applied.remove(CLOUD_LABEL);
            }
        }
        self.store.save(applied)?;
        Ok(())
    }

    fn set_label(
        &self,
        key: &str,
        value: &str,
        report: &mut ReconcileReport,
    ) -> Result<(), NodeLabelError> {
        self.run(LabelCommand::set(key, value), report)
    }

    fn remove_label(
        &self,
        key: &str,
        report: &mut ReconcileReport,
    ) -> Result<(), NodeLabelError> {
        self.run(LabelCommand::remove(key), report)
    }

    fn run(
        &self,
        command: LabelCommand,
        report: &mut ReconcileReport,
    ) -> Result<(), NodeLabelError> {
        self.kubectl.apply(&command, &self.clock, &self.policy)?;
        report.applied.push(command);
        Ok(())
    }
}
