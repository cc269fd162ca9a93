use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, instrument};

use crate::errors::{Error, NodeLabelError};
use crate::labels::LabelCommand;
use crate::retry::{persistent_call, Clock, RetryPolicy};
use crate::utils::command_line;

/// Something that can run an external program to completion.
pub trait CommandRunner {
    /// `Ok(true)` on exit status 0, `Ok(false)` on any other status, `Err` if the
    /// program could not be run at all.
    fn run(&self, program: &Path, args: &[String]) -> Result<bool, Error>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, program: &Path, args: &[String]) -> Result<bool, Error> {
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|err| Error::CommandError(command_line(program, args), err.to_string()))?;

        if !output.status.success() {
            debug!(
                status = %output.status,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "{} exited unsuccessfully",
                program.display()
            );
        }
        Ok(output.status.success())
    }
}

/// kubectl bound to one kubeconfig and one node.
#[derive(Debug)]
pub struct Kubectl<R> {
    binary: PathBuf,
    kubeconfig: PathBuf,
    node: String,
    runner: R,
}

impl<R: CommandRunner> Kubectl<R> {
    pub fn new(
        binary: impl Into<PathBuf>,
        kubeconfig: impl Into<PathBuf>,
        node: impl Into<String>,
        runner: R,
    ) -> Self {
        Kubectl {
            binary: binary.into(),
            kubeconfig: kubeconfig.into(),
            node: node.into(),
            runner,
        }
    }

    pub fn node(&self) -> &str {
        &self.node
    }

    /// Run `command`, retrying under `policy` until it succeeds or the deadline passes.
    #[instrument(skip(self, clock, policy), fields(node = %self.node))]
    pub fn apply<C: Clock + ?Sized>(
        &self,
        command: &LabelCommand,
        clock: &C,
        policy: &RetryPolicy,
    ) -> Result<(), NodeLabelError> {
        let args = command.args(&self.kubeconfig, &self.node);
        let retry_message = command.retry_message();
        debug!("running {:?}", command_line(&self.binary, &args));

        if persistent_call(clock, policy, &retry_message, || self.runner.run(&self.binary, &args)) {
            Ok(())
        } else {
            Err(NodeLabelError {
                command: command.clone(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testing::{ManualClock, RecordingRunner};

    fn kubectl(runner: RecordingRunner) -> Kubectl<RecordingRunner> {
        Kubectl::new("kubectl", "/path/to/kube/config", "the-node", runner)
    }

    #[test]
    fn apply_runs_kubectl_once_on_success() {
        let runner = RecordingRunner::new();
        let clock = ManualClock::new();
        kubectl(runner.clone())
            .apply(&LabelCommand::set("env", "prod"), &clock, &RetryPolicy::default())
            .unwrap();
        assert_eq!(
            runner.calls(),
            [[
                "kubectl",
                "--kubeconfig=/path/to/kube/config",
                "label",
                "node",
                "the-node",
                "env=prod",
                "--overwrite"
            ]]
        );
    }

    #[test]
    fn apply_retries_flaky_command() {
        let runner = RecordingRunner::new();
        runner.fail_times("env=prod", 2);
        let clock = ManualClock::new();
        kubectl(runner.clone())
            .apply(&LabelCommand::set("env", "prod"), &clock, &RetryPolicy::default())
            .unwrap();
        assert_eq!(runner.calls().len(), 3);
        assert_eq!(clock.sleeps(), 2);
    }

    #[test]
    fn apply_fails_after_deadline() {
        let runner = RecordingRunner::new();
        runner.fail_always("juju.io/cloud-");
        let clock = ManualClock::new();
        let err = kubectl(runner.clone())
            .apply(&LabelCommand::remove("juju.io/cloud"), &clock, &RetryPolicy::default())
            .unwrap_err();
        assert_eq!(err.command(), &LabelCommand::remove("juju.io/cloud"));
        assert_eq!(err.to_string(), "Failed to remove label juju.io/cloud. Will retry.");
        assert_eq!(runner.calls().len(), 180);
    }

    #[test]
    fn process_runner_reports_exit_status() {
        let runner = ProcessRunner;
        assert!(runner.run(Path::new("true"), &[]).unwrap());
        assert!(!runner.run(Path::new("false"), &[]).unwrap());
    }

    #[test]
    fn process_runner_reports_missing_binary() {
        let err = ProcessRunner
            .run(Path::new("/nonexistent/kubectl"), &[String::from("version")])
            .unwrap_err();
        match err {
            Error::CommandError(line, _) => assert_eq!(line, ["/nonexistent/kubectl", "version"]),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
