//! Fakes for driving label commands without kubectl or wall-clock delays.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::errors::Error;
use crate::kubectl::CommandRunner;
use crate::retry::Clock;
use crate::utils::command_line;

/// A clock that only moves when slept on.
#[derive(Debug, Clone)]
pub struct ManualClock {
    start: Instant,
    elapsed: Rc<Cell<Duration>>,
    sleeps: Rc<Cell<usize>>,
}

impl ManualClock {
    pub fn new() -> Self {
        ManualClock {
            start: Instant::now(),
            elapsed: Rc::new(Cell::new(Duration::ZERO)),
            sleeps: Rc::new(Cell::new(0)),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed.get()
    }

    pub fn sleeps(&self) -> usize {
        self.sleeps.get()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.start + self.elapsed.get()
    }

    fn sleep(&self, duration: Duration) {
        self.elapsed.set(self.elapsed.get() + duration);
        self.sleeps.set(self.sleeps.get() + 1);
    }
}

/// Records every command line and fails those containing configured arguments.
///
/// Clones share their recording.
#[derive(Debug, Clone, Default)]
pub struct RecordingRunner {
    calls: Rc<RefCell<Vec<Vec<String>>>>,
    // Argument to remaining failures; `None` fails forever.
    failures: Rc<RefCell<HashMap<String, Option<usize>>>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_always(&self, arg: &str) {
        self.failures.borrow_mut().insert(arg.to_string(), None);
    }

    pub fn fail_times(&self, arg: &str, times: usize) {
        self.failures.borrow_mut().insert(arg.to_string(), Some(times));
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.borrow().clone()
    }

    /// The label argument of each call, e.g. `env=prod` or `juju.io/cloud-`.
    pub fn label_args(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| call.get(5).cloned())
            .collect()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, program: &Path, args: &[String]) -> Result<bool, Error> {
        self.calls.borrow_mut().push(command_line(program, args));
        let mut failures = self.failures.borrow_mut();
        for arg in args {
            match failures.get_mut(arg) {
                Some(None) => return Ok(false),
                Some(Some(remaining)) if *remaining > 0 => {
                    *remaining -= 1;
                    return Ok(false);
                }
                _ => {}
            }
        }
        Ok(true)
    }
}
