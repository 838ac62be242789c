//! Recording runner for unit tests.

use std::sync::Mutex;

use crate::error::ProvisionError;

use super::runner::SystemRunner;
use super::subprocess::{CommandSpec, SubprocessResult};

/// Records every command and answers from a list of prefix rules.
///
/// Commands without a matching rule succeed with empty output.
#[derive(Default)]
pub struct FakeRunner {
    rules: Mutex<Vec<(String, SubprocessResult)>>,
    calls: Mutex<Vec<String>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer commands whose command line starts with `prefix`.
    pub fn respond(&self, prefix: &str, result: SubprocessResult) {
        self.rules
            .lock()
            .unwrap()
            .push((prefix.to_string(), result));
    }

    /// Every command line run so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn ran(&self, command_line: &str) -> bool {
        self.calls().iter().any(|c| c == command_line)
    }
}

impl SystemRunner for FakeRunner {
    fn run(&self, spec: &CommandSpec) -> Result<SubprocessResult, ProvisionError> {
        let line = spec.to_string();
        self.calls.lock().unwrap().push(line.clone());
        let rules = self.rules.lock().unwrap();
        Ok(rules
            .iter()
            .rev()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, result)| result.clone())
            .unwrap_or_else(|| SubprocessResult::ok("")))
    }
}
