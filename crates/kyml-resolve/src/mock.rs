use crate::command::{CommandOutput, CommandRunner};
use crate::ResolveError;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Scripted [`CommandRunner`] for tests.
///
/// Responses are replayed in order; every invocation is recorded as a single
/// `"program arg1 arg2"` line.
#[derive(Default)]
pub struct MockRunner {
    responses: Mutex<VecDeque<Result<CommandOutput, String>>>,
    calls: Mutex<Vec<String>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a command that runs and produces `output`.
    #[must_use]
    pub fn respond(self, output: CommandOutput) -> Self {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push_back(Ok(output));
        }
        self
    }

    /// Queue a command that cannot be started.
    #[must_use]
    pub fn fail_to_spawn(self, message: &str) -> Self {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push_back(Err(message.to_owned()));
        }
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, ResolveError> {
        let line = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(line.clone());
        }

        let next = self
            .responses
            .lock()
            .ok()
            .and_then(|mut responses| responses.pop_front());
        match next {
            Some(Ok(output)) => Ok(output),
            Some(Err(message)) => Err(ResolveError::Spawn {
                program: program.to_owned(),
                message,
            }),
            None => Err(ResolveError::Unscripted(line)),
        }
    }
}
