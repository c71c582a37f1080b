//! Shared test utilities for dockbot integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::FixedOffset;

use dockbot::{AuthorizationPolicy, CommandRunner, Dispatcher, EngineError, Platform};

pub const ALLOWED_USER: u64 = 1001;
pub const STRANGER: u64 = 6666;

/// Runner that records every invocation and answers from a script.
///
/// Once the script is exhausted every call succeeds with empty output.
#[derive(Default)]
pub struct ScriptedRunner {
    responses: Mutex<VecDeque<Result<String, EngineError>>>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl ScriptedRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn ok(self: &Arc<Self>, stdout: &str) -> Arc<Self> {
        self.push(Ok(stdout.to_string()))
    }

    pub fn fail(self: &Arc<Self>, stderr: &str) -> Arc<Self> {
        self.push(Err(EngineError::Failed(stderr.to_string())))
    }

    fn push(self: &Arc<Self>, response: Result<String, EngineError>) -> Arc<Self> {
        self.responses.lock().unwrap().push_back(response);
        Arc::clone(self)
    }

    /// Every invocation so far, program first.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<String, EngineError> {
        let mut call = vec![program.to_string()];
        call.extend(args.iter().cloned());
        self.calls.lock().unwrap().push(call);

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(String::new()))
    }
}

pub fn dispatcher(runner: &Arc<ScriptedRunner>) -> Dispatcher {
    Dispatcher::new(
        "docker",
        Arc::clone(runner) as Arc<dyn CommandRunner>,
        AuthorizationPolicy::new([ALLOWED_USER]),
        FixedOffset::east_opt(0).unwrap(),
    )
    .with_platform(Platform::Linux)
}

/// Build an argument vector from string literals.
pub fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}
