// tests/common/mod.rs
// Scripted completion backend shared by the integration tests
#![allow(dead_code)] // each test binary uses a different subset

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use vega::error::{Result, VegaError};
use vega::llm::{CompletionBackend, CompletionRequest};

/// One scripted reaction of the stub service
#[derive(Debug, Clone)]
pub enum StubResponse {
    Ok(String),
    RateLimited,
    Fail(String),
}

impl StubResponse {
    fn into_result(self) -> Result<String> {
        match self {
            StubResponse::Ok(text) => Ok(text),
            StubResponse::RateLimited => Err(VegaError::RateLimited),
            StubResponse::Fail(msg) => Err(VegaError::Llm(msg)),
        }
    }
}

/// Completion backend that replays a script and records every request.
/// When the script runs dry it keeps returning `exhausted`, convenient for
/// "always rate limited" scenarios.
pub struct StubBackend {
    script: Mutex<VecDeque<StubResponse>>,
    exhausted: StubResponse,
    calls: AtomicUsize,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl StubBackend {
    pub fn new(script: Vec<StubResponse>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            exhausted: StubResponse::Fail("stub script exhausted".to_string()),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A stub whose every call yields the same reaction
    pub fn always(response: StubResponse) -> Self {
        let mut stub = Self::new(Vec::new());
        stub.exhausted = response;
        stub
    }

    /// Continue with `response` once the script is exhausted
    pub fn then_always(mut self, response: StubResponse) -> Self {
        self.exhausted = response;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Snapshot of every request the stub has seen, in order
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionBackend for StubBackend {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);

        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.exhausted.clone()).into_result()
    }
}

/// Valid structured payload for the explanation pipeline
pub fn valid_explanation_json() -> String {
    r#"{
        "language": "Python",
        "detailed_explanation": "Defines f, which returns the constant 1.",
        "key_concepts": ["functions", "return values"]
    }"#
    .to_string()
}

/// Valid structured payload for the improvement pipeline
pub fn valid_improvement_json() -> String {
    r#"{
        "original_issues": ["no docstring"],
        "suggestions": ["add a docstring"],
        "improved_code": "def f():\n    \"\"\"Return 1.\"\"\"\n    return 1",
        "explanation": "Documented the function."
    }"#
    .to_string()
}
