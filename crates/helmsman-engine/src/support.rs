//! Scripted strategies for engine tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use helmsman_core::{
    ExecutionContext, ExecutionResult, Strategy, StrategyKind,
};

/// A strategy that replays a script of canned results, recording every
/// execute and rollback call.
pub(crate) struct ScriptedStrategy {
    id: String,
    kind: StrategyKind,
    capable: bool,
    cost: f64,
    validate_ok: bool,
    script: Mutex<VecDeque<ExecutionResult>>,
    default_result: ExecutionResult,
    failing_teardowns: Vec<String>,
    executions: AtomicU32,
    teardowns: Mutex<Vec<String>>,
}

impl ScriptedStrategy {
    pub fn new(id: impl Into<String>, kind: StrategyKind) -> Self {
        Self {
            id: id.into(),
            kind,
            capable: true,
            cost: 0.0,
            validate_ok: true,
            script: Mutex::new(VecDeque::new()),
            default_result: ExecutionResult::success(vec![]),
            failing_teardowns: Vec::new(),
            executions: AtomicU32::new(0),
            teardowns: Mutex::new(Vec::new()),
        }
    }

    /// Queue results returned by successive execute calls.
    pub fn with_script(self, results: Vec<ExecutionResult>) -> Self {
        *self.script.lock().unwrap() = results.into();
        self
    }

    /// Result returned once the script is exhausted.
    pub fn with_default(mut self, result: ExecutionResult) -> Self {
        self.default_result = result;
        self
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    pub fn incapable(mut self) -> Self {
        self.capable = false;
        self
    }

    /// Make post-execution validation fail.
    pub fn failing_validation(mut self) -> Self {
        self.validate_ok = false;
        self
    }

    /// Make teardown of the given resource fail.
    pub fn failing_teardown(mut self, resource: impl Into<String>) -> Self {
        self.failing_teardowns.push(resource.into());
        self
    }

    pub fn executions(&self) -> u32 {
        self.executions.load(Ordering::SeqCst)
    }

    pub fn teardowns(&self) -> Vec<String> {
        self.teardowns.lock().unwrap().clone()
    }
}

#[async_trait]
impl Strategy for ScriptedStrategy {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> StrategyKind {
        self.kind
    }

    async fn can_handle(&self, _ctx: &ExecutionContext) -> bool {
        self.capable
    }

    fn estimate_cost(&self, _ctx: &ExecutionContext) -> f64 {
        self.cost
    }

    async fn execute(&self, _ctx: &ExecutionContext) -> ExecutionResult {
        self.executions.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.default_result.clone())
    }

    async fn validate(&self, _result: &ExecutionResult) -> bool {
        self.validate_ok
    }

    async fn rollback(&self, result: &ExecutionResult) -> bool {
        let Some(resource) = result.resources_created.first() else {
            return true;
        };
        self.teardowns.lock().unwrap().push(resource.clone());
        !self.failing_teardowns.contains(resource)
    }
}
