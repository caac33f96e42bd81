//! The execution orchestrator.
//!
//! Drives one objective through its state machine: budget gating,
//! strategy selection, the retry/fallback attempt loop, and best-effort
//! rollback when the whole chain fails. Every transition is persisted
//! through the objective store before the loop advances, so a crash
//! after any attempt leaves the objective resumable from its last
//! durable state.

use std::sync::Arc;
use std::time::Instant;

use helmsman_budget::{BudgetMonitor, CostEstimator, ResourceSpec};
use helmsman_core::{
    AttemptOutcome, AttemptRecord, ExecutionContext, ExecutionResult, HelmsmanError, Intent,
    Objective, ObjectiveStatus, Result,
};
use helmsman_selector::StrategySelector;
use helmsman_store::{AuditEvent, AuditEventType, AuditLog, ObjectiveStore};
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cancel::CancelToken;
use crate::recovery::RecoveryPolicy;
use crate::retry::RetryPolicy;

/// Orchestrator configuration, passed explicitly at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Per-strategy retry budget and backoff timing.
    pub retry: RetryPolicy,

    /// Whether a failed chain triggers best-effort rollback.
    pub rollback_enabled: bool,

    /// How IN_PROGRESS objectives found at startup are handled.
    pub recovery: RecoveryPolicy,

    /// Strategy id explicitly preferred by the user, if any.
    pub preferred_strategy: Option<String>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            rollback_enabled: true,
            recovery: RecoveryPolicy::default(),
            preferred_strategy: None,
        }
    }
}

/// Drives intents to a terminal objective state.
///
/// One logical worker per objective: the attempt loop for a single
/// objective runs sequentially end-to-end, while independent objectives
/// may be driven concurrently through the shared store.
pub struct Orchestrator {
    pub(crate) store: Arc<dyn ObjectiveStore>,
    pub(crate) selector: StrategySelector,
    pub(crate) estimator: CostEstimator,
    pub(crate) monitor: BudgetMonitor,
    pub(crate) config: OrchestratorConfig,
    pub(crate) audit_log: Option<AuditLog>,
    pub(crate) cancel: CancelToken,
}

impl Orchestrator {
    /// Create an orchestrator over its collaborators.
    pub fn new(
        store: Arc<dyn ObjectiveStore>,
        selector: StrategySelector,
        estimator: CostEstimator,
        monitor: BudgetMonitor,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            store,
            selector,
            estimator,
            monitor,
            config,
            audit_log: None,
            cancel: CancelToken::new(),
        }
    }

    /// Attach an audit log recording every state transition.
    pub fn with_audit(mut self, audit_log: AuditLog) -> Self {
        self.audit_log = Some(audit_log);
        self
    }

    /// Token for cancelling this orchestrator's objectives between
    /// attempts.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Submit a new request: create the objective, gate it on budget,
    /// then execute it to a terminal state.
    ///
    /// Budget blocks and missing strategies surface immediately with the
    /// objective still Pending and zero attempts recorded.
    pub async fn submit(&self, request: &str, intent: Intent) -> Result<Objective> {
        intent.validate()?;

        let objective = self.store.create(request, intent).await?;
        info!("Objective {} created for request '{}'", objective.id, request);
        self.audit(objective.id, AuditEventType::Created, format!("request: {request}"))
            .await;

        let objective = self.gate(objective).await?;
        self.drive(objective.id).await
    }

    /// Re-drive a Pending objective after the conditions that blocked it
    /// changed: a raised budget limit, newly registered strategies. The
    /// budget gate runs again against the current limits.
    pub async fn resubmit(&self, id: Uuid) -> Result<Objective> {
        let objective = self.store.load(id).await?;
        if objective.status != ObjectiveStatus::Pending {
            return Err(HelmsmanError::Internal(format!(
                "objective {} is {:?}, not resubmittable",
                id, objective.status
            )));
        }

        info!("Resubmitting objective {}", id);
        let objective = self.gate(objective).await?;
        self.drive(objective.id).await
    }

    /// Estimate cost, persist the estimate, and apply the budget gate.
    async fn gate(&self, objective: Objective) -> Result<Objective> {
        let specs = ResourceSpec::from_intent(&objective.intent);
        let region = objective.intent.parameter_str("region");
        let estimate = self.estimator.estimate(&specs, region);

        let monthly = estimate.monthly;
        let objective = self
            .store
            .update(
                objective.id,
                Box::new(move |o| {
                    o.estimated_cost = monthly;
                    Ok(())
                }),
            )
            .await?;

        let decision = self.monitor.check(&objective, &estimate).await;
        debug!(
            "Budget decision for objective {}: {:?} ({:.0}% of {:.2})",
            objective.id,
            decision.alert_level,
            decision.percentage_of_limit * 100.0,
            decision.limit
        );
        if !decision.allowed {
            self.audit(
                objective.id,
                AuditEventType::BudgetBlocked,
                format!(
                    "estimated {:.2} + historical {:.2} exceeds limit {:.2}",
                    decision.estimated_cost, decision.historical_spend, decision.limit
                ),
            )
            .await;
            return Err(HelmsmanError::BudgetExceeded {
                objective_id: objective.id,
                estimated: decision.estimated_cost,
                limit: decision.limit,
            });
        }
        if decision.alert_level != helmsman_core::AlertLevel::Ok {
            warn!(
                "Objective {} proceeds at {:?} budget level ({:.0}% of limit)",
                objective.id,
                decision.alert_level,
                decision.percentage_of_limit * 100.0
            );
        }

        Ok(objective)
    }

    /// Execute an already-created objective to a terminal state.
    pub(crate) async fn drive(&self, id: Uuid) -> Result<Objective> {
        let objective = self.store.load(id).await?;
        let ctx =
            ExecutionContext::from_objective(&objective, self.config.preferred_strategy.clone());

        // Selection failures leave the objective Pending.
        let chain = self.selector.select(&ctx).await?;

        if objective.status == ObjectiveStatus::Pending {
            let first = chain[0].id().to_string();
            self.store
                .update(
                    id,
                    Box::new(move |o| {
                        o.selected_strategy = Some(first);
                        o.transition_to(ObjectiveStatus::InProgress)
                    }),
                )
                .await?;
            self.audit(id, AuditEventType::StatusChanged, "pending -> in_progress")
                .await;
        }

        self.run_chain(id, &ctx, chain).await
    }

    /// The attempt loop: retry the current strategy with backoff,
    /// escalate to the next on fatal failure or retry exhaustion.
    async fn run_chain(
        &self,
        id: Uuid,
        ctx: &ExecutionContext,
        chain: Vec<Arc<dyn helmsman_core::Strategy>>,
    ) -> Result<Objective> {
        let mut last_error: Option<String> = None;
        let mut last_strategy = String::new();

        'strategies: for strategy in &chain {
            let objective = self.store.load(id).await?;
            let mut attempt_number = objective.attempts_for(strategy.id());
            if attempt_number >= self.config.retry.max_attempts {
                continue;
            }

            loop {
                if let Some(reason) = self.cancel.cancelled() {
                    info!("Objective {} cancelled between attempts: {}", id, reason);
                    self.fail(id, format!("cancelled: {reason}")).await?;
                    return Err(HelmsmanError::Cancelled { reason });
                }

                attempt_number += 1;
                last_strategy = strategy.id().to_string();
                debug!(
                    "Objective {}: attempt {} via strategy '{}'",
                    id,
                    attempt_number,
                    strategy.id()
                );

                let started = Instant::now();
                let result = strategy.execute(ctx).await;
                let duration_ms = started.elapsed().as_millis() as u64;

                let mut outcome = result.outcome();
                let mut error_detail = result.error.as_ref().map(|e| e.to_string());

                if outcome == AttemptOutcome::Success && !strategy.validate(&result).await {
                    outcome = AttemptOutcome::FatalFailure;
                    error_detail = Some("post-execution validation failed".to_string());
                }

                let mut record = AttemptRecord::new(strategy.id(), attempt_number, outcome)
                    .with_duration(duration_ms)
                    .with_resources(result.resources_created.clone())
                    .with_outputs(result.outputs.clone());
                if let Some(detail) = &error_detail {
                    record = record.with_error(detail.clone());
                }

                // Durable before the loop advances; a persistence failure
                // here surfaces and logical state does not move.
                self.store.append_attempt(id, record).await?;
                self.audit(
                    id,
                    AuditEventType::AttemptRecorded,
                    format!("{} attempt {} -> {:?}", strategy.id(), attempt_number, outcome),
                )
                .await;

                match outcome {
                    AttemptOutcome::Success => {
                        let accrued = strategy.estimate_cost(ctx);
                        let completed = self
                            .store
                            .update(
                                id,
                                Box::new(move |o| {
                                    o.accrue_cost(accrued);
                                    o.transition_to(ObjectiveStatus::Completed)
                                }),
                            )
                            .await?;
                        self.audit(id, AuditEventType::StatusChanged, "in_progress -> completed")
                            .await;
                        info!(
                            "Objective {} completed by strategy '{}' after {} attempt(s)",
                            id,
                            strategy.id(),
                            completed.attempts.len()
                        );
                        return Ok(completed);
                    }
                    AttemptOutcome::RetriableFailure => {
                        last_error = error_detail;
                        if attempt_number >= self.config.retry.max_attempts {
                            warn!(
                                "Objective {}: strategy '{}' exhausted its retry budget",
                                id,
                                strategy.id()
                            );
                            continue 'strategies;
                        }
                        let delay = self.config.retry.jittered_delay(attempt_number);
                        debug!(
                            "Objective {}: retrying '{}' in {:?}",
                            id,
                            strategy.id(),
                            delay
                        );
                        sleep(delay).await;
                    }
                    AttemptOutcome::FatalFailure => {
                        warn!(
                            "Objective {}: strategy '{}' failed fatally: {}",
                            id,
                            strategy.id(),
                            error_detail.as_deref().unwrap_or("unknown")
                        );
                        last_error = error_detail;
                        continue 'strategies;
                    }
                }
            }
        }

        let detail = last_error.unwrap_or_else(|| "all strategies exhausted".to_string());
        self.fail(id, detail.clone()).await?;
        Err(HelmsmanError::FatalExecution {
            strategy_id: last_strategy,
            message: detail,
        })
    }

    /// Roll back (if enabled) and mark the objective Failed.
    async fn fail(&self, id: Uuid, detail: String) -> Result<Objective> {
        if self.config.rollback_enabled {
            self.rollback_outstanding(id).await?;
        }

        let objective = self
            .store
            .update(
                id,
                Box::new(move |o| {
                    o.error = Some(detail);
                    o.transition_to(ObjectiveStatus::Failed)
                }),
            )
            .await?;
        self.audit(id, AuditEventType::StatusChanged, "in_progress -> failed")
            .await;
        warn!(
            "Objective {} failed: {}",
            id,
            objective.error.as_deref().unwrap_or("unknown")
        );
        Ok(objective)
    }

    /// Explicit, idempotent rollback of a failed objective's outstanding
    /// resources. Rolling back an objective with nothing outstanding is
    /// a no-op, not an error.
    pub async fn rollback_objective(&self, id: Uuid) -> Result<Objective> {
        self.rollback_outstanding(id).await?;
        self.store.load(id).await
    }

    /// Best-effort teardown of every resource created but not yet rolled
    /// back. Individual teardown failures are recorded and tolerated.
    pub(crate) async fn rollback_outstanding(&self, id: Uuid) -> Result<()> {
        let objective = self.store.load(id).await?;
        let outstanding = objective.outstanding_resources();
        if outstanding.is_empty() {
            return Ok(());
        }

        info!(
            "Objective {}: rolling back {} outstanding resource(s)",
            id,
            outstanding.len()
        );

        for resource in outstanding {
            let strategy_id = match objective
                .creator_of(&resource)
                .map(str::to_string)
                .or_else(|| objective.selected_strategy.clone())
            {
                Some(strategy_id) => strategy_id,
                None => continue,
            };

            let strategy = self
                .selector
                .strategies()
                .iter()
                .find(|s| s.id() == strategy_id)
                .cloned();

            let current = self.store.load(id).await?;
            let pass_number = current
                .attempts
                .iter()
                .filter(|a| a.is_rollback && a.strategy_id == strategy_id)
                .count() as u32
                + 1;

            let record = match strategy {
                Some(strategy) => {
                    let torn_down = strategy
                        .rollback(&ExecutionResult::for_resource(resource.clone()))
                        .await;
                    if torn_down {
                        AttemptRecord::rollback(&strategy_id, pass_number, AttemptOutcome::Success)
                            .with_resources(vec![resource.clone()])
                    } else {
                        warn!(
                            "Objective {}: teardown of {} by '{}' failed",
                            id, resource, strategy_id
                        );
                        AttemptRecord::rollback(
                            &strategy_id,
                            pass_number,
                            AttemptOutcome::FatalFailure,
                        )
                        .with_error(format!("teardown of {resource} failed"))
                    }
                }
                None => AttemptRecord::rollback(
                    &strategy_id,
                    pass_number,
                    AttemptOutcome::FatalFailure,
                )
                .with_error(format!("strategy '{strategy_id}' is no longer registered")),
            };

            self.store.append_attempt(id, record).await?;
            self.audit(
                id,
                AuditEventType::RollbackRecorded,
                format!("teardown of {resource} via '{strategy_id}'"),
            )
            .await;
        }

        Ok(())
    }

    /// Administratively delete an objective (retention cleanup).
    pub async fn delete_objective(&self, id: Uuid) -> Result<()> {
        self.store.delete(id).await?;
        self.audit(id, AuditEventType::Deleted, "administrative delete")
            .await;
        Ok(())
    }

    /// Append to the audit log, if one is attached. Audit failures are
    /// logged, not fatal: the objective record itself is the source of
    /// truth.
    pub(crate) async fn audit(
        &self,
        id: Uuid,
        event_type: AuditEventType,
        detail: impl Into<String>,
    ) {
        if let Some(log) = &self.audit_log {
            if let Err(err) = log.append(AuditEvent::new(id, event_type, detail)).await {
                warn!("Audit append failed for objective {}: {}", id, err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::support::ScriptedStrategy;
    use helmsman_budget::{BudgetConfig, PricingTable};
    use helmsman_core::{ExecutionError, ExecutionErrorKind, StrategyKind};
    use helmsman_store::InMemoryObjectiveStore;

    fn fast_config() -> OrchestratorConfig {
        OrchestratorConfig {
            retry: RetryPolicy {
                max_attempts: 3,
                base_delay_ms: 1,
                max_delay_ms: 4,
            },
            ..OrchestratorConfig::default()
        }
    }

    fn orchestrator(
        strategies: Vec<Arc<ScriptedStrategy>>,
        monthly_limit: f64,
        config: OrchestratorConfig,
    ) -> (Arc<InMemoryObjectiveStore>, Orchestrator) {
        let store = Arc::new(InMemoryObjectiveStore::new());
        let mut selector = StrategySelector::new();
        for strategy in strategies {
            selector.register(strategy);
        }
        let estimator = CostEstimator::new(PricingTable::builtin());
        let monitor = BudgetMonitor::new(store.clone(), BudgetConfig::with_limit(monthly_limit));
        let orchestrator = Orchestrator::new(store.clone(), selector, estimator, monitor, config);
        (store, orchestrator)
    }

    fn vm_intent() -> Intent {
        Intent::builder()
            .operation("provision_vm")
            .parameter("count", 1)
            .build()
            .unwrap()
    }

    fn retriable() -> ExecutionResult {
        ExecutionResult::failure(ExecutionError::new(
            ExecutionErrorKind::Timeout,
            "deadline exceeded",
        ))
    }

    fn fatal_with(resources: Vec<String>) -> ExecutionResult {
        ExecutionResult::failure(ExecutionError::new(
            ExecutionErrorKind::QuotaExceeded,
            "vCPU quota exhausted",
        ))
        .with_resources(resources)
    }

    // Scenario: primary strategy fails transiently three times, fallback
    // succeeds on its first try.
    #[tokio::test]
    async fn test_retry_then_fallback_success() {
        let a = Arc::new(
            ScriptedStrategy::new("a", StrategyKind::Protocol)
                .with_script(vec![retriable(), retriable(), retriable()]),
        );
        let b = Arc::new(
            ScriptedStrategy::new("b", StrategyKind::GeneratedCode)
                .with_script(vec![ExecutionResult::success(vec!["vm-1".into()])]),
        );
        let (_store, orchestrator) = orchestrator(vec![a.clone(), b.clone()], 10_000.0, fast_config());

        let objective = orchestrator.submit("provision a vm", vm_intent()).await.unwrap();

        assert_eq!(objective.status, ObjectiveStatus::Completed);
        assert_eq!(objective.attempts.len(), 4);
        assert_eq!(objective.selected_strategy.as_deref(), Some("b"));
        assert_eq!(a.executions(), 3);
        assert_eq!(b.executions(), 1);
        assert_eq!(objective.resources_created, vec!["vm-1"]);
    }

    // Scenario: the estimate exceeds the budget, so execution is blocked
    // before any attempt.
    #[tokio::test]
    async fn test_budget_blocks_before_any_attempt() {
        let a = Arc::new(ScriptedStrategy::new("a", StrategyKind::Protocol));
        let (store, orchestrator) = orchestrator(vec![a.clone()], 500.0, fast_config());

        // One GPU VM prices at ~$657/month against a $500 limit.
        let intent = Intent::builder()
            .operation("provision_vm")
            .parameter("count", 1)
            .parameter("gpu", true)
            .build()
            .unwrap();

        let err = orchestrator.submit("provision a gpu vm", intent).await.unwrap_err();
        assert!(matches!(err, HelmsmanError::BudgetExceeded { .. }));

        let objectives = store.list(None).await.unwrap();
        assert_eq!(objectives.len(), 1);
        assert_eq!(objectives[0].status, ObjectiveStatus::Pending);
        assert!(objectives[0].attempts.is_empty());
        assert_eq!(a.executions(), 0);
    }

    // A blocked objective stays Pending and can be re-driven once the
    // limit is raised.
    #[tokio::test]
    async fn test_resubmit_after_limit_raised() {
        let a = Arc::new(
            ScriptedStrategy::new("a", StrategyKind::Protocol)
                .with_script(vec![ExecutionResult::success(vec!["vm-1".into()])]),
        );
        let (store, tight) = orchestrator(vec![a.clone()], 500.0, fast_config());

        let intent = Intent::builder()
            .operation("provision_vm")
            .parameter("count", 1)
            .parameter("gpu", true)
            .build()
            .unwrap();
        let err = tight.submit("provision a gpu vm", intent).await.unwrap_err();
        assert!(matches!(err, HelmsmanError::BudgetExceeded { .. }));
        let id = err.objective_id().unwrap();

        // Same store, raised limit.
        let mut selector = StrategySelector::new();
        selector.register(a.clone());
        let monitor = BudgetMonitor::new(store.clone(), BudgetConfig::with_limit(10_000.0));
        let relaxed = Orchestrator::new(
            store.clone(),
            selector,
            CostEstimator::new(PricingTable::builtin()),
            monitor,
            fast_config(),
        );

        let objective = relaxed.resubmit(id).await.unwrap();
        assert_eq!(objective.status, ObjectiveStatus::Completed);
        assert_eq!(a.executions(), 1);

        // Terminal objectives are not resubmittable.
        assert!(relaxed.resubmit(id).await.is_err());
    }

    // Scenario: no registered strategy can handle the intent.
    #[tokio::test]
    async fn test_no_capable_strategy_leaves_objective_pending() {
        let a = Arc::new(ScriptedStrategy::new("a", StrategyKind::Protocol).incapable());
        let (store, orchestrator) = orchestrator(vec![a], 10_000.0, fast_config());

        let err = orchestrator.submit("provision a vm", vm_intent()).await.unwrap_err();
        assert!(matches!(err, HelmsmanError::NoStrategyFound { .. }));

        let objectives = store.list(None).await.unwrap();
        assert_eq!(objectives[0].status, ObjectiveStatus::Pending);
        assert!(objectives[0].attempts.is_empty());
    }

    // Scenario: every strategy fails fatally after creating resources;
    // rollback tears down all but one, which stays flagged.
    #[tokio::test]
    async fn test_full_chain_failure_rolls_back_with_partial_teardown() {
        let a = Arc::new(
            ScriptedStrategy::new("a", StrategyKind::Protocol)
                .with_script(vec![fatal_with(vec!["r1".into(), "r2".into()])]),
        );
        let b = Arc::new(
            ScriptedStrategy::new("b", StrategyKind::Cli)
                .with_script(vec![fatal_with(vec!["r3".into(), "r4".into()])])
                .failing_teardown("r3"),
        );
        let (store, orchestrator) = orchestrator(vec![a.clone(), b.clone()], 10_000.0, fast_config());

        let err = orchestrator.submit("provision a vm", vm_intent()).await.unwrap_err();
        assert!(matches!(err, HelmsmanError::FatalExecution { .. }));

        let objective = &store.list(None).await.unwrap()[0];
        assert_eq!(objective.status, ObjectiveStatus::Failed);
        // All four resources are retained in the record.
        assert_eq!(objective.resources_created.len(), 4);
        // One teardown failed and stays outstanding.
        assert_eq!(objective.outstanding_resources(), vec!["r3"]);

        // Two forward attempts plus four recorded teardown passes.
        assert_eq!(objective.attempts.len(), 6);
        assert_eq!(objective.attempts.iter().filter(|x| x.is_rollback).count(), 4);
    }

    // Property: a strategy is attempted at most max_attempts times before
    // the orchestrator falls back, regardless of error repetition.
    #[tokio::test]
    async fn test_retry_bound() {
        let a = Arc::new(
            ScriptedStrategy::new("a", StrategyKind::Protocol).with_default(retriable()),
        );
        let (store, orchestrator) = orchestrator(vec![a.clone()], 10_000.0, fast_config());

        let err = orchestrator.submit("provision a vm", vm_intent()).await.unwrap_err();
        assert!(matches!(err, HelmsmanError::FatalExecution { .. }));
        assert_eq!(a.executions(), 3);

        let objective = &store.list(None).await.unwrap()[0];
        assert_eq!(objective.status, ObjectiveStatus::Failed);
        assert_eq!(objective.attempts.len(), 3);
    }

    // Property: rollback is idempotent; a second pass finds nothing
    // outstanding and tears nothing down twice.
    #[tokio::test]
    async fn test_rollback_idempotent() {
        let a = Arc::new(
            ScriptedStrategy::new("a", StrategyKind::Protocol)
                .with_script(vec![fatal_with(vec!["r1".into(), "r2".into()])]),
        );
        let (store, orchestrator) = orchestrator(vec![a.clone()], 10_000.0, fast_config());

        orchestrator.submit("provision a vm", vm_intent()).await.unwrap_err();
        let objective = &store.list(None).await.unwrap()[0];
        assert!(objective.outstanding_resources().is_empty());
        assert_eq!(a.teardowns(), vec!["r1", "r2"]);

        // Second explicit rollback is a no-op, not an error.
        let again = orchestrator.rollback_objective(objective.id).await.unwrap();
        assert_eq!(a.teardowns(), vec!["r1", "r2"]);
        assert_eq!(again.attempts.len(), objective.attempts.len());
    }

    #[tokio::test]
    async fn test_validation_failure_is_fatal_for_strategy() {
        let a = Arc::new(
            ScriptedStrategy::new("a", StrategyKind::Protocol)
                .with_script(vec![ExecutionResult::success(vec!["ghost-1".into()])])
                .failing_validation(),
        );
        let b = Arc::new(
            ScriptedStrategy::new("b", StrategyKind::Cli)
                .with_script(vec![ExecutionResult::success(vec!["vm-1".into()])]),
        );
        let (_store, orchestrator) = orchestrator(vec![a.clone(), b.clone()], 10_000.0, fast_config());

        let objective = orchestrator.submit("provision a vm", vm_intent()).await.unwrap();
        assert_eq!(objective.status, ObjectiveStatus::Completed);
        assert_eq!(objective.selected_strategy.as_deref(), Some("b"));
        // Only one attempt by 'a': validation failure escalates, it is
        // not retried.
        assert_eq!(a.executions(), 1);
        assert_eq!(
            objective.attempts[0].error_detail.as_deref(),
            Some("post-execution validation failed")
        );
    }

    #[tokio::test]
    async fn test_cancellation_between_attempts() {
        let a = Arc::new(
            ScriptedStrategy::new("a", StrategyKind::Protocol)
                .with_script(vec![ExecutionResult::success(vec!["vm-1".into()])]),
        );
        let (store, orchestrator) = orchestrator(vec![a.clone()], 10_000.0, fast_config());

        orchestrator.cancel_token().cancel("user hit ctrl-c");
        let err = orchestrator.submit("provision a vm", vm_intent()).await.unwrap_err();
        assert!(matches!(err, HelmsmanError::Cancelled { .. }));

        let objective = &store.list(None).await.unwrap()[0];
        assert_eq!(objective.status, ObjectiveStatus::Failed);
        assert!(objective.error.as_deref().unwrap_or("").contains("cancelled"));
        assert_eq!(a.executions(), 0);
    }

    #[tokio::test]
    async fn test_rollback_disabled_leaves_resources_outstanding() {
        let a = Arc::new(
            ScriptedStrategy::new("a", StrategyKind::Protocol)
                .with_script(vec![fatal_with(vec!["r1".into()])]),
        );
        let config = OrchestratorConfig {
            rollback_enabled: false,
            ..fast_config()
        };
        let (store, orchestrator) = orchestrator(vec![a.clone()], 10_000.0, config);

        orchestrator.submit("provision a vm", vm_intent()).await.unwrap_err();
        let objective = &store.list(None).await.unwrap()[0];
        assert_eq!(objective.status, ObjectiveStatus::Failed);
        assert_eq!(objective.outstanding_resources(), vec!["r1"]);
        assert!(a.teardowns().is_empty());
    }

    #[tokio::test]
    async fn test_success_accrues_cost() {
        let a = Arc::new(
            ScriptedStrategy::new("a", StrategyKind::Protocol)
                .with_cost(42.0)
                .with_script(vec![ExecutionResult::success(vec!["vm-1".into()])]),
        );
        let (_store, orchestrator) = orchestrator(vec![a], 10_000.0, fast_config());

        let objective = orchestrator.submit("provision a vm", vm_intent()).await.unwrap();
        assert_eq!(objective.total_cost, 42.0);
        assert!(objective.estimated_cost > 0.0);
    }

    #[tokio::test]
    async fn test_audit_trail_of_successful_run() {
        let dir = tempfile::tempdir().unwrap();
        let a = Arc::new(
            ScriptedStrategy::new("a", StrategyKind::Protocol)
                .with_script(vec![ExecutionResult::success(vec!["vm-1".into()])]),
        );
        let (_store, orchestrator) = orchestrator(vec![a], 10_000.0, fast_config());
        let orchestrator = orchestrator.with_audit(AuditLog::open(dir.path()));

        let objective = orchestrator.submit("provision a vm", vm_intent()).await.unwrap();

        let log = AuditLog::open(dir.path());
        let events = log.events_for(objective.id).await.unwrap();
        let kinds: Vec<AuditEventType> = events.iter().map(|e| e.event_type).collect();
        assert_eq!(
            kinds,
            vec![
                AuditEventType::Created,
                AuditEventType::StatusChanged,
                AuditEventType::AttemptRecorded,
                AuditEventType::StatusChanged,
            ]
        );
    }
}
