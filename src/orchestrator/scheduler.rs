//! Expression Scheduler
//!
//! Accepts expressions, hands out ready operations as leases, and applies the
//! results reported back by workers.
//!
//! ## Responsibilities
//! - **Admission**: parses and stores new expressions under monotonic ids.
//! - **Leasing**: scans live expressions in id order and leases the first ready node.
//! - **Watchdogs**: every lease gets a one-shot timer that cancels it once the
//!   maximum processing time elapses, so an abandoned node becomes ready again.
//! - **Reporting**: routes successes and failures to the owning task and expression.

use super::types::*;
use crate::calculator::{Expression, ExpressionTree, Task};
use crate::storage::MemoryStore;

use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::oneshot;
use tokio::task::AbortHandle;

pub struct Scheduler {
    expressions: MemoryStore<Expression>,
    tasks: MemoryStore<Task>,
    /// Armed lease timers, keyed by task id.
    watchdogs: Arc<DashMap<u64, AbortHandle>>,
    expression_ids: AtomicU64,
    task_ids: AtomicU64,
    settings: SchedulerSettings,
}

impl Scheduler {
    pub fn new(settings: SchedulerSettings) -> Arc<Self> {
        Arc::new(Self {
            expressions: MemoryStore::new(),
            tasks: MemoryStore::new(),
            watchdogs: Arc::new(DashMap::new()),
            expression_ids: AtomicU64::new(0),
            task_ids: AtomicU64::new(0),
            settings,
        })
    }

    /// Parses and stores a new expression, returning its id.
    ///
    /// Ids are only drawn for input that parses, so rejected submissions
    /// leave no gaps.
    pub fn create_expression(&self, source: &str) -> Result<u64, SchedulerError> {
        let tree = ExpressionTree::parse(source).inspect_err(|e| {
            tracing::debug!("Rejected expression {:?}: {}", source, e);
        })?;

        let id = self.expression_ids.fetch_add(1, Ordering::SeqCst) + 1;
        let expression = Arc::new(Expression::from_tree(id, source, tree));

        tracing::info!(
            "Accepted expression {} ({} operations): {}",
            id,
            expression.pending_operations(),
            source
        );
        self.expressions.put(id, expression);

        Ok(id)
    }

    /// Leases the next ready operation, preferring the oldest expression.
    pub fn lease_next_task(&self) -> Result<TaskDescriptor, SchedulerError> {
        let mut expressions = self.expressions.all();
        expressions.sort_unstable_by_key(|expression| expression.id());

        for expression in expressions {
            let Some(task) = expression.next_task(|| self.next_task_id()) else {
                continue;
            };

            let task = Arc::new(task);
            self.tasks.put(task.id(), Arc::clone(&task));
            self.arm_watchdog(&task);

            let descriptor = self.describe(&task);
            tracing::info!(
                "Leased task {} of expression {}: {} {} {}",
                descriptor.task_id,
                descriptor.expression_id,
                descriptor.arg1,
                descriptor.operator,
                descriptor.arg2
            );
            return Ok(descriptor);
        }

        Err(SchedulerError::NoTasksAvailable)
    }

    /// Applies a computed value to the leased node.
    ///
    /// Late, duplicate and post-failure reports come back as
    /// `SchedulerError::Task` and leave the expression untouched.
    pub fn report_success(&self, task_id: u64, result: f64) -> Result<(), SchedulerError> {
        let task = self
            .tasks
            .get(task_id)
            .ok_or(SchedulerError::TaskNotFound(task_id))?;

        let outcome = task.complete(result);
        self.disarm_watchdog(task_id);

        if let Err(e) = outcome {
            tracing::warn!("Rejected result {} for task {}: {}", result, task_id, e);
            return Err(e.into());
        }

        let expression = task.expression();
        tracing::debug!("Task {} completed with {}", task_id, result);
        if let Ok(value) = expression.result() {
            tracing::info!("Expression {} evaluated to {}", expression.id(), value);
        }

        Ok(())
    }

    /// Marks the owning expression failed, then retires the task.
    ///
    /// Retiring is best effort: a task that was already canceled by its
    /// watchdog still fails its expression.
    pub fn report_failure(&self, task_id: u64, detail: &str) -> Result<(), SchedulerError> {
        let task = self
            .tasks
            .get(task_id)
            .ok_or(SchedulerError::TaskNotFound(task_id))?;

        self.disarm_watchdog(task_id);
        tracing::warn!(
            "Task {} of expression {} failed: {}",
            task_id,
            task.expression_id(),
            detail
        );

        if !task.expression().mark_failed() {
            tracing::warn!(
                "Expression {} already evaluated, failure of task {} ignored",
                task.expression_id(),
                task_id
            );
        }
        if let Err(e) = task.cancel() {
            tracing::debug!("Failed task {} was already retired: {}", task_id, e);
        }

        Ok(())
    }

    /// Gives a lease back so the node can be handed out again.
    pub fn cancel_task(&self, task_id: u64) -> Result<(), SchedulerError> {
        let task = self
            .tasks
            .get(task_id)
            .ok_or(SchedulerError::TaskNotFound(task_id))?;

        self.disarm_watchdog(task_id);
        task.cancel()?;
        tracing::info!("Task {} canceled, node released", task_id);

        Ok(())
    }

    pub fn expression_status(&self, id: u64) -> Result<ExpressionView, SchedulerError> {
        self.expressions
            .get(id)
            .map(|expression| ExpressionView::from(expression.as_ref()))
            .ok_or(SchedulerError::ExpressionNotFound(id))
    }

    /// Every stored expression, ordered by id.
    pub fn expressions(&self) -> Vec<ExpressionView> {
        let mut views: Vec<ExpressionView> = self
            .expressions
            .all()
            .iter()
            .map(|expression| ExpressionView::from(expression.as_ref()))
            .collect();
        views.sort_unstable_by_key(|view| view.id);
        views
    }

    pub fn expression(&self, id: u64) -> Option<Arc<Expression>> {
        self.expressions.get(id)
    }

    pub fn task(&self, id: u64) -> Option<Arc<Task>> {
        self.tasks.get(id)
    }

    pub fn expression_count(&self) -> usize {
        self.expressions.len()
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn armed_watchdogs(&self) -> usize {
        self.watchdogs.len()
    }

    /// Drops completed and canceled tasks. Returns how many were removed.
    pub fn purge_retired_tasks(&self) -> usize {
        let removed = self.tasks.remove_where(Task::is_terminal);
        self.watchdogs
            .retain(|task_id, _| self.tasks.contains(*task_id));
        removed
    }

    /// Drops expressions that became terminal at least `retention` ago.
    pub fn purge_finished_expressions(&self, retention: std::time::Duration) -> usize {
        self.expressions.remove_where(|expression| {
            expression
                .finished_at()
                .is_some_and(|finished| finished.elapsed() >= retention)
        })
    }

    fn next_task_id(&self) -> u64 {
        self.task_ids.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn describe(&self, task: &Task) -> TaskDescriptor {
        let (arg1, arg2) = task.arguments();
        TaskDescriptor {
            task_id: task.id(),
            expression_id: task.expression_id(),
            arg1,
            arg2,
            operator: task.operator(),
            allotted_time: self.settings.operation_times.for_operator(task.operator()),
        }
    }

    /// Spawns the one-shot timer that cancels `task` after the maximum
    /// processing time. A task that already finished only logs.
    fn arm_watchdog(&self, task: &Arc<Task>) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::error!("No async runtime, task {} leased without a watchdog", task.id());
            return;
        };

        let timeout = self.settings.max_process_time;
        let watchdogs = Arc::clone(&self.watchdogs);
        let task_for_timer = Arc::clone(task);
        let (armed_tx, armed_rx) = oneshot::channel::<()>();

        let handle = runtime.spawn(async move {
            // the handle must be registered before the timer can remove it
            if armed_rx.await.is_err() {
                return;
            }
            tokio::time::sleep(timeout).await;

            let task_id = task_for_timer.id();
            watchdogs.remove(&task_id);
            match task_for_timer.cancel() {
                Ok(()) => tracing::warn!(
                    "Task {} of expression {} exceeded {:?}, lease reclaimed",
                    task_id,
                    task_for_timer.expression_id(),
                    timeout
                ),
                Err(e) => tracing::debug!("Watchdog for task {} found it retired: {}", task_id, e),
            }
        });

        self.watchdogs.insert(task.id(), handle.abort_handle());
        let _ = armed_tx.send(());
    }

    fn disarm_watchdog(&self, task_id: u64) {
        if let Some((_, handle)) = self.watchdogs.remove(&task_id) {
            handle.abort();
            tracing::trace!("Watchdog for task {} disarmed", task_id);
        }
    }
}
