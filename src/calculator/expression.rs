//! Expression Aggregate
//!
//! Owns one `ExpressionTree` behind a mutex together with the `processing`
//! and `failed` flags. The mutex guards the readiness scan and every splice,
//! so two concurrent scans can never lease the same node.

use super::errors::{CalcError, TaskError};
use super::task::Task;
use super::tree::{ExpressionTree, NodeId};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

/// Externally visible lifecycle of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpressionStatus {
    /// Stored, no operation leased yet.
    Pending,
    /// At least one operation has been leased.
    Processing,
    /// Fully reduced; the result is available.
    Succeeded,
    /// A worker reported an arithmetic failure. No result is ever exposed.
    Failed,
}

#[derive(Debug)]
struct ExpressionState {
    tree: ExpressionTree,
    processing: bool,
    failed: bool,
    finished_at: Option<Instant>,
}

#[derive(Debug)]
pub struct Expression {
    id: u64,
    source: String,
    state: Mutex<ExpressionState>,
}

impl Expression {
    /// Wraps an already parsed tree. A constant expression starts out finished.
    pub fn from_tree(id: u64, source: &str, tree: ExpressionTree) -> Self {
        let finished_at = tree.is_reduced().then(Instant::now);

        Self {
            id,
            source: source.to_string(),
            state: Mutex::new(ExpressionState {
                tree,
                processing: false,
                failed: false,
                finished_at,
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    fn lock(&self) -> MutexGuard<'_, ExpressionState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Leases the next ready node, if any, as a new `Task`.
    ///
    /// `next_id` is only called when a node was found. Failed expressions
    /// never hand out work.
    pub fn next_task(self: &Arc<Self>, next_id: impl FnOnce() -> u64) -> Option<Task> {
        let mut state = self.lock();

        if state.failed {
            return None;
        }

        let node = state.tree.find_next_ready_node()?;
        let Some((operator, left, right)) = state.tree.operands(node) else {
            state.tree.release(node);
            return None;
        };
        state.processing = true;
        drop(state);

        Some(Task::new(
            next_id(),
            Arc::clone(self),
            node,
            operator,
            (left, right),
        ))
    }

    pub fn is_failed(&self) -> bool {
        self.lock().failed
    }

    pub fn is_evaluated(&self) -> bool {
        let state = self.lock();
        !state.failed && state.tree.is_reduced()
    }

    /// Failed or fully reduced.
    pub fn is_terminal(&self) -> bool {
        let state = self.lock();
        state.failed || state.tree.is_reduced()
    }

    pub fn result(&self) -> Result<f64, CalcError> {
        let state = self.lock();

        if state.failed {
            return Err(CalcError::NotEvaluated);
        }
        state.tree.root_value().ok_or(CalcError::NotEvaluated)
    }

    /// Irreversible. Tasks already leased against this tree are left alone;
    /// their late results are rejected when they report.
    ///
    /// A fully reduced expression keeps its result: returns `false` and
    /// changes nothing.
    pub fn mark_failed(&self) -> bool {
        let mut state = self.lock();

        if state.tree.is_reduced() {
            return false;
        }
        if !state.failed {
            state.failed = true;
            state.finished_at = Some(Instant::now());
        }
        true
    }

    pub fn status(&self) -> ExpressionStatus {
        let state = self.lock();

        if state.failed {
            ExpressionStatus::Failed
        } else if state.tree.is_reduced() {
            ExpressionStatus::Succeeded
        } else if state.processing {
            ExpressionStatus::Processing
        } else {
            ExpressionStatus::Pending
        }
    }

    /// When the expression became terminal.
    pub fn finished_at(&self) -> Option<Instant> {
        self.lock().finished_at
    }

    /// Operator nodes left to compute.
    pub fn pending_operations(&self) -> usize {
        self.lock().tree.pending_operations()
    }

    /// Splices a computed value into the tree unless the expression failed.
    pub(crate) fn apply_result(&self, node: NodeId, value: f64) -> Result<(), TaskError> {
        let mut state = self.lock();

        if state.failed {
            state.tree.release(node);
            return Err(TaskError::ExpressionFailed);
        }

        state.tree.reduce(node, value);
        if state.tree.is_reduced() {
            state.finished_at = Some(Instant::now());
        }

        Ok(())
    }

    pub(crate) fn release(&self, node: NodeId) {
        self.lock().tree.release(node);
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.id, self.lock().tree)
    }
}
