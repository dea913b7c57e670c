//! Task Lease
//!
//! A `Task` grants exactly one ready operator node to one worker.
//!
//! ## State Machine
//! `Leased -> Completed` or `Leased -> Canceled`. Both targets are terminal;
//! the task's own mutex makes `complete` and `cancel` mutually exclusive, so
//! a late report from a reclaimed lease is rejected instead of touching a
//! tree that has moved on.

use super::errors::TaskError;
use super::expression::Expression;
use super::tree::{NodeId, Operator};

use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Leased,
    Completed,
    Canceled,
}

#[derive(Debug)]
pub struct Task {
    id: u64,
    expression: Arc<Expression>,
    node: NodeId,
    operator: Operator,
    arguments: (f64, f64),
    state: Mutex<TaskState>,
}

impl Task {
    pub(crate) fn new(
        id: u64,
        expression: Arc<Expression>,
        node: NodeId,
        operator: Operator,
        arguments: (f64, f64),
    ) -> Self {
        Self {
            id,
            expression,
            node,
            operator,
            arguments,
            state: Mutex::new(TaskState::Leased),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn expression(&self) -> &Arc<Expression> {
        &self.expression
    }

    pub fn expression_id(&self) -> u64 {
        self.expression.id()
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// Left and right operand values captured at lease time.
    pub fn arguments(&self) -> (f64, f64) {
        self.arguments
    }

    fn lock(&self) -> MutexGuard<'_, TaskState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> TaskState {
        *self.lock()
    }

    pub fn is_terminal(&self) -> bool {
        self.state() != TaskState::Leased
    }

    /// Replaces the leased node with `result`.
    ///
    /// If the owning expression has failed meanwhile, the lease is retired as
    /// canceled and `ExpressionFailed` is returned without touching the tree.
    pub fn complete(&self, result: f64) -> Result<(), TaskError> {
        let mut state = self.lock();

        match *state {
            TaskState::Completed => return Err(TaskError::AlreadyCompleted),
            TaskState::Canceled => return Err(TaskError::AlreadyCanceled),
            TaskState::Leased => {}
        }

        if let Err(e) = self.expression.apply_result(self.node, result) {
            *state = TaskState::Canceled;
            return Err(e);
        }

        *state = TaskState::Completed;
        Ok(())
    }

    /// Retires the lease and makes the node leasable again.
    pub fn cancel(&self) -> Result<(), TaskError> {
        let mut state = self.lock();

        match *state {
            TaskState::Completed => return Err(TaskError::CannotCancelCompleted),
            TaskState::Canceled => return Err(TaskError::AlreadyCanceled),
            TaskState::Leased => {}
        }

        self.expression.release(self.node);
        *state = TaskState::Canceled;
        Ok(())
    }
}
