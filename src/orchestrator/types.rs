use crate::calculator::{Expression, ExpressionStatus, Operator, ParseError, TaskError};

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Simulated compute latency per operator.
///
/// Only used to tell workers how long an operation is expected to take;
/// correctness never depends on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationTimes {
    pub addition: Duration,
    pub subtraction: Duration,
    pub multiplication: Duration,
    pub division: Duration,
}

impl OperationTimes {
    pub fn for_operator(&self, operator: Operator) -> Duration {
        match operator {
            Operator::Add => self.addition,
            Operator::Subtract => self.subtraction,
            Operator::Multiply => self.multiplication,
            Operator::Divide => self.division,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    /// How long a lease may stay outstanding before its watchdog reclaims it.
    pub max_process_time: Duration,
    pub operation_times: OperationTimes,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            max_process_time: Duration::from_secs(60),
            operation_times: OperationTimes::default(),
        }
    }
}

/// What a worker receives when it leases a task.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskDescriptor {
    pub task_id: u64,
    pub expression_id: u64,
    pub arg1: f64,
    pub arg2: f64,
    pub operator: Operator,
    /// Compute-time hint for the worker.
    pub allotted_time: Duration,
}

/// Externally visible state of one expression. `result` is only present
/// once the expression succeeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionView {
    pub id: u64,
    pub expression: String,
    pub status: ExpressionStatus,
    pub result: Option<f64>,
}

impl From<&Expression> for ExpressionView {
    fn from(expression: &Expression) -> Self {
        let status = expression.status();
        let result = match status {
            ExpressionStatus::Succeeded => expression.result().ok(),
            _ => None,
        };

        Self {
            id: expression.id(),
            expression: expression.source().to_string(),
            status,
            result,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("no tasks to process")]
    NoTasksAvailable,

    #[error("task {0} not found")]
    TaskNotFound(u64),

    #[error("expression {0} not found")]
    ExpressionNotFound(u64),

    #[error(transparent)]
    Task(#[from] TaskError),
}

impl SchedulerError {
    /// Rejected lifecycle transition: a stale, duplicate or post-failure report.
    pub fn is_stale_report(&self) -> bool {
        matches!(self, Self::Task(_))
    }
}
