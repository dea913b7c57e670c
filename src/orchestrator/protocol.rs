//! HTTP Protocol Definitions
//!
//! DTOs exchanged between clients, the orchestrator and agents.
//! Public routes live under `/api/v1`, worker routes under `/internal`.

use super::types::{ExpressionView, TaskDescriptor};
use serde::{Deserialize, Serialize};

pub const ENDPOINT_CALCULATE: &str = "/api/v1/calculate";
pub const ENDPOINT_EXPRESSIONS: &str = "/api/v1/expressions";
pub const ENDPOINT_EXPRESSION: &str = "/api/v1/expressions/:id";
pub const ENDPOINT_TASK: &str = "/internal/task";
pub const ENDPOINT_TASK_CANCEL: &str = "/internal/task/:id";

#[derive(Debug, Serialize, Deserialize)]
pub struct CalculateRequest {
    pub expression: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CalculateResponse {
    pub id: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExpressionsResponse {
    pub expressions: Vec<ExpressionView>,
}

/// A leased operation as sent to an agent. `operation` is the operator
/// symbol; agents reject symbols they do not know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskToProcess {
    pub id: u64,
    pub arg1: f64,
    pub arg2: f64,
    pub operation: String,
    pub operation_time_ms: u64,
}

impl From<TaskDescriptor> for TaskToProcess {
    fn from(descriptor: TaskDescriptor) -> Self {
        Self {
            id: descriptor.task_id,
            arg1: descriptor.arg1,
            arg2: descriptor.arg2,
            operation: descriptor.operator.symbol().to_string(),
            operation_time_ms: u64::try_from(descriptor.allotted_time.as_millis())
                .unwrap_or(u64::MAX),
        }
    }
}

/// Outcome of one task. A non-empty `error` means the computation failed;
/// otherwise `result` must be present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResultRequest {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskResultRequest {
    pub fn success(id: u64, result: f64) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: u64, error: impl Into<String>) -> Self {
        Self {
            id,
            result: None,
            error: Some(error.into()),
        }
    }

    /// The failure detail, if this report carries one.
    pub fn failure_detail(&self) -> Option<&str> {
        self.error.as_deref().filter(|detail| !detail.is_empty())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
