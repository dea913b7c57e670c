//! Agent Worker Pool
//!
//! Spawns workers that poll the orchestrator for leased operations, compute
//! them, and post the outcome back.
//!
//! ## Responsibilities
//! - **Polling**: `GET /internal/task` until an operation is handed out.
//! - **Computing**: simulating the operation's latency, then applying it locally.
//! - **Reporting**: posting results with retries, tolerating stale-report answers.

use crate::calculator::Operator;
use crate::orchestrator::protocol::{ENDPOINT_TASK, TaskResultRequest, TaskToProcess};

use anyhow::Result;
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const REPORT_ATTEMPTS: usize = 3;

#[derive(Debug, Clone)]
pub struct AgentSettings {
    /// Base URL of the orchestrator, e.g. `http://127.0.0.1:8080`.
    pub orchestrator_url: String,
    pub workers: usize,
    /// Pause between polls while the orchestrator has nothing to hand out.
    pub poll_interval: Duration,
}

pub struct Agent {
    http_client: reqwest::Client,
    base_url: String,
    worker_count: usize,
    poll_interval: Duration,
}

impl Agent {
    pub fn new(settings: AgentSettings) -> Arc<Self> {
        Arc::new(Self {
            http_client: reqwest::Client::new(),
            base_url: settings.orchestrator_url.trim_end_matches('/').to_string(),
            worker_count: settings.workers.max(1),
            poll_interval: settings.poll_interval,
        })
    }

    /// Spawns the workers and returns their handles.
    /// Each worker runs until its handle is aborted.
    pub fn start(self: &Arc<Self>) -> Vec<JoinHandle<()>> {
        tracing::info!(
            "Starting {} agent workers against {}",
            self.worker_count,
            self.base_url
        );

        (0..self.worker_count)
            .map(|worker_id| {
                let agent = Arc::clone(self);
                tokio::spawn(async move {
                    agent.worker_loop(worker_id).await;
                })
            })
            .collect()
    }

    async fn worker_loop(&self, worker_id: usize) {
        tracing::info!("Worker {} started", worker_id);

        loop {
            match self.fetch_task().await {
                Ok(Some(task)) => self.process_task(worker_id, task).await,
                Ok(None) => {
                    tokio::time::sleep(self.poll_interval).await;
                }
                Err(e) => {
                    tracing::debug!("Worker {} could not fetch a task: {}", worker_id, e);
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }

    /// Asks the orchestrator for one operation. `None` means nothing is ready.
    pub async fn fetch_task(&self) -> Result<Option<TaskToProcess>> {
        let response = self
            .http_client
            .get(format!("{}{}", self.base_url, ENDPOINT_TASK))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            status => Err(anyhow::anyhow!("Task fetch failed: {}", status)),
        }
    }

    async fn process_task(&self, worker_id: usize, task: TaskToProcess) {
        tracing::info!(
            "Worker {} computing task {}: {} {} {}",
            worker_id,
            task.id,
            task.arg1,
            task.operation,
            task.arg2
        );

        let report = match compute(&task).await {
            Ok(value) => TaskResultRequest::success(task.id, value),
            Err(e) => {
                tracing::warn!("Worker {} failed task {}: {}", worker_id, task.id, e);
                TaskResultRequest::failure(task.id, e.to_string())
            }
        };

        if let Err(e) = self.send_result(&report).await {
            // the lease watchdog will hand the node to someone else
            tracing::error!("Failed to report task {}: {}", task.id, e);
        }
    }

    /// Posts a report. Stale-report answers (404, 409) are logged and accepted.
    pub async fn send_result(&self, report: &TaskResultRequest) -> Result<()> {
        let response = self
            .post_with_retry(
                format!("{}{}", self.base_url, ENDPOINT_TASK),
                report,
                REQUEST_TIMEOUT,
                REPORT_ATTEMPTS,
            )
            .await?;

        match response.status() {
            status if status.is_success() => {
                tracing::debug!("Task {} reported", report.id);
                Ok(())
            }
            StatusCode::NOT_FOUND | StatusCode::CONFLICT => {
                tracing::warn!(
                    "Report for task {} was stale ({})",
                    report.id,
                    response.status()
                );
                Ok(())
            }
            status => Err(anyhow::anyhow!("Task report failed: {}", status)),
        }
    }

    async fn post_with_retry<T: serde::Serialize>(
        &self,
        url: String,
        payload: &T,
        timeout: Duration,
        attempts: usize,
    ) -> Result<reqwest::Response> {
        let mut delay_ms = 150u64;

        for attempt in 0..attempts {
            let response = self
                .http_client
                .post(url.clone())
                .json(payload)
                .timeout(timeout)
                .send()
                .await;

            match response {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    if attempt + 1 == attempts {
                        return Err(anyhow::anyhow!(e));
                    }
                    let jitter = rand::random::<u64>() % 50;
                    tokio::time::sleep(Duration::from_millis(delay_ms + jitter)).await;
                    delay_ms = (delay_ms * 2).min(1200);
                }
            }
        }

        Err(anyhow::anyhow!("Retry attempts exhausted"))
    }
}

/// Waits out the simulated latency, then applies the operation.
pub async fn compute(task: &TaskToProcess) -> Result<f64> {
    tokio::time::sleep(Duration::from_millis(task.operation_time_ms)).await;

    let operator = Operator::from_symbol(&task.operation)
        .ok_or_else(|| anyhow::anyhow!("unsupported operation '{}'", task.operation))?;

    Ok(operator.apply(task.arg1, task.arg2)?)
}
