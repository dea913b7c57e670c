//! Agent Module Tests
//!
//! ## Test Scopes
//! - **Compute**: local evaluation of leased operations and its failure modes.
//! - **Cluster**: an orchestrator served on an ephemeral port driven by a live agent.

#[cfg(test)]
mod tests {
    use crate::agent::worker::{Agent, AgentSettings, compute};
    use crate::calculator::ExpressionStatus;
    use crate::orchestrator::handlers::router;
    use crate::orchestrator::protocol::{TaskResultRequest, TaskToProcess};
    use crate::orchestrator::scheduler::Scheduler;
    use crate::orchestrator::types::{OperationTimes, SchedulerSettings};

    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::time::Duration;

    fn task(operation: &str, arg1: f64, arg2: f64) -> TaskToProcess {
        TaskToProcess {
            id: 1,
            arg1,
            arg2,
            operation: operation.to_string(),
            operation_time_ms: 0,
        }
    }

    async fn serve(scheduler: Arc<Scheduler>) -> (SocketAddr, tokio::task::JoinHandle<()>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(scheduler);

        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (addr, server)
    }

    fn agent_for(addr: SocketAddr, workers: usize) -> Arc<Agent> {
        Agent::new(AgentSettings {
            orchestrator_url: format!("http://{}", addr),
            workers,
            poll_interval: Duration::from_millis(10),
        })
    }

    // ============================================================
    // TEST 1: Compute
    // ============================================================

    #[tokio::test]
    async fn test_compute_applies_each_operator() {
        assert_eq!(compute(&task("+", 2.0, 3.0)).await.unwrap(), 5.0);
        assert_eq!(compute(&task("-", 2.0, 3.0)).await.unwrap(), -1.0);
        assert_eq!(compute(&task("*", 2.0, 3.0)).await.unwrap(), 6.0);
        assert_eq!(compute(&task("/", 3.0, 2.0)).await.unwrap(), 1.5);
    }

    #[tokio::test]
    async fn test_compute_division_by_zero_fails() {
        let result = compute(&task("/", 1.0, 0.0)).await;

        assert!(result.unwrap_err().to_string().contains("division by zero"));
    }

    #[tokio::test]
    async fn test_compute_unknown_operation_fails() {
        let result = compute(&task("^", 2.0, 3.0)).await;

        assert!(result.unwrap_err().to_string().contains("unsupported operation"));
    }

    #[tokio::test]
    async fn test_compute_overflow_fails() {
        let result = compute(&task("*", 1e300, 1e300)).await;

        assert!(result.unwrap_err().to_string().contains("not a finite number"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_compute_waits_for_operation_time() {
        // ARRANGE
        let mut slow = task("+", 1.0, 1.0);
        slow.operation_time_ms = 3_000;
        let started = tokio::time::Instant::now();

        // ACT
        let value = compute(&slow).await.unwrap();

        // ASSERT
        assert_eq!(value, 2.0);
        assert!(started.elapsed() >= Duration::from_millis(3_000));
    }

    // ============================================================
    // TEST 2: Cluster Round Trips
    // ============================================================

    #[tokio::test]
    async fn test_fetch_task_over_http() {
        // ARRANGE
        let scheduler = Scheduler::new(SchedulerSettings {
            max_process_time: Duration::from_secs(60),
            operation_times: OperationTimes {
                multiplication: Duration::from_millis(25),
                ..OperationTimes::default()
            },
        });
        let (addr, server) = serve(Arc::clone(&scheduler)).await;
        let agent = agent_for(addr, 1);

        // ACT & ASSERT: nothing to do yet
        assert_eq!(agent.fetch_task().await.unwrap(), None);

        scheduler.create_expression("3*4").unwrap();
        let leased = agent.fetch_task().await.unwrap().unwrap();

        assert_eq!(leased.operation, "*");
        assert_eq!((leased.arg1, leased.arg2), (3.0, 4.0));
        assert_eq!(leased.operation_time_ms, 25);

        // ACT: report, then report again
        agent
            .send_result(&TaskResultRequest::success(leased.id, 12.0))
            .await
            .unwrap();
        let duplicate = agent
            .send_result(&TaskResultRequest::success(leased.id, 12.0))
            .await;

        // ASSERT: the stale duplicate is tolerated client-side
        assert!(duplicate.is_ok());
        assert_eq!(scheduler.expression_status(1).unwrap().result, Some(12.0));

        server.abort();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_agent_evaluates_expressions_end_to_end() {
        // ARRANGE
        let scheduler = Scheduler::new(SchedulerSettings::default());
        let (addr, server) = serve(Arc::clone(&scheduler)).await;

        let nested = scheduler.create_expression("(2+3)*(7-1)/4").unwrap();
        let failing = scheduler.create_expression("5+1/(2-2)").unwrap();

        // ACT
        let workers = agent_for(addr, 3).start();

        let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
        while !(scheduler.expression(nested).unwrap().is_terminal()
            && scheduler.expression(failing).unwrap().is_terminal())
        {
            assert!(
                tokio::time::Instant::now() < deadline,
                "expressions did not finish in time"
            );
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        // ASSERT
        let nested = scheduler.expression_status(nested).unwrap();
        assert_eq!(nested.status, ExpressionStatus::Succeeded);
        assert_eq!(nested.result, Some(7.5));

        let failing = scheduler.expression_status(failing).unwrap();
        assert_eq!(failing.status, ExpressionStatus::Failed);
        assert_eq!(failing.result, None);

        for worker in workers {
            worker.abort();
        }
        server.abort();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_overflowing_expression_fails_after_one_lease() {
        // ARRANGE: short leases, so a stuck node would be re-leased quickly
        let scheduler = Scheduler::new(SchedulerSettings {
            max_process_time: Duration::from_millis(300),
            operation_times: OperationTimes::default(),
        });
        let (addr, server) = serve(Arc::clone(&scheduler)).await;

        let large = format!("1{}", "0".repeat(300));
        let id = scheduler
            .create_expression(&format!("{}*{}*1", large, large))
            .unwrap();

        // ACT
        let workers = agent_for(addr, 2).start();

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while !scheduler.expression(id).unwrap().is_terminal() {
            assert!(
                tokio::time::Instant::now() < deadline,
                "overflowing expression never finished"
            );
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        tokio::time::sleep(Duration::from_millis(500)).await;

        // ASSERT: failed on the first product, never re-leased
        let view = scheduler.expression_status(id).unwrap();
        assert_eq!(view.status, ExpressionStatus::Failed);
        assert_eq!(view.result, None);
        assert_eq!(scheduler.task_count(), 1);

        for worker in workers {
            worker.abort();
        }
        server.abort();
    }
}
