use super::scheduler::Scheduler;

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Counts from one cleanup pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub tasks_removed: usize,
    pub expressions_removed: usize,
}

/// Periodically evicts retired tasks and long-finished expressions so the
/// stores do not grow without bound.
pub struct Housekeeper {
    scheduler: Arc<Scheduler>,
    interval: Duration,
    /// How long a terminal expression stays queryable.
    retention: Duration,
}

impl Housekeeper {
    pub fn new(scheduler: Arc<Scheduler>, interval: Duration, retention: Duration) -> Self {
        Self {
            scheduler,
            interval,
            retention,
        }
    }

    /// Runs `sweep` on every tick until the returned handle is aborted.
    pub fn start(self) -> JoinHandle<()> {
        tracing::info!(
            "Housekeeping every {:?}, keeping finished expressions for {:?}",
            self.interval,
            self.retention
        );

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            // first tick completes immediately
            interval.tick().await;

            loop {
                interval.tick().await;
                self.sweep();
            }
        })
    }

    pub fn sweep(&self) -> SweepReport {
        let report = SweepReport {
            tasks_removed: self.scheduler.purge_retired_tasks(),
            expressions_removed: self.scheduler.purge_finished_expressions(self.retention),
        };

        if report.tasks_removed > 0 || report.expressions_removed > 0 {
            tracing::info!(
                "Housekeeping removed {} tasks and {} expressions ({} tasks, {} expressions left)",
                report.tasks_removed,
                report.expressions_removed,
                self.scheduler.task_count(),
                self.scheduler.expression_count()
            );
        } else {
            tracing::trace!("Housekeeping found nothing to remove");
        }

        report
    }
}
