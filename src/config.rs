//! Command-line and environment configuration.
//!
//! Every option can be given as a flag or through the environment variable
//! named next to it; flags win.

use crate::agent::AgentSettings;
use crate::orchestrator::{OperationTimes, SchedulerSettings};

use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "calc-cluster")]
#[command(about = "Distributed arithmetic expression evaluator")]
pub struct Cli {
    /// Fallback log filter when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the orchestrator HTTP server
    Serve(ServeArgs),
    /// Run a computing agent against an orchestrator
    Agent(AgentArgs),
    /// Evaluate an expression locally and print the result
    Eval { expression: String },
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    #[arg(long, env = "ORCHESTRATOR_BIND", default_value = "0.0.0.0:8080")]
    pub bind: SocketAddr,

    /// Lease lifetime before an unreported task is reclaimed
    #[arg(long, env = "TASK_MAX_PROCESS_TIME_IN_MS", default_value_t = 60_000)]
    pub task_max_process_time_ms: u64,

    #[arg(long, env = "TIME_ADDITION_MS", default_value_t = 0)]
    pub time_addition_ms: u64,

    #[arg(long, env = "TIME_SUBTRACTION_MS", default_value_t = 0)]
    pub time_subtraction_ms: u64,

    #[arg(long, env = "TIME_MULTIPLICATIONS_MS", default_value_t = 0)]
    pub time_multiplications_ms: u64,

    #[arg(long, env = "TIME_DIVISIONS_MS", default_value_t = 0)]
    pub time_divisions_ms: u64,

    #[arg(long, default_value_t = 60)]
    pub housekeeping_interval_secs: u64,

    /// How long finished expressions stay queryable
    #[arg(long, default_value_t = 600)]
    pub expression_retention_secs: u64,
}

#[derive(Debug, Clone, Args)]
pub struct AgentArgs {
    #[arg(long, env = "ORCHESTRATOR_URL", default_value = "http://127.0.0.1:8080")]
    pub orchestrator_url: String,

    /// Number of concurrent workers
    #[arg(long, env = "COMPUTING_POWER", default_value_t = 4)]
    pub workers: usize,

    #[arg(long, default_value_t = 400)]
    pub poll_interval_ms: u64,
}

impl ServeArgs {
    pub fn housekeeping_interval(&self) -> Duration {
        Duration::from_secs(self.housekeeping_interval_secs.max(1))
    }

    pub fn expression_retention(&self) -> Duration {
        Duration::from_secs(self.expression_retention_secs)
    }
}

impl From<&ServeArgs> for SchedulerSettings {
    fn from(args: &ServeArgs) -> Self {
        Self {
            max_process_time: Duration::from_millis(args.task_max_process_time_ms),
            operation_times: OperationTimes {
                addition: Duration::from_millis(args.time_addition_ms),
                subtraction: Duration::from_millis(args.time_subtraction_ms),
                multiplication: Duration::from_millis(args.time_multiplications_ms),
                division: Duration::from_millis(args.time_divisions_ms),
            },
        }
    }
}

impl From<&AgentArgs> for AgentSettings {
    fn from(args: &AgentArgs) -> Self {
        Self {
            orchestrator_url: args.orchestrator_url.clone(),
            workers: args.workers,
            poll_interval: Duration::from_millis(args.poll_interval_ms),
        }
    }
}
