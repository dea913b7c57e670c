//! Computing Agent Module
//!
//! The worker side of the cluster. An agent runs a fixed pool of workers,
//! each pulling one operation at a time from the orchestrator over HTTP.
//! A worker that dies mid-task needs no cleanup: the orchestrator's lease
//! watchdog re-offers the node.

pub mod worker;

pub use worker::{Agent, AgentSettings, compute};

#[cfg(test)]
mod tests;
