//! Orchestrator Module
//!
//! Coordinates distributed evaluation of arithmetic expressions. Clients
//! submit expressions; agents pull single binary operations, compute them,
//! and report back until every tree collapses to a number.
//!
//! ## Architecture Overview
//! The orchestrator follows a **Pull-based** model with **Lease** management:
//! 1. **Submission**: an expression is parsed into an operator tree and stored.
//! 2. **Leasing**: a worker asks for work; the oldest expression with a ready
//!    node (both children numbers) hands it out as a `Task`.
//! 3. **Watchdog**: if no report arrives within the maximum processing time,
//!    the lease is canceled and the node becomes ready again (at-least-once).
//! 4. **Reporting**: a result splices the value into the tree; a failure marks
//!    the whole expression failed.
//!
//! ## Submodules
//! - **`scheduler`**: stores, lease issuing, watchdogs and report routing.
//! - **`housekeeping`**: periodic eviction of retired tasks and old expressions.
//! - **`handlers`**: the axum HTTP surface.
//! - **`protocol`**: endpoint paths and DTOs.
//! - **`types`**: settings, descriptors, views and errors.

pub mod handlers;
pub mod housekeeping;
pub mod protocol;
pub mod scheduler;
pub mod types;

pub use housekeeping::{Housekeeper, SweepReport};
pub use scheduler::Scheduler;
pub use types::{
    ExpressionView, OperationTimes, SchedulerError, SchedulerSettings, TaskDescriptor,
};
