//! Distributed Calculator Library
//!
//! This library crate defines the core modules of the expression evaluation
//! cluster. It serves as the foundation for the binary executable (`main.rs`).
//!
//! ## Architecture Modules
//!
//! - **`calculator`**: Tokenizing, parsing and the operator tree. An expression is
//!   reduced one binary operation at a time through leased `Task`s.
//! - **`orchestrator`**: The scheduler that hands out ready operations, reclaims
//!   expired leases with watchdog timers, and serves the HTTP API.
//! - **`agent`**: The worker pool that pulls operations over HTTP and computes them.
//! - **`storage`**: Concurrent in-memory registries for expressions and tasks.
//! - **`config`**: Command-line and environment settings.

pub mod agent;
pub mod calculator;
pub mod config;
pub mod orchestrator;
pub mod storage;
