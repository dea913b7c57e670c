//! In-Memory Storage Module
//!
//! Concurrent keyed registries backing the orchestrator. Two independent
//! instances exist at runtime: one for live expressions, one for task leases.
//!
//! ## Core Concepts
//! - **Sharded locking**: `MemoryStore` wraps a `DashMap`, so readers and
//!   writers of different keys rarely contend.
//! - **Shared handles**: values are `Arc`-wrapped; a lookup never pins a shard lock.
//! - **Snapshots**: `all()` copies handles out, so callers may take other
//!   locks while walking the result.

pub mod memory;

pub use memory::MemoryStore;
