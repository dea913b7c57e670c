//! Expression Engine Module
//!
//! Decomposes arithmetic expressions into a tree of binary operations and
//! hands those operations out one at a time as leases.
//!
//! ## Pipeline
//! 1. **Tokenizing**: raw text is scanned and validated (`tokenizer`).
//! 2. **Building**: tokens are reordered to postfix and folded into an
//!    arena-backed operator tree (`tree`).
//! 3. **Leasing**: the aggregate (`expression`) finds the next ready node and
//!    wraps it in a `Task` (`task`), whose completion splices the value back.
//!
//! ## Submodules
//! - **`errors`**: parse, compute and lifecycle error types.
//! - **`tokenizer`**: token stream production and validation.
//! - **`tree`**: node model, shunting-yard, readiness search, local evaluation.
//! - **`expression`**: the aggregate and its status.
//! - **`task`**: the lease state machine.

pub mod errors;
pub mod expression;
pub mod task;
pub mod tokenizer;
pub mod tree;

pub use errors::{CalcError, ComputeError, ParseError, TaskError};
pub use expression::{Expression, ExpressionStatus};
pub use task::{Task, TaskState};
pub use tree::{ExpressionTree, Operator, evaluate};
