//! Backends implementing the executor contract.

pub mod memory;
pub mod models;
pub mod pg_executor;

pub use memory::{MemoryExecutor, MemoryStore};
pub use pg_executor::PgExecutor;
