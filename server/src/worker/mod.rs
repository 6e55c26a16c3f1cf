//! Worker Pool (C8).

mod pool;
mod stage;

pub use pool::WorkerPool;
pub use stage::{PoolError, Stage, StageError};
