mod error;
mod health;
mod tasks;

pub use error::ApiError;
pub use health::ping;
pub use tasks::{create_tasks, tasks_status, TasksState};
