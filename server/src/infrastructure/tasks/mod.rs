//! Background execution: the single-worker task engine and the cron
//! scheduler that feeds it

pub mod scheduler;
pub mod task_manager;

pub use scheduler::{validate_cron, Scheduler};
pub use task_manager::{TaskFn, TaskManager, TaskProgress};
