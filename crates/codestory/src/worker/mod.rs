pub mod job;
pub mod pool;

pub use job::{TaskHandle, TaskJob, TaskOutcome};
pub use pool::TaskPool;
