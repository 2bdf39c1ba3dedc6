pub mod model;
pub mod store;
pub mod sweeper;

pub use model::{
    ProjectStats, StatusKind, StatusReport, Task, TaskPhase, TaskResult, TaskStatus,
};
pub use store::{Clock, ManualClock, SystemClock, TaskEvent, TaskStore};
pub use sweeper::ExpirySweeper;
