use std::sync::Arc;

use crate::project::FileSummary;
use crate::task::{TaskPhase, TaskResult, TaskStore};

/// Events emitted by the pipeline while it works on one task.
pub enum ProgressEvent {
    Phase {
        phase: TaskPhase,
        message: String,
    },
    Completed {
        result: TaskResult,
        summaries: Vec<FileSummary>,
    },
    Failed {
        error: String,
    },
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// No-op reporter for unit tests.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Writes pipeline events into the task registry.
pub struct StoreProgress {
    store: Arc<TaskStore>,
    task_id: String,
}

impl StoreProgress {
    pub fn new(store: Arc<TaskStore>, task_id: impl Into<String>) -> Self {
        Self {
            store,
            task_id: task_id.into(),
        }
    }
}

impl ProgressReporter for StoreProgress {
    fn report(&self, event: ProgressEvent) {
        let applied = match event {
            ProgressEvent::Phase { phase, message } => {
                self.store.advance(&self.task_id, phase, &message)
            }
            ProgressEvent::Completed { result, summaries } => {
                self.store.complete(&self.task_id, result, summaries)
            }
            ProgressEvent::Failed { error } => self.store.fail(&self.task_id, &error),
        };
        if !applied {
            log::debug!(
                "Ignored progress event for task {} (expired or already finished)",
                self.task_id
            );
        }
    }
}
