use std::sync::Arc;

use tokio::sync::oneshot;

use crate::error::WorkerError;

/// An accepted upload waiting for a pipeline slot.
#[derive(Debug, Clone)]
pub struct TaskJob {
    pub task_id: String,
    pub archive: Arc<[u8]>,
}

impl TaskJob {
    pub fn new(task_id: impl Into<String>, archive: Arc<[u8]>) -> Self {
        Self {
            task_id: task_id.into(),
            archive,
        }
    }
}

/// How a job ended. The task registry holds the full record; this is the
/// summary delivered to whoever awaits the [`TaskHandle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    pub task_id: String,
    pub success: bool,
    pub error: Option<String>,
    pub warnings: usize,
}

impl TaskOutcome {
    pub fn success(job: &TaskJob, warnings: usize) -> Self {
        Self {
            task_id: job.task_id.clone(),
            success: true,
            error: None,
            warnings,
        }
    }

    pub fn failure(job: &TaskJob, error: impl Into<String>) -> Self {
        Self {
            task_id: job.task_id.clone(),
            success: false,
            error: Some(error.into()),
            warnings: 0,
        }
    }
}

/// Completion handle for one submitted job. Dropping it does not cancel
/// anything.
#[derive(Debug)]
pub struct TaskHandle {
    task_id: String,
    receiver: oneshot::Receiver<TaskOutcome>,
}

impl TaskHandle {
    pub(crate) fn new(task_id: String, receiver: oneshot::Receiver<TaskOutcome>) -> Self {
        Self { task_id, receiver }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Waits for the job to reach a terminal state.
    pub async fn wait(self) -> Result<TaskOutcome, WorkerError> {
        self.receiver
            .await
            .map_err(|_| WorkerError::Panicked(self.task_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> TaskJob {
        TaskJob::new("t1", Arc::from(&b"zip"[..]))
    }

    #[test]
    fn test_outcome_constructors() {
        let ok = TaskOutcome::success(&job(), 2);
        assert!(ok.success);
        assert_eq!(ok.warnings, 2);
        assert!(ok.error.is_none());

        let failed = TaskOutcome::failure(&job(), "boom");
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn test_handle_receives_outcome() {
        let (tx, rx) = oneshot::channel();
        let handle = TaskHandle::new("t1".to_string(), rx);
        tx.send(TaskOutcome::success(&job(), 0)).unwrap();

        let outcome = handle.wait().await.unwrap();
        assert_eq!(outcome.task_id, "t1");
    }

    #[tokio::test]
    async fn test_dropped_sender_is_reported() {
        let (tx, rx) = oneshot::channel::<TaskOutcome>();
        let handle = TaskHandle::new("t2".to_string(), rx);
        drop(tx);

        let err = handle.wait().await.unwrap_err();
        assert!(matches!(err, WorkerError::Panicked(id) if id == "t2"));
    }
}
