use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, error, info, warn};
use tokio::sync::{oneshot, Semaphore};
use tokio::task::JoinHandle;

use crate::error::WorkerError;
use crate::pipeline::{Pipeline, PipelineContext, StoreProgress};
use crate::task::TaskStore;
use crate::worker::job::{TaskHandle, TaskJob, TaskOutcome};

const PANIC_MESSAGE: &str = "Internal error while processing the project";

/// Runs pipelines as tokio tasks, at most `worker_count` at a time.
pub struct TaskPool {
    pipeline: Arc<Pipeline>,
    store: Arc<TaskStore>,
    permits: Arc<Semaphore>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    shutdown: AtomicBool,
    worker_count: usize,
}

impl TaskPool {
    /// A `worker_count` of 0 is treated as 1.
    pub fn new(pipeline: Arc<Pipeline>, store: Arc<TaskStore>, worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        info!("Task pool accepts {} concurrent pipelines", worker_count);

        Self {
            pipeline,
            store,
            permits: Arc::new(Semaphore::new(worker_count)),
            handles: Mutex::new(Vec::new()),
            shutdown: AtomicBool::new(false),
            worker_count,
        }
    }

    /// Schedules `job` and returns immediately. Must be called from within
    /// a tokio runtime.
    pub fn submit(&self, job: TaskJob) -> Result<TaskHandle, WorkerError> {
        if self.shutdown.load(Ordering::Acquire) {
            return Err(WorkerError::ShuttingDown);
        }

        let (sender, receiver) = oneshot::channel();
        let handle = TaskHandle::new(job.task_id.clone(), receiver);

        let pipeline = Arc::clone(&self.pipeline);
        let store = Arc::clone(&self.store);
        let permits = Arc::clone(&self.permits);

        let join = tokio::spawn(async move {
            let outcome = supervise(pipeline, store, permits, job).await;
            if sender.send(outcome).is_err() {
                debug!("Task handle dropped before completion");
            }
        });

        let mut handles = self.lock_handles();
        handles.retain(|h| !h.is_finished());
        handles.push(join);

        Ok(handle)
    }

    /// Stops accepting jobs. Jobs already submitted, queued or running,
    /// still run to a terminal state; `wait` drains them.
    pub fn shutdown(&self) {
        info!("Shutting down task pool...");
        self.shutdown.store(true, Ordering::Release);
    }

    /// Waits for every submitted job to reach a terminal state.
    pub async fn wait(&self) {
        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.lock_handles());

        for (i, handle) in handles.into_iter().enumerate() {
            if let Err(e) = handle.await {
                error!("Task supervisor {} failed: {}", i, e);
            }
        }

        info!("All tasks have stopped");
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Pipelines currently holding a slot.
    pub fn running(&self) -> usize {
        self.worker_count
            .saturating_sub(self.permits.available_permits())
    }

    fn lock_handles(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        match self.handles.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Task pool handle list lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

/// Waits for a slot, runs the pipeline in its own task and turns a panic
/// into a failed task instead of a record stuck in `processing`.
async fn supervise(
    pipeline: Arc<Pipeline>,
    store: Arc<TaskStore>,
    permits: Arc<Semaphore>,
    job: TaskJob,
) -> TaskOutcome {
    let _permit = match permits.acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => {
            // The semaphore is never closed, so this only guards the API.
            let error = WorkerError::PoolClosed.to_string();
            store.fail(&job.task_id, &error);
            return TaskOutcome::failure(&job, error);
        }
    };

    debug!("Task {} acquired a pipeline slot", job.task_id);

    let run_store = Arc::clone(&store);
    let run_job = job.clone();
    let run = tokio::spawn(async move {
        let progress = StoreProgress::new(run_store, run_job.task_id.clone());
        let ctx = PipelineContext::new(run_job.task_id.clone(), Arc::clone(&run_job.archive));
        match pipeline.run(ctx, &progress).await {
            Ok(output) => TaskOutcome::success(&run_job, output.warnings.len()),
            Err(e) => TaskOutcome::failure(&run_job, e.to_string()),
        }
    });

    match run.await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Task {} pipeline panicked: {}", job.task_id, e);
            store.fail(&job.task_id, PANIC_MESSAGE);
            TaskOutcome::failure(&job, WorkerError::Panicked(job.task_id.clone()).to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragments::NoopFragmentStore;
    use crate::llm::DisabledGenerator;
    use crate::pipeline::PipelineConfig;
    use crate::task::TaskStatus;
    use std::io::{Cursor, Write};
    use std::path::Path;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn create_test_pool(work_dir: &Path, worker_count: usize) -> (TaskPool, Arc<TaskStore>) {
        let config = Arc::new(PipelineConfig {
            work_directory: work_dir.to_path_buf(),
            max_extracted_bytes: 10 * 1024 * 1024,
            max_file_size: 500 * 1024,
            preview_chars: 3000,
            prompt_preview_chars: 1500,
            max_files_to_summarize: 20,
            max_diagram_files: 30,
            chunk_chars: 2000,
            store_fragments: false,
        });
        let pipeline = Arc::new(Pipeline::new(
            config,
            Arc::new(DisabledGenerator),
            Arc::new(NoopFragmentStore),
        ));
        let store = Arc::new(TaskStore::new(chrono::Duration::hours(24)));
        (
            TaskPool::new(pipeline, Arc::clone(&store), worker_count),
            store,
        )
    }

    fn python_zip() -> Arc<[u8]> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("main.py", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"def main():\n    pass\n").unwrap();
        writer.finish().unwrap().into_inner().into()
    }

    #[tokio::test]
    async fn test_task_pool_creation() {
        let temp_dir = TempDir::new().unwrap();
        let (pool, _store) = create_test_pool(temp_dir.path(), 0);

        assert_eq!(pool.worker_count(), 1);
        assert!(!pool.is_shutdown());

        pool.shutdown();
        assert!(pool.is_shutdown());

        pool.wait().await;
    }

    #[tokio::test]
    async fn test_submit_and_complete() {
        let temp_dir = TempDir::new().unwrap();
        let (pool, store) = create_test_pool(temp_dir.path(), 2);

        let id = store.create(vec!["main.py".to_string()]);
        let handle = pool.submit(TaskJob::new(id.clone(), python_zip())).unwrap();
        assert_eq!(handle.task_id(), id);

        let outcome = handle.wait().await.unwrap();
        assert!(outcome.success, "task failed: {:?}", outcome.error);

        let task = store.get(&id).unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.progress, 100);

        pool.shutdown();
        pool.wait().await;
    }

    #[tokio::test]
    async fn test_many_jobs_with_one_slot() {
        let temp_dir = TempDir::new().unwrap();
        let (pool, store) = create_test_pool(temp_dir.path(), 1);

        let handles: Vec<TaskHandle> = (0..4)
            .map(|_| {
                let id = store.create(vec![]);
                pool.submit(TaskJob::new(id, python_zip())).unwrap()
            })
            .collect();

        for handle in handles {
            assert!(handle.wait().await.unwrap().success);
        }
        assert_eq!(pool.running(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_drains_queued_jobs() {
        let temp_dir = TempDir::new().unwrap();
        let (pool, store) = create_test_pool(temp_dir.path(), 1);

        let ids: Vec<String> = (0..3)
            .map(|_| {
                let id = store.create(vec!["main.py".to_string()]);
                pool.submit(TaskJob::new(id.clone(), python_zip())).unwrap();
                id
            })
            .collect();

        pool.shutdown();
        pool.wait().await;

        for id in &ids {
            let task = store.get(id).unwrap();
            assert_eq!(task.status, TaskStatus::Completed, "{}: {}", id, task.message);
            assert_eq!(task.progress, 100);
        }
        assert_eq!(pool.running(), 0);
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let (pool, store) = create_test_pool(temp_dir.path(), 1);
        pool.shutdown();

        let id = store.create(vec![]);
        let err = pool.submit(TaskJob::new(id, python_zip())).unwrap_err();
        assert!(matches!(err, WorkerError::ShuttingDown));
    }

    #[tokio::test]
    async fn test_failed_pipeline_reports_failure() {
        let temp_dir = TempDir::new().unwrap();
        let (pool, store) = create_test_pool(temp_dir.path(), 1);

        let id = store.create(vec![]);
        let outcome = pool
            .submit(TaskJob::new(id.clone(), Arc::from(&b"not a zip"[..])))
            .unwrap()
            .wait()
            .await
            .unwrap();

        assert!(!outcome.success);
        assert_eq!(store.get(&id).unwrap().status, TaskStatus::Failed);
    }
}
