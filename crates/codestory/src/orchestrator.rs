//! Entry point for callers: accepts uploads, answers status queries and
//! owns the background machinery behind them.

use std::sync::{Arc, Mutex};

use log::{info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::archive::validate_upload;
use crate::config::Settings;
use crate::error::UploadError;
use crate::fragments::{FragmentStore, NoopFragmentStore};
use crate::llm::{OpenAiGenerator, TextGenerator};
use crate::pipeline::{Pipeline, PipelineConfig};
use crate::project::FileSummary;
use crate::task::{
    Clock, ExpirySweeper, StatusReport, SystemClock, Task, TaskEvent, TaskResult, TaskStore,
};
use crate::worker::{TaskHandle, TaskJob, TaskPool};

/// Returned synchronously for an accepted upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    pub task_id: String,
    pub file_list: Vec<String>,
}

pub struct TaskOrchestrator {
    store: Arc<TaskStore>,
    pool: TaskPool,
    sweeper: ExpirySweeper,
    sweeper_handle: Mutex<Option<JoinHandle<()>>>,
    max_upload_bytes: u64,
}

impl TaskOrchestrator {
    pub fn new(
        settings: &Settings,
        generator: Arc<dyn TextGenerator>,
        fragment_store: Arc<dyn FragmentStore>,
    ) -> Self {
        Self::with_clock(settings, generator, fragment_store, Arc::new(SystemClock))
    }

    /// Production wiring: OpenAI-compatible generator with the key taken
    /// from the environment and no fragment store.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings,
            Arc::new(OpenAiGenerator::from_env(&settings.llm)),
            Arc::new(NoopFragmentStore),
        )
    }

    pub fn with_clock(
        settings: &Settings,
        generator: Arc<dyn TextGenerator>,
        fragment_store: Arc<dyn FragmentStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let store = Arc::new(TaskStore::with_clock(settings.tasks.ttl(), clock));
        let pipeline = Arc::new(Pipeline::new(
            Arc::new(PipelineConfig::from_settings(settings)),
            generator,
            fragment_store,
        ));
        let pool = TaskPool::new(pipeline, Arc::clone(&store), settings.worker_count);
        let sweeper = ExpirySweeper::new(Arc::clone(&store), settings.tasks.sweep_interval());

        Self {
            store,
            pool,
            sweeper,
            sweeper_handle: Mutex::new(None),
            max_upload_bytes: settings.upload.max_upload_size_bytes(),
        }
    }

    /// Validates the archive, registers a task and schedules its pipeline.
    ///
    /// Returns before any pipeline work happens. Rejected uploads leave no
    /// task behind. Must be called from within a tokio runtime.
    pub fn submit(&self, bytes: Vec<u8>) -> Result<(UploadReceipt, TaskHandle), UploadError> {
        let file_list = validate_upload(&bytes, self.max_upload_bytes)?;
        let task_id = self.store.create(file_list.clone());

        let job = TaskJob::new(task_id.clone(), Arc::from(bytes));
        let handle = match self.pool.submit(job) {
            Ok(handle) => handle,
            Err(e) => {
                self.store.remove(&task_id);
                return Err(UploadError::Rejected(e));
            }
        };

        info!(
            "Accepted upload as task {} ({} entries)",
            task_id,
            file_list.len()
        );
        Ok((UploadReceipt { task_id, file_list }, handle))
    }

    /// Like [`submit`](Self::submit) for callers that only poll status.
    pub fn upload(&self, bytes: Vec<u8>) -> Result<UploadReceipt, UploadError> {
        self.submit(bytes).map(|(receipt, _)| receipt)
    }

    /// Never fails; unknown or expired ids yield `not_found`.
    pub fn status(&self, task_id: &str) -> StatusReport {
        self.store.status(task_id)
    }

    /// Tree, diagram and stats of a completed task.
    pub fn result(&self, task_id: &str) -> Option<TaskResult> {
        self.store.result(task_id)
    }

    /// Empty unless the task completed.
    pub fn file_summaries(&self, task_id: &str) -> Vec<FileSummary> {
        self.store.file_summaries(task_id)
    }

    pub fn task(&self, task_id: &str) -> Option<Task> {
        self.store.get(task_id)
    }

    pub fn remove(&self, task_id: &str) -> bool {
        self.store.remove(task_id)
    }

    pub fn evict_expired(&self) -> usize {
        self.store.evict_expired()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.store.subscribe()
    }

    pub fn store(&self) -> &Arc<TaskStore> {
        &self.store
    }

    /// Starts the periodic expiry sweep. Calling it twice is a no-op.
    pub fn start_sweeper(&self) {
        let mut slot = self
            .sweeper_handle
            .lock()
            .unwrap_or_else(|p| p.into_inner());
        if slot.is_none() {
            *slot = Some(self.sweeper.start());
        }
    }

    /// Stops accepting uploads, lets running pipelines finish and stops the
    /// sweeper.
    pub async fn shutdown(&self) {
        self.pool.shutdown();
        self.pool.wait().await;

        self.sweeper.stop();
        let handle = self
            .sweeper_handle
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!("Expiry sweeper ended abnormally: {}", e);
            }
        }
        info!("Task orchestrator stopped");
    }
}
