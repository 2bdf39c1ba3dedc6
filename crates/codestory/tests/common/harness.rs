//! Test harness for isolated orchestrator runs.
//!
//! Each `TestHarness` owns a temp directory used as the work directory, so
//! tests can check that nothing is left behind after a task ends.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use codestory::config::Settings;
use codestory::fragments::{FragmentStore, NoopFragmentStore};
use codestory::llm::{DisabledGenerator, TextGenerator};
use codestory::task::{Clock, SystemClock};
use codestory::TaskOrchestrator;

pub struct TestHarness {
    temp_dir: TempDir,
    /// Parent of the per-task extraction directories.
    pub work_dir: PathBuf,
    pub config_dir: PathBuf,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let work_dir = temp_dir.path().join("work");
        let config_dir = temp_dir.path().join("config");

        std::fs::create_dir_all(&work_dir).expect("Failed to create work dir");
        std::fs::create_dir_all(&config_dir).expect("Failed to create config dir");

        Self {
            temp_dir,
            work_dir,
            config_dir,
        }
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Defaults pointed at this harness's work directory.
    pub fn settings(&self) -> Settings {
        let mut settings = Settings::default();
        settings.work_directory = self.work_dir.clone();
        settings.worker_count = 2;
        settings
    }

    pub fn write_config(&self, filename: &str, settings: &Settings) -> PathBuf {
        let path = self.config_dir.join(filename);
        let json = serde_json::to_string_pretty(settings).expect("Failed to serialize settings");
        std::fs::write(&path, json).expect("Failed to write config file");
        path
    }

    /// Orchestrator with no text generator and no fragment store.
    pub fn orchestrator(&self) -> TaskOrchestrator {
        self.orchestrator_with(Arc::new(DisabledGenerator), Arc::new(NoopFragmentStore))
    }

    pub fn orchestrator_with(
        &self,
        generator: Arc<dyn TextGenerator>,
        fragment_store: Arc<dyn FragmentStore>,
    ) -> TaskOrchestrator {
        self.orchestrator_with_clock(generator, fragment_store, Arc::new(SystemClock))
    }

    pub fn orchestrator_with_clock(
        &self,
        generator: Arc<dyn TextGenerator>,
        fragment_store: Arc<dyn FragmentStore>,
        clock: Arc<dyn Clock>,
    ) -> TaskOrchestrator {
        TaskOrchestrator::with_clock(&self.settings(), generator, fragment_store, clock)
    }

    /// Extraction directories still present under the work directory.
    pub fn leftover_work_dirs(&self) -> Vec<PathBuf> {
        std::fs::read_dir(&self.work_dir)
            .expect("Failed to read work dir")
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("codestory_"))
            })
            .collect()
    }
}
