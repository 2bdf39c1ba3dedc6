pub mod archive;
pub mod chunker;
pub mod classify;
pub mod config;
pub mod diagram;
pub mod error;
pub mod extract;
pub mod fragments;
pub mod llm;
pub mod orchestrator;
pub mod pipeline;
pub mod project;
pub mod sanitize;
pub mod task;
pub mod telemetry;
pub mod worker;

pub use config::{load_config, load_config_from_str, validate_config, Settings};
pub use error::{
    ArchiveError, CodestoryError, ConfigError, Result, ScanError, UploadError, WorkerError,
};
pub use fragments::{Fragment, FragmentStore, NoopFragmentStore, ScoredFragment};
pub use llm::{repair_json, JsonRepairError, LlmError, OpenAiGenerator, TextGenerator};
pub use orchestrator::{TaskOrchestrator, UploadReceipt};
pub use pipeline::{Pipeline, PipelineConfig, PipelineContext, PipelineError};
pub use project::{FileSummary, ProjectScanner, TreeNode};
pub use sanitize::SanitizationEngine;
pub use task::{StatusKind, StatusReport, Task, TaskResult, TaskStatus, TaskStore};
pub use worker::{TaskHandle, TaskOutcome, TaskPool};
