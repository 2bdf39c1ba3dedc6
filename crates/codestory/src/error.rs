use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodestoryError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Upload rejected: {0}")]
    Upload(#[from] UploadError),

    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] crate::pipeline::PipelineError),

    #[error("Text generation error: {0}")]
    Llm(#[from] crate::llm::LlmError),

    #[error("Failed to read '{path}': {source}")]
    ReadInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

/// Synchronous rejection of an upload. No task exists when one of these is returned.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Upload is {size} bytes, limit is {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    #[error("Upload is not a valid zip archive: {0}")]
    InvalidArchive(String),

    #[error("Task could not be scheduled: {0}")]
    Rejected(#[from] WorkerError),
}

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Failed to open archive: {0}")]
    Open(#[source] zip::result::ZipError),

    #[error("Failed to read archive entry {index}: {source}")]
    ReadEntry {
        index: usize,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Archive expands beyond {limit} bytes")]
    ExtractedTooLarge { limit: u64 },
}

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Project root '{0}' does not exist")]
    MissingRoot(PathBuf),

    #[error("Directory walk failed under '{path}': {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Worker pool is shutting down")]
    ShuttingDown,

    #[error("Worker pool closed before the task started")]
    PoolClosed,

    #[error("Task {0} panicked")]
    Panicked(String),
}

pub type Result<T> = std::result::Result<T, CodestoryError>;
