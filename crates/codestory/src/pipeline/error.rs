use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Project is empty or contains no parseable source files")]
    EmptyProject,

    #[error("Archive extraction failed: {0}")]
    Archive(#[from] crate::error::ArchiveError),

    #[error("Project scan failed: {0}")]
    Scan(#[from] crate::error::ScanError),

    #[error("Background work failed: {0}")]
    Join(String),

    #[error("Pipeline stage {stage} ran without its input")]
    MissingInput { stage: &'static str },
}

/// Recovered problems. The task still completes, using local defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineWarning {
    SummaryFallback { files: usize, error: String },
    DiagramFallback { error: String },
    FragmentStoreFailed { error: String },
}
