use std::sync::Arc;

use crate::archive::WorkDir;
use crate::project::{FileSummary, TreeNode};

use super::error::PipelineWarning;

pub struct PipelineContext {
    // Input
    pub task_id: String,
    pub archive: Arc<[u8]>,

    // Unpack result; dropping it removes the directory
    pub work_dir: Option<WorkDir>,

    // Scan result, guaranteed Some after step_scan
    pub tree: Option<TreeNode>,

    // Extract result, previews filled in by step_sanitize and summaries by step_enrich
    pub summaries: Vec<FileSummary>,

    // Diagram result, guaranteed Some after step_diagram
    pub diagram: Option<String>,

    // Non-fatal warnings
    pub warnings: Vec<PipelineWarning>,
}

impl PipelineContext {
    pub fn new(task_id: impl Into<String>, archive: Arc<[u8]>) -> Self {
        Self {
            task_id: task_id.into(),
            archive,
            work_dir: None,
            tree: None,
            summaries: Vec::new(),
            diagram: None,
            warnings: Vec::new(),
        }
    }
}
