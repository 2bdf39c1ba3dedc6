use std::path::PathBuf;

use crate::chunker::DEFAULT_CHUNK_CHARS;
use crate::config::Settings;
use crate::extract::MAX_FILE_SIZE;

pub struct PipelineConfig {
    /// Parent of the per-task extraction directories.
    pub work_directory: PathBuf,
    pub max_extracted_bytes: u64,
    pub max_file_size: u64,
    pub preview_chars: usize,
    pub prompt_preview_chars: usize,
    pub max_files_to_summarize: usize,
    pub max_diagram_files: usize,
    pub chunk_chars: usize,
    pub store_fragments: bool,
}

impl PipelineConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            work_directory: settings.work_directory.clone(),
            max_extracted_bytes: settings.upload.max_extracted_size_bytes(),
            max_file_size: MAX_FILE_SIZE as u64,
            preview_chars: settings.enrichment.preview_chars,
            prompt_preview_chars: settings.enrichment.prompt_preview_chars,
            max_files_to_summarize: settings.enrichment.max_files_to_summarize,
            max_diagram_files: settings.enrichment.max_diagram_files,
            chunk_chars: DEFAULT_CHUNK_CHARS,
            store_fragments: settings.enrichment.store_fragments,
        }
    }
}
