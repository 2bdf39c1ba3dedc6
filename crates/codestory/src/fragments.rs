//! Redacted text fragments handed to a similarity-search store.
//!
//! Only the producer side lives here. The store itself is a collaborator
//! behind [`FragmentStore`]; [`NoopFragmentStore`] discards everything.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chunker::chunk_text;
use crate::project::FileSummary;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FragmentMetadata {
    pub file_path: String,
    pub file_name: String,
    /// Extension without the leading dot.
    pub language: String,
    pub chunk_index: usize,
    pub classes: Vec<String>,
    pub functions: Vec<String>,
    pub methods: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub id: String,
    /// Sanitized text; never raw file content.
    pub text: String,
    pub metadata: FragmentMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredFragment {
    pub fragment: Fragment,
    /// Higher is more similar.
    pub score: f32,
}

#[derive(Error, Debug)]
pub enum FragmentStoreError {
    #[error("Fragment store unavailable: {0}")]
    Unavailable(String),

    #[error("Fragment store rejected the request: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait FragmentStore: Send + Sync {
    /// Stores the fragments, returning how many were accepted.
    async fn store(&self, fragments: Vec<Fragment>) -> Result<usize, FragmentStoreError>;

    /// Returns up to `limit` fragments ranked by similarity to `text`.
    async fn query(&self, text: &str, limit: usize)
        -> Result<Vec<ScoredFragment>, FragmentStoreError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopFragmentStore;

#[async_trait]
impl FragmentStore for NoopFragmentStore {
    async fn store(&self, fragments: Vec<Fragment>) -> Result<usize, FragmentStoreError> {
        log::debug!("Discarding {} fragments (no store configured)", fragments.len());
        Ok(0)
    }

    async fn query(
        &self,
        _text: &str,
        _limit: usize,
    ) -> Result<Vec<ScoredFragment>, FragmentStoreError> {
        Ok(Vec::new())
    }
}

/// `src/app.py`, 0 → `src_app.py#0`.
pub fn fragment_id(file_path: &str, index: usize) -> String {
    format!("{}#{}", file_path.replace(['/', '\\'], "_"), index)
}

/// Chunks every non-empty sanitized preview into fragments of at most
/// `chunk_chars` characters.
pub fn build_fragments(summaries: &[FileSummary], chunk_chars: usize) -> Vec<Fragment> {
    let mut fragments = Vec::new();

    for summary in summaries {
        if summary.sanitized_preview.is_empty() {
            continue;
        }

        let language = summary.extension.trim_start_matches('.').to_string();
        for (index, text) in chunk_text(&summary.sanitized_preview, chunk_chars)
            .into_iter()
            .enumerate()
        {
            fragments.push(Fragment {
                id: fragment_id(&summary.file_path, index),
                text,
                metadata: FragmentMetadata {
                    file_path: summary.file_path.clone(),
                    file_name: summary.file_name.clone(),
                    language: language.clone(),
                    chunk_index: index,
                    classes: summary.classes.clone(),
                    functions: summary.functions.clone(),
                    methods: summary.methods.clone(),
                },
            });
        }
    }

    fragments
}
