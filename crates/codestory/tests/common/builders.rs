//! Builders for archives and for collaborators the pipeline talks to.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::{Cursor, Write};
use std::sync::Mutex;

use async_trait::async_trait;
use zip::write::SimpleFileOptions;

use codestory::fragments::{Fragment, FragmentStore, FragmentStoreError, ScoredFragment};
use codestory::llm::{LlmError, TextGenerator};

/// Builds an in-memory zip archive.
pub struct ZipBuilder {
    entries: Vec<(String, Vec<u8>)>,
}

impl ZipBuilder {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add a text file.
    pub fn file(self, name: &str, content: &str) -> Self {
        self.bytes(name, content.as_bytes())
    }

    /// Add a file with arbitrary content.
    pub fn bytes(mut self, name: &str, content: &[u8]) -> Self {
        self.entries.push((name.to_string(), content.to_vec()));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in &self.entries {
            writer
                .start_file(name.as_str(), SimpleFileOptions::default())
                .expect("Failed to start zip entry");
            writer
                .write_all(content)
                .expect("Failed to write zip entry");
        }
        writer
            .finish()
            .expect("Failed to finish zip")
            .into_inner()
    }
}

/// One prompt the generator received.
#[derive(Debug, Clone)]
pub struct RecordedPrompt {
    pub system: String,
    pub user: String,
}

/// Replies from a fixed queue; once drained every call fails with
/// `NotConfigured`.
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    prompts: Mutex<Vec<RecordedPrompt>>,
}

impl ScriptedGenerator {
    pub fn new(replies: Vec<Result<String, LlmError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// A generator that fails every call.
    pub fn failing() -> Self {
        Self::new(Vec::new())
    }

    pub fn prompts(&self) -> Vec<RecordedPrompt> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, system: &str, user: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(RecordedPrompt {
            system: system.to_string(),
            user: user.to_string(),
        });
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(LlmError::NotConfigured))
    }
}

/// Keeps every fragment it is given.
#[derive(Default)]
pub struct RecordingStore {
    fragments: Mutex<Vec<Fragment>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fragments(&self) -> Vec<Fragment> {
        self.fragments.lock().unwrap().clone()
    }
}

#[async_trait]
impl FragmentStore for RecordingStore {
    async fn store(&self, fragments: Vec<Fragment>) -> Result<usize, FragmentStoreError> {
        let count = fragments.len();
        self.fragments.lock().unwrap().extend(fragments);
        Ok(count)
    }

    async fn query(
        &self,
        text: &str,
        limit: usize,
    ) -> Result<Vec<ScoredFragment>, FragmentStoreError> {
        let fragments = self.fragments.lock().unwrap();
        Ok(fragments
            .iter()
            .filter(|f| f.text.contains(text))
            .take(limit)
            .map(|f| ScoredFragment {
                fragment: f.clone(),
                score: 1.0,
            })
            .collect())
    }
}
