use std::fs;
use std::path::Path;

use log::{debug, warn};
use walkdir::WalkDir;

use crate::classify::{classify, should_skip_path};
use crate::error::ScanError;
use crate::extract::{Language, StructuralExtractor, MAX_FILE_SIZE};
use crate::sanitize::{self, SanitizationEngine};

use super::summary::FileSummary;
use super::tree::relative_path;

/// Walks an unpacked project and digests every kept file.
pub struct ProjectScanner {
    extractor: StructuralExtractor,
    max_file_size: u64,
}

impl ProjectScanner {
    pub fn new() -> Self {
        Self::with_max_file_size(MAX_FILE_SIZE as u64)
    }

    pub fn with_max_file_size(max_file_size: u64) -> Self {
        Self {
            extractor: StructuralExtractor::new(),
            max_file_size,
        }
    }

    /// Summaries for every classified file below `root`, in lexicographic
    /// walk order. Dotfiles are included here; only the tree hides them.
    pub fn scan_files(&self, root: &Path) -> Result<Vec<FileSummary>, ScanError> {
        if !root.is_dir() {
            return Err(ScanError::MissingRoot(root.to_path_buf()));
        }

        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !should_skip_path(entry.path().strip_prefix(root).unwrap_or(entry.path()))
            });

        let mut summaries = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    return Err(ScanError::Walk {
                        path: root.to_path_buf(),
                        source: e,
                    })
                }
                Err(e) => {
                    warn!("Skipping unreadable entry during scan: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let rel = relative_path(root, entry.path());
            if classify(Path::new(&rel)).is_none() {
                continue;
            }

            if let Some(summary) = self.summarize_file(entry.path(), &rel) {
                summaries.push(summary);
            }
        }

        debug!("Scanned {} files", summaries.len());
        Ok(summaries)
    }

    fn summarize_file(&self, path: &Path, rel: &str) -> Option<FileSummary> {
        let size = match fs::metadata(path) {
            Ok(meta) => meta.len(),
            Err(e) => {
                warn!("Cannot stat {}: {}", sanitize::redact_path(path), e);
                return None;
            }
        };

        if size > self.max_file_size {
            let language = Language::from_extension(&crate::classify::extension_of(path));
            return Some(FileSummary::oversized(rel, language, size));
        }

        match fs::read(path) {
            Ok(bytes) => Some(self.extractor.extract(rel, &String::from_utf8_lossy(&bytes))),
            Err(e) => {
                warn!("Cannot read {}: {}", sanitize::redact_path(path), e);
                None
            }
        }
    }
}

impl Default for ProjectScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads the file behind `summary` again and returns its scrubbed text cut
/// to `max_chars`. Oversized and unreadable files give an empty preview.
pub fn sanitized_preview(
    root: &Path,
    summary: &FileSummary,
    engine: &SanitizationEngine,
    max_chars: usize,
) -> String {
    if summary.is_large {
        return String::new();
    }

    let path = root.join(&summary.file_path);
    match fs::read(&path) {
        Ok(bytes) => {
            let text = String::from_utf8_lossy(&bytes);
            engine
                .sanitize(Path::new(&summary.file_path), &text)
                .chars()
                .take(max_chars)
                .collect()
        }
        Err(e) => {
            warn!(
                "Cannot read {} for preview: {}",
                sanitize::redact_path(&path),
                e
            );
            String::new()
        }
    }
}
