use serde::{Deserialize, Serialize};

use crate::extract::Language;

/// Structural digest of one source file.
///
/// Symbol lists are always present (possibly empty) so consumers never have
/// to tell "missing" apart from "none found". Order is first occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSummary {
    /// Path relative to the project root, `/`-separated.
    pub file_path: String,
    pub file_name: String,
    /// Extension including the leading dot, empty when there is none.
    pub extension: String,
    pub language: Language,
    pub line_count: usize,
    pub is_large: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub classes: Vec<String>,
    pub functions: Vec<String>,
    pub methods: Vec<String>,
    pub imports: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_comment: Option<String>,
    /// First lines of the file, only set by the generic fallback extractor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    pub sanitized_preview: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_summary: Option<String>,
}

impl FileSummary {
    /// Empty digest carrying only path-derived metadata.
    pub fn new(file_path: impl Into<String>, language: Language) -> Self {
        let file_path = file_path.into();
        let file_name = file_path
            .rsplit('/')
            .next()
            .unwrap_or(file_path.as_str())
            .to_string();
        let extension = match file_name.rfind('.') {
            Some(idx) if idx > 0 => file_name[idx..].to_ascii_lowercase(),
            _ => String::new(),
        };

        Self {
            file_path,
            file_name,
            extension,
            language,
            line_count: 0,
            is_large: false,
            note: None,
            classes: Vec::new(),
            functions: Vec::new(),
            methods: Vec::new(),
            imports: Vec::new(),
            interfaces: Vec::new(),
            components: Vec::new(),
            package: None,
            doc_comment: None,
            preview: None,
            sanitized_preview: String::new(),
            ai_summary: None,
        }
    }

    /// Metadata-only digest for a file above the size ceiling.
    pub fn oversized(file_path: impl Into<String>, language: Language, size_bytes: u64) -> Self {
        let mut summary = Self::new(file_path, language);
        summary.is_large = true;
        summary.note = Some(large_file_note(size_bytes));
        summary
    }
}

pub fn large_file_note(size_bytes: u64) -> String {
    format!("File too large ({}KB), metadata only", size_bytes / 1024)
}
