//! Pattern-based structural extraction.
//!
//! No parsing happens here: each language family has a handful of ordered
//! regexes, and whatever they match becomes the digest. A pattern that finds
//! nothing yields an empty list, never an error.

pub mod generic;
pub mod java;
pub mod python;
pub mod script;

use std::collections::HashSet;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::project::FileSummary;

/// Per-file ceiling above which deep extraction is skipped.
pub const MAX_FILE_SIZE: usize = 500 * 1024;

/// Cap on collected import declarations per file.
pub const MAX_IMPORTS: usize = 10;

/// Cap on extracted doc comments, in characters.
pub const MAX_DOC_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Python,
    Script,
    Java,
    Generic,
}

impl Language {
    pub fn from_extension(extension: &str) -> Self {
        match extension.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "py" => Self::Python,
            "js" | "ts" | "jsx" | "tsx" | "vue" | "svelte" | "mjs" | "cjs" => Self::Script,
            "java" => Self::Java,
            _ => Self::Generic,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Script => "script",
            Self::Java => "java",
            Self::Generic => "generic",
        }
    }
}

/// Symbols collected from one file's text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Symbols {
    pub classes: Vec<String>,
    pub functions: Vec<String>,
    pub methods: Vec<String>,
    pub imports: Vec<String>,
    pub interfaces: Vec<String>,
    pub components: Vec<String>,
    pub package: Option<String>,
    pub doc_comment: Option<String>,
    pub preview: Option<String>,
}

pub trait LanguageExtractor: Send + Sync {
    fn language(&self) -> Language;
    fn extract(&self, content: &str) -> Symbols;
}

/// Routes files to the extractor for their language family.
pub struct StructuralExtractor {
    extractors: Vec<Box<dyn LanguageExtractor>>,
    fallback: generic::GenericExtractor,
}

impl StructuralExtractor {
    pub fn new() -> Self {
        let extractors: Vec<Box<dyn LanguageExtractor>> = vec![
            Box::new(python::PythonExtractor),
            Box::new(script::ScriptExtractor),
            Box::new(java::JavaExtractor),
        ];

        Self {
            extractors,
            fallback: generic::GenericExtractor::default(),
        }
    }

    /// Builds the digest for `file_path` (relative, `/`-separated) from its
    /// full text. Oversized content gets metadata only.
    pub fn extract(&self, file_path: &str, content: &str) -> FileSummary {
        let ext = file_path
            .rsplit('/')
            .next()
            .and_then(|name| name.rfind('.').filter(|idx| *idx > 0).map(|idx| &name[idx..]))
            .unwrap_or("");
        let language = Language::from_extension(ext);

        if content.len() > MAX_FILE_SIZE {
            return FileSummary::oversized(file_path, language, content.len() as u64);
        }

        let mut summary = FileSummary::new(file_path, language);
        summary.line_count = line_count(content);

        let symbols = self
            .extractors
            .iter()
            .find(|e| e.language() == language)
            .map(|e| e.extract(content))
            .unwrap_or_else(|| self.fallback.extract(content));

        summary.classes = symbols.classes;
        summary.functions = symbols.functions;
        summary.methods = symbols.methods;
        summary.imports = symbols.imports;
        summary.interfaces = symbols.interfaces;
        summary.components = symbols.components;
        summary.package = symbols.package;
        summary.doc_comment = symbols.doc_comment;
        summary.preview = symbols.preview;
        summary
    }
}

impl Default for StructuralExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Newline count plus one.
pub fn line_count(content: &str) -> usize {
    content.bytes().filter(|b| *b == b'\n').count() + 1
}

/// First capture group of every match, deduplicated, in first-seen order.
pub(crate) fn capture_all(re: &Regex, content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    re.captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|name| !name.is_empty() && seen.insert(name.clone()))
        .collect()
}

pub(crate) fn capture_imports(re: &Regex, content: &str) -> Vec<String> {
    let mut imports = capture_all(re, content);
    imports.truncate(MAX_IMPORTS);
    imports
}

/// Merges `extra` into `base`, skipping names already present.
pub(crate) fn merge_unique(base: &mut Vec<String>, extra: Vec<String>) {
    for name in extra {
        if !base.contains(&name) {
            base.push(name);
        }
    }
}

/// First capture of `re`, trimmed and cut to [`MAX_DOC_CHARS`].
pub(crate) fn first_doc_comment(re: &Regex, content: &str) -> Option<String> {
    re.captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| {
            m.as_str()
                .lines()
                .map(|line| line.trim().trim_start_matches('*').trim())
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|doc| !doc.is_empty())
        .map(|doc| doc.chars().take(MAX_DOC_CHARS).collect())
}
