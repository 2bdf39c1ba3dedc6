//! Path filtering and file-kind classification.
//!
//! Everything here is a pure function of the path string: nothing touches the
//! filesystem, so the same rules apply to archive entry names, walk results
//! and tree nodes alike.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Directory names that are never descended into (build output, dependency
/// caches, VCS metadata, IDE state). Matched against whole path segments.
pub const SKIP_DIRECTORIES: &[&str] = &[
    "node_modules",
    ".git",
    "__pycache__",
    ".venv",
    "venv",
    "dist",
    "build",
    ".next",
    ".nuxt",
    "target",
    "bin",
    "obj",
    ".idea",
    ".vscode",
    ".DS_Store",
    "vendor",
    "packages",
];

/// File-name suffixes that are never scanned (minified assets, compiled
/// artifacts, lock files, images, fonts). Matched against the lower-cased name.
pub const SKIP_FILE_SUFFIXES: &[&str] = &[
    ".min.js", ".min.css", ".map", ".lock", ".sum", ".png", ".jpg", ".jpeg", ".gif", ".svg",
    ".ico", ".woff", ".woff2", ".ttf", ".eot", ".pyc", ".pyo", ".class", ".o", ".so", ".dll",
];

pub const CODE_EXTENSIONS: &[&str] = &[
    "py", "js", "ts", "jsx", "tsx", "java", "go", "rb", "php", "cs", "cpp", "c", "h", "vue",
    "svelte", "rs", "kt", "swift",
];

/// Config, documentation, markup and style files: summarised, never deep-parsed.
pub const CONFIG_EXTENSIONS: &[&str] = &[
    "json", "yml", "yaml", "toml", "ini", "cfg", "xml", "html", "css", "scss", "less", "md",
    "txt", "rst",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Code,
    Config,
}

/// Lower-cased extension without the leading dot; empty when there is none.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Returns true when any segment is a blocked directory or the file name ends
/// with a blocked suffix.
pub fn should_skip_path(path: &Path) -> bool {
    let blocked_segment = path.components().any(|component| {
        component
            .as_os_str()
            .to_str()
            .is_some_and(|segment| SKIP_DIRECTORIES.contains(&segment))
    });
    if blocked_segment {
        return true;
    }

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.to_lowercase())
        .unwrap_or_default();
    SKIP_FILE_SUFFIXES
        .iter()
        .any(|suffix| file_name.ends_with(suffix))
}

/// Classifies by extension. `None` means the file is neither code nor config
/// and is left out of scanning.
pub fn classify(path: &Path) -> Option<FileKind> {
    let ext = extension_of(path);
    if ext.is_empty() {
        return None;
    }
    if CODE_EXTENSIONS.contains(&ext.as_str()) {
        Some(FileKind::Code)
    } else if CONFIG_EXTENSIONS.contains(&ext.as_str()) {
        Some(FileKind::Config)
    } else {
        None
    }
}

pub fn is_code_file(path: &Path) -> bool {
    classify(path) == Some(FileKind::Code)
}

pub fn is_config_file(path: &Path) -> bool {
    classify(path) == Some(FileKind::Config)
}

/// Static, type-based description shown on tree file nodes and used as the
/// fallback summary when the text generator is unavailable.
pub fn describe_file(path: &Path) -> &'static str {
    match extension_of(path).as_str() {
        "py" => "Python source - backend logic",
        "js" => "JavaScript source - frontend interaction",
        "ts" => "TypeScript source - typed frontend logic",
        "jsx" => "React component - interface module",
        "tsx" => "React TypeScript component - typed interface module",
        "java" => "Java source - backend service",
        "go" => "Go source - high-performance backend",
        "css" => "Stylesheet - how the pages look",
        "scss" => "Sass stylesheet - advanced page styling",
        "html" => "Page template - the skeleton of a page",
        "json" | "yml" | "yaml" => "Configuration file - the system's instruction sheet",
        "md" => "Documentation - the project's user manual",
        "sql" => "Database script - rules for the records room",
        "vue" => "Vue component - interface module",
        "svelte" => "Svelte component - lightweight interface module",
        _ => "File",
    }
}
