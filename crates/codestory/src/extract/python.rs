use std::sync::LazyLock;

use regex::Regex;

use super::{capture_all, capture_imports, Language, LanguageExtractor, Symbols, MAX_DOC_CHARS};

static RE_CLASS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^class\s+(\w+)").unwrap());
static RE_FUNCTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(?:async\s+)?def\s+(\w+)").unwrap());
static RE_METHOD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]+(?:async\s+)?def\s+(\w+)").unwrap());
static RE_IMPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(?:from\s+\S+\s+)?import\s+(.+)$").unwrap());
static RE_DOCSTRING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"(?s)"""(.*?)""""#).unwrap());

/// Top-level `def` is a function, indented `def` is a method.
pub struct PythonExtractor;

impl LanguageExtractor for PythonExtractor {
    fn language(&self) -> Language {
        Language::Python
    }

    fn extract(&self, content: &str) -> Symbols {
        let doc_comment = RE_DOCSTRING
            .captures(content)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().chars().take(MAX_DOC_CHARS).collect::<String>())
            .filter(|doc| !doc.is_empty());

        Symbols {
            classes: capture_all(&RE_CLASS, content),
            functions: capture_all(&RE_FUNCTION, content),
            methods: capture_all(&RE_METHOD, content),
            imports: capture_imports(&RE_IMPORT, content),
            doc_comment,
            ..Symbols::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#""""User management service."""
import os
from typing import List, Optional
from .models import User

class UserService:
    def __init__(self, repo):
        self.repo = repo

    async def fetch(self, user_id):
        return await self.repo.get(user_id)

class _Cache:
    pass

def build_service():
    return UserService(None)

async def warm_up():
    pass
"#;

    #[test]
    fn test_classes_and_functions() {
        let symbols = PythonExtractor.extract(SOURCE);
        assert_eq!(symbols.classes, vec!["UserService", "_Cache"]);
        assert_eq!(symbols.functions, vec!["build_service", "warm_up"]);
        assert_eq!(symbols.methods, vec!["__init__", "fetch"]);
    }

    #[test]
    fn test_imports_keep_declaration_text() {
        let symbols = PythonExtractor.extract(SOURCE);
        assert_eq!(symbols.imports, vec!["os", "List, Optional", "User"]);
    }

    #[test]
    fn test_docstring_is_first_block() {
        let symbols = PythonExtractor.extract(SOURCE);
        assert_eq!(
            symbols.doc_comment.as_deref(),
            Some("User management service.")
        );
    }

    #[test]
    fn test_imports_capped_at_ten() {
        let source: String = (0..15).map(|i| format!("import mod{i}\n")).collect();
        let symbols = PythonExtractor.extract(&source);
        assert_eq!(symbols.imports.len(), 10);
        assert_eq!(symbols.imports[0], "mod0");
        assert_eq!(symbols.imports[9], "mod9");
    }

    #[test]
    fn test_long_docstring_truncated() {
        let source = format!("\"\"\"{}\"\"\"\n", "x".repeat(500));
        let symbols = PythonExtractor.extract(&source);
        assert_eq!(symbols.doc_comment.unwrap().len(), MAX_DOC_CHARS);
    }

    #[test]
    fn test_empty_source() {
        assert_eq!(PythonExtractor.extract(""), Symbols::default());
    }
}
