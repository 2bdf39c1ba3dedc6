use std::sync::LazyLock;

use regex::Regex;

use super::{capture_all, capture_imports, first_doc_comment, Language, LanguageExtractor, Symbols};

static RE_CLASS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bclass\s+(\w+)").unwrap());
static RE_INTERFACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\binterface\s+(\w+)").unwrap());
static RE_METHOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:public|private|protected)(?:\s+(?:static|final|abstract|synchronized|native|default))*\s+[\w<>\[\]]+\s+(\w+)\s*\(",
    )
    .unwrap()
});
static RE_IMPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bimport\s+(?:static\s+)?([\w.*]+)\s*;").unwrap());
static RE_PACKAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bpackage\s+([\w.]+)\s*;").unwrap());
static RE_DOC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)/\*\*(.*?)\*/").unwrap());

/// Everything callable in Java lives in a type, so declarations land in
/// `methods` and `functions` stays empty.
pub struct JavaExtractor;

impl LanguageExtractor for JavaExtractor {
    fn language(&self) -> Language {
        Language::Java
    }

    fn extract(&self, content: &str) -> Symbols {
        Symbols {
            classes: capture_all(&RE_CLASS, content),
            interfaces: capture_all(&RE_INTERFACE, content),
            methods: capture_all(&RE_METHOD, content),
            imports: capture_imports(&RE_IMPORT, content),
            package: RE_PACKAGE
                .captures(content)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string()),
            doc_comment: first_doc_comment(&RE_DOC, content),
            ..Symbols::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"package com.example.orders;

import java.util.List;
import java.util.Map;
import static org.junit.Assert.*;

/**
 * Order service.
 */
public class OrderService implements Repository {
    private final Map<String, Order> cache;

    public OrderService() {
        this.cache = null;
    }

    public List<Order> findAll() {
        return List.of();
    }

    private static void log(String msg) {}

    protected synchronized int count(String key) {
        return 0;
    }
}

interface Repository {}
"#;

    #[test]
    fn test_types_and_package() {
        let symbols = JavaExtractor.extract(SOURCE);
        assert_eq!(symbols.classes, vec!["OrderService"]);
        assert_eq!(symbols.interfaces, vec!["Repository"]);
        assert_eq!(symbols.package.as_deref(), Some("com.example.orders"));
        assert!(symbols.functions.is_empty());
    }

    #[test]
    fn test_methods_skip_constructors_and_fields() {
        let symbols = JavaExtractor.extract(SOURCE);
        assert_eq!(symbols.methods, vec!["findAll", "log", "count"]);
    }

    #[test]
    fn test_imports_include_static() {
        let symbols = JavaExtractor.extract(SOURCE);
        assert_eq!(
            symbols.imports,
            vec!["java.util.List", "java.util.Map", "org.junit.Assert.*"]
        );
    }

    #[test]
    fn test_doc_comment() {
        let symbols = JavaExtractor.extract(SOURCE);
        assert_eq!(symbols.doc_comment.as_deref(), Some("Order service."));
    }
}
