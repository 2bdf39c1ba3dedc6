use std::sync::LazyLock;

use regex::Regex;

use super::{
    capture_all, capture_imports, first_doc_comment, merge_unique, Language, LanguageExtractor,
    Symbols,
};

static RE_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:export\s+)?(?:default\s+)?class\s+(\w+)").unwrap());
static RE_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:export\s+)?(?:async\s+)?\bfunction(?:\s*\*\s*|\s+)(\w+)").unwrap()
});
static RE_ARROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:export\s+)?(?:const|let|var)\s+(\w+)\s*=\s*(?:async\s+)?\(").unwrap()
});
static RE_METHOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]+(?:static\s+)?(?:async\s+)?(\w+)\s*\([^)\n]*\)\s*\{").unwrap()
});
static RE_IMPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"import\s+.*?from\s+['"](.+?)['"]"#).unwrap());
static RE_REQUIRE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"require\(\s*['"](.+?)['"]\s*\)"#).unwrap());
static RE_COMPONENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:export\s+default\s+)?\bfunction\s+([A-Z]\w+)").unwrap());
static RE_DOC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)/\*\*(.*?)\*/").unwrap());

/// Control-flow keywords that look like calls followed by a block.
const NOT_METHODS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "function", "return", "with", "else",
];

/// JavaScript, TypeScript and single-file component sources.
pub struct ScriptExtractor;

impl LanguageExtractor for ScriptExtractor {
    fn language(&self) -> Language {
        Language::Script
    }

    fn extract(&self, content: &str) -> Symbols {
        let mut functions = capture_all(&RE_FUNCTION, content);
        merge_unique(&mut functions, capture_all(&RE_ARROW, content));

        let methods = capture_all(&RE_METHOD, content)
            .into_iter()
            .filter(|name| !NOT_METHODS.contains(&name.as_str()) && !functions.contains(name))
            .collect();

        let mut imports = capture_imports(&RE_IMPORT, content);
        if imports.len() < super::MAX_IMPORTS {
            merge_unique(&mut imports, capture_all(&RE_REQUIRE, content));
            imports.truncate(super::MAX_IMPORTS);
        }

        Symbols {
            classes: capture_all(&RE_CLASS, content),
            functions,
            methods,
            imports,
            components: capture_all(&RE_COMPONENT, content),
            doc_comment: first_doc_comment(&RE_DOC, content),
            ..Symbols::default()
        }
    }
}
