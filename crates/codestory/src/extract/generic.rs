use super::{Language, LanguageExtractor, Symbols};

pub const DEFAULT_PREVIEW_LINES: usize = 10;

/// Fallback for languages without a dedicated extractor: keeps the first
/// lines as a preview and reports no symbols.
pub struct GenericExtractor {
    preview_lines: usize,
}

impl GenericExtractor {
    pub fn new(preview_lines: usize) -> Self {
        Self { preview_lines }
    }
}

impl Default for GenericExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_PREVIEW_LINES)
    }
}

impl LanguageExtractor for GenericExtractor {
    fn language(&self) -> Language {
        Language::Generic
    }

    fn extract(&self, content: &str) -> Symbols {
        let preview = content
            .lines()
            .take(self.preview_lines)
            .collect::<Vec<_>>()
            .join("\n");

        Symbols {
            preview: Some(preview),
            ..Symbols::default()
        }
    }
}
