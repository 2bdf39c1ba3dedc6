//! Prompt templates for file summaries and architecture diagrams.

use std::collections::HashMap;

use serde_json::Value;

use crate::project::FileSummary;

pub const SUMMARY_SYSTEM_PROMPT: &str = r#"You are a senior software engineer reviewing an unfamiliar codebase.
For each file you are given, write a single sentence describing its responsibility.
Secrets in the excerpts have already been replaced with ***REDACTED***; never guess them."#;

pub const SUMMARY_USER_PROMPT: &str = r#"Summarize each of the following files in one sentence.

{files}

Answer with a JSON object mapping each file path exactly as given to its summary, for example:
{"src/app.py": "Creates the web application and registers its routes."}"#;

pub const DIAGRAM_SYSTEM_PROMPT: &str = r#"You are a software architect. You draw concise Mermaid flowcharts of how the parts of a project depend on each other.
Output only Mermaid source starting with "graph TD". Use short alphanumeric node ids and put file or module names in node labels."#;

pub const DIAGRAM_USER_PROMPT: &str = r#"Draw the architecture of this project as a Mermaid "graph TD" diagram.
Group files into components where it helps readability and connect components by their imports.

Project files:
{files}"#;

pub struct PromptBuilder;

impl PromptBuilder {
    /// One block per file: path, language, declared symbols and a preview
    /// cut to `preview_chars` characters.
    pub fn build_summary_prompt(files: &[&FileSummary], preview_chars: usize) -> String {
        let blocks: Vec<String> = files
            .iter()
            .map(|file| {
                let mut block = format!("### {} ({})", file.file_path, file.language.as_str());
                let mut symbols = Vec::new();
                push_list(&mut symbols, "classes", &file.classes);
                push_list(&mut symbols, "functions", &first(&file.functions, 10));
                push_list(&mut symbols, "methods", &first(&file.methods, 10));
                if !symbols.is_empty() {
                    block.push('\n');
                    block.push_str(&symbols.join("; "));
                }
                let preview: String = file.sanitized_preview.chars().take(preview_chars).collect();
                block.push_str(&format!("\n```\n{}\n```", preview));
                block
            })
            .collect();

        SUMMARY_USER_PROMPT.replace("{files}", &blocks.join("\n\n"))
    }

    /// One line per file listing its declared symbols and imports.
    pub fn build_diagram_prompt(files: &[FileSummary], max_files: usize) -> String {
        let lines: Vec<String> = files
            .iter()
            .take(max_files)
            .map(|file| {
                let mut parts = vec![format!("- {}", file.file_path)];
                push_list(&mut parts, "classes", &file.classes);
                push_list(&mut parts, "interfaces", &file.interfaces);
                push_list(&mut parts, "functions", &first(&file.functions, 5));
                push_list(&mut parts, "methods", &first(&file.methods, 5));
                push_list(&mut parts, "components", &file.components);
                push_list(&mut parts, "imports", &first(&file.imports, 5));
                if let Some(summary) = &file.ai_summary {
                    parts.push(format!("summary: {}", summary));
                }
                parts.join("; ")
            })
            .collect();

        DIAGRAM_USER_PROMPT.replace("{files}", &lines.join("\n"))
    }
}

fn first(items: &[String], n: usize) -> Vec<String> {
    items.iter().take(n).cloned().collect()
}

fn push_list(parts: &mut Vec<String>, label: &str, items: &[String]) {
    if !items.is_empty() {
        parts.push(format!("{}: {}", label, items.join(", ")));
    }
}

/// Reads path to summary pairs from a repaired generator answer.
///
/// Accepts the requested `{"path": "summary"}` object and the
/// `{"items": [{"path": .., "summary": ..}]}` shape produced when the
/// generator answered with an array.
pub fn parse_summaries(value: &Value) -> HashMap<String, String> {
    let mut out = HashMap::new();
    let Some(object) = value.as_object() else {
        return out;
    };

    if let Some(Value::Array(items)) = object.get(super::repair::ITEMS_KEY) {
        for item in items {
            let path = item
                .get("path")
                .or_else(|| item.get("file"))
                .and_then(Value::as_str);
            let summary = item.get("summary").and_then(Value::as_str);
            if let (Some(path), Some(summary)) = (path, summary) {
                insert_summary(&mut out, path, summary);
            }
        }
        return out;
    }

    for (path, summary) in object {
        if let Some(summary) = summary.as_str() {
            insert_summary(&mut out, path, summary);
        }
    }
    out
}

fn insert_summary(out: &mut HashMap<String, String>, path: &str, summary: &str) {
    let summary = summary.trim();
    if !summary.is_empty() {
        out.insert(path.trim().to_string(), summary.to_string());
    }
}
