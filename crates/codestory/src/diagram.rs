//! Mermaid architecture diagrams.

use crate::project::FileSummary;

const HEADER: &str = "graph TD";

/// Removes a Markdown code fence around generated Mermaid source.
pub fn strip_fences(text: &str) -> String {
    let mut cleaned = text.trim();

    if cleaned.starts_with("```") {
        cleaned = match cleaned.split_once('\n') {
            Some((_, rest)) => rest,
            None => "",
        };
    }
    if let Some(body) = cleaned.trim_end().strip_suffix("```") {
        cleaned = body;
    }

    cleaned.trim().to_string()
}

/// Deterministic diagram used when the generator is unavailable: one node
/// per top-level folder in first-seen order, each linked to the next.
pub fn fallback_diagram(summaries: &[FileSummary]) -> String {
    let mut folders: Vec<&str> = Vec::new();
    for summary in summaries {
        if let Some((folder, _)) = summary.file_path.split_once('/') {
            if !folders.contains(&folder) {
                folders.push(folder);
            }
        }
    }

    let mut lines = vec![HEADER.to_string()];
    for (index, folder) in folders.iter().enumerate() {
        lines.push(format!("    F{}[\"{}\"]", index, escape_label(folder)));
    }
    for index in 1..folders.len() {
        lines.push(format!("    F{} --> F{}", index - 1, index));
    }

    lines.join("\n")
}

/// True when `text` looks like a Mermaid flowchart.
pub fn is_flowchart(text: &str) -> bool {
    let head = text.trim_start();
    head.starts_with("graph") || head.starts_with("flowchart")
}

fn escape_label(label: &str) -> String {
    label.replace('"', "#quot;")
}
