//! Recovery of JSON from free-form generator output.
//!
//! Generators are asked for JSON but regularly wrap it in Markdown fences or
//! explanatory prose. [`repair_json`] tries a fixed sequence of strategies
//! and returns the first value that parses.

use serde_json::Value;
use thiserror::Error;

/// Characters of the input kept in [`JsonRepairError::preview`].
pub const PREVIEW_CHARS: usize = 200;

/// Key under which a recovered top-level array is wrapped.
pub const ITEMS_KEY: &str = "items";

const FENCE: &str = "```";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairStrategy {
    Direct,
    StripFences,
    ObjectSlice,
    ArraySlice,
}

impl RepairStrategy {
    pub const ALL: [RepairStrategy; 4] = [
        RepairStrategy::Direct,
        RepairStrategy::StripFences,
        RepairStrategy::ObjectSlice,
        RepairStrategy::ArraySlice,
    ];

    fn apply(self, trimmed: &str) -> Option<Value> {
        match self {
            RepairStrategy::Direct => try_direct(trimmed),
            RepairStrategy::StripFences => try_strip_fences(trimmed),
            RepairStrategy::ObjectSlice => try_object_slice(trimmed),
            RepairStrategy::ArraySlice => try_array_slice(trimmed),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Could not recover JSON from {length} characters of generated text: {preview:?}")]
pub struct JsonRepairError {
    /// First [`PREVIEW_CHARS`] characters of the original text.
    pub preview: String,
    /// Length in characters of the trimmed input.
    pub length: usize,
    pub strategies: Vec<RepairStrategy>,
}

/// Returns the first successful parse of `text`, trying in order: the
/// trimmed text as-is, the text with code fences removed, the span from the
/// first `{` to the last `}`, and the span from the first `[` to the last
/// `]` wrapped as `{"items": [...]}`.
pub fn repair_json(text: &str) -> Result<Value, JsonRepairError> {
    let trimmed = text.trim();

    for strategy in RepairStrategy::ALL {
        if let Some(value) = strategy.apply(trimmed) {
            if strategy != RepairStrategy::Direct {
                log::debug!("Recovered generator JSON with {:?}", strategy);
            }
            return Ok(value);
        }
    }

    Err(JsonRepairError {
        preview: text.chars().take(PREVIEW_CHARS).collect(),
        length: trimmed.chars().count(),
        strategies: RepairStrategy::ALL.to_vec(),
    })
}

pub fn try_direct(trimmed: &str) -> Option<Value> {
    serde_json::from_str(trimmed).ok()
}

/// Drops a leading fence line (```` ``` ```` or ```` ```json ````) and a
/// trailing fence line if present.
pub fn try_strip_fences(trimmed: &str) -> Option<Value> {
    if !trimmed.starts_with(FENCE) {
        return None;
    }

    let mut lines: Vec<&str> = trimmed.lines().collect();
    if lines.first().is_some_and(|l| l.trim_start().starts_with(FENCE)) {
        lines.remove(0);
    }
    if lines.last().is_some_and(|l| l.trim_start().starts_with(FENCE)) {
        lines.pop();
    }

    serde_json::from_str(lines.join("\n").trim()).ok()
}

pub fn try_object_slice(trimmed: &str) -> Option<Value> {
    slice_between(trimmed, '{', '}').and_then(|s| serde_json::from_str(s).ok())
}

pub fn try_array_slice(trimmed: &str) -> Option<Value> {
    let slice = slice_between(trimmed, '[', ']')?;
    match serde_json::from_str::<Value>(slice).ok()? {
        Value::Array(items) => {
            let mut object = serde_json::Map::new();
            object.insert(ITEMS_KEY.to_string(), Value::Array(items));
            Some(Value::Object(object))
        }
        _ => None,
    }
}

fn slice_between(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_json() {
        assert_eq!(repair_json("  {\"a\": 1}\n").unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_fenced_json() {
        let text = "```json\n{\"a\":1}\n```";
        assert_eq!(repair_json(text).unwrap(), json!({"a": 1}));
        assert_eq!(try_strip_fences(text), Some(json!({"a": 1})));
    }

    #[test]
    fn test_fence_without_closing_line() {
        let text = "```\n{\"a\": [1, 2]}";
        assert_eq!(repair_json(text).unwrap(), json!({"a": [1, 2]}));
    }

    #[test]
    fn test_object_inside_prose() {
        let text = "Sure! Here is the summary: {\"app.py\": \"Entry point\"} Hope it helps.";
        assert_eq!(
            repair_json(text).unwrap(),
            json!({"app.py": "Entry point"})
        );
    }

    #[test]
    fn test_array_inside_prose_is_wrapped() {
        let text = "The files are [\"a.py\", \"b.py\"], as requested.";
        assert_eq!(
            repair_json(text).unwrap(),
            json!({"items": ["a.py", "b.py"]})
        );
    }

    #[test]
    fn test_array_of_objects_inside_prose() {
        // The object slice spans two objects and fails, so the array wins.
        let text = "Result: [{\"a\": 1}, {\"b\": 2}] done";
        assert_eq!(
            repair_json(text).unwrap(),
            json!({"items": [{"a": 1}, {"b": 2}]})
        );
    }

    #[test]
    fn test_failure_carries_bounded_preview() {
        let text = "I'm sorry, I cannot produce that. ".repeat(20);
        let err = repair_json(&text).unwrap_err();

        assert_eq!(err.preview.chars().count(), PREVIEW_CHARS);
        assert!(text.starts_with(&err.preview));
        assert_eq!(err.length, text.trim().chars().count());
        assert_eq!(err.strategies, RepairStrategy::ALL.to_vec());
    }

    #[test]
    fn test_short_failure_keeps_whole_text() {
        let err = repair_json("not json").unwrap_err();
        assert_eq!(err.preview, "not json");
    }

    #[test]
    fn test_mismatched_brackets_fail() {
        assert!(try_object_slice("} nothing {").is_none());
        assert!(try_array_slice("] nothing [").is_none());
        assert!(repair_json("} nothing {").is_err());
    }

    #[test]
    fn test_strip_fences_ignores_unfenced_text() {
        assert!(try_strip_fences("{\"a\": 1}").is_none());
    }
}
