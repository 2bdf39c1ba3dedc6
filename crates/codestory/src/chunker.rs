//! Line-preserving text chunking.
//!
//! Chunks never split a line. Joining the output with `"\n"` gives back the
//! input exactly.

pub const DEFAULT_CHUNK_CHARS: usize = 2000;

/// Splits `text` into chunks of at most `max_chars` characters, counting one
/// extra character per line for its separator. A line longer than the limit
/// becomes a chunk of its own.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0usize;

    for line in text.split('\n') {
        let line_len = line.chars().count() + 1;
        if current_len + line_len > max_chars && !current.is_empty() {
            chunks.push(current.join("\n"));
            current.clear();
            current_len = 0;
        }
        current.push(line);
        current_len += line_len;
    }

    if !current.is_empty() {
        chunks.push(current.join("\n"));
    }

    chunks
}

/// [`chunk_text`] with the default 2000-character limit.
pub fn chunk(text: &str) -> Vec<String> {
    chunk_text(text, DEFAULT_CHUNK_CHARS)
}
