//! Logging helpers that keep model output and secrets out of multi-line log noise.

/// Default number of characters kept by [`log_preview`] callers.
pub const DEFAULT_PREVIEW_CHARS: usize = 300;

/// One-line preview of model output.
///
/// Whitespace runs (line breaks included) collapse to a single space and
/// other control characters are dropped. Past `max_chars` the preview is cut
/// and the number of characters left out is appended.
pub fn log_preview(s: &str, max_chars: usize) -> String {
    let flat: String = s
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .filter(|c| !c.is_control())
        .collect();
    let total = flat.chars().count();
    if total <= max_chars {
        return flat;
    }
    let kept: String = flat.chars().take(max_chars).collect();
    format!("{}… (+{} chars)", kept, total - max_chars)
}

/// Describe an API key for logs without revealing it.
pub fn describe_key(key: &str) -> String {
    if key.is_empty() {
        "missing".to_string()
    } else {
        format!("present ({} chars)", key.chars().count())
    }
}
