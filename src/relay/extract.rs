//! Salvage the JSON object from a free-form model reply.

/// Slice out the JSON object embedded in `raw`.
///
/// Takes everything from the first `{` to the last `}`. When no such pair
/// exists, strips a Markdown code fence instead and returns what is left.
/// The result is not guaranteed to parse; callers validate it.
pub fn extract_json(raw: &str) -> &str {
    let trimmed = raw.trim();
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            return &trimmed[start..=end];
        }
    }
    strip_code_fence(trimmed)
}

fn strip_code_fence(s: &str) -> &str {
    let s = match s.strip_prefix("```") {
        Some(rest) => {
            let rest = rest.strip_prefix("json").unwrap_or(rest);
            rest.strip_prefix('\n').unwrap_or(rest)
        }
        None => s,
    };
    let s = s.strip_suffix("```").unwrap_or(s);
    s.strip_suffix('\n').unwrap_or(s)
}
