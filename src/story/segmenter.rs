//! Narrative segmentation for the typewriter display.
//!
//! A turn's narrative is cut into display-sized segments: newlines first, then
//! runs of sentence terminators inside overlong lines. All lengths are counted
//! in `char`s so CJK text is measured by what the player sees and no slice ever
//! lands inside a codepoint.

/// Default upper bound for a single segment, in characters.
pub const DEFAULT_MAX_LENGTH: usize = 70;

/// Default soft threshold: a buffer this long is flushed at the next terminator.
pub const DEFAULT_FLUSH_THRESHOLD: usize = 40;

/// Sentence and clause terminators (CJK full-width and ASCII).
const TERMINATORS: &[char] = &['。', '！', '？', '；', '…', '．', '!', '?', ';', '.'];

fn is_terminator(c: char) -> bool {
    TERMINATORS.contains(&c)
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split `text` with the default flush threshold.
///
/// ```
/// use escaperoom::story::segmenter::segment;
///
/// let parts = segment("今天天气很好。\n你决定出门。", 70);
/// assert_eq!(parts, vec!["今天天气很好。", "你决定出门。"]);
/// ```
pub fn segment(text: &str, max_length: usize) -> Vec<String> {
    Segmenter::new(max_length).split(text)
}

/// Segmentation limits. Both thresholds are kept separately configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segmenter {
    max_length: usize,
    flush_threshold: usize,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
            flush_threshold: DEFAULT_FLUSH_THRESHOLD,
        }
    }
}

/// One piece of an overlong line: either plain text or a run of terminators.
enum Fragment<'a> {
    Text(&'a str),
    Terminators(&'a str),
}

impl Segmenter {
    /// A zero `max_length` is treated as 1.
    pub fn new(max_length: usize) -> Self {
        Self::with_limits(max_length, DEFAULT_FLUSH_THRESHOLD)
    }

    pub fn with_limits(max_length: usize, flush_threshold: usize) -> Self {
        Self {
            max_length: max_length.max(1),
            flush_threshold,
        }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn flush_threshold(&self) -> usize {
        self.flush_threshold
    }

    /// Cut `text` into ordered, trimmed, non-blank segments.
    ///
    /// Blank input yields an empty list. Non-blank input always yields at
    /// least one segment.
    pub fn split(&self, text: &str) -> Vec<String> {
        let mut segments = Vec::new();
        for line in text.split('\n') {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if char_len(line) <= self.max_length {
                segments.push(line.to_string());
            } else {
                self.split_long_line(line, &mut segments);
            }
        }

        if segments.is_empty() && !text.trim().is_empty() {
            segments.push(text.trim().to_string());
        }
        segments
    }

    fn split_long_line(&self, line: &str, out: &mut Vec<String>) {
        let mut buffer = String::new();
        let mut buffer_len = 0usize;

        let mut fragments = fragments(line).into_iter().peekable();
        while let Some(fragment) = fragments.next() {
            match fragment {
                Fragment::Terminators(run) => {
                    buffer.push_str(run);
                    buffer_len += char_len(run);
                    if buffer_len >= self.flush_threshold {
                        flush(&mut buffer, &mut buffer_len, out);
                    }
                }
                Fragment::Text(text) => {
                    // the sentence is measured with its closing terminators
                    let closing = match fragments.peek() {
                        Some(Fragment::Terminators(run)) => char_len(run),
                        _ => 0,
                    };
                    let len = char_len(text);
                    if buffer_len + len + closing > self.max_length && !buffer.trim().is_empty() {
                        flush(&mut buffer, &mut buffer_len, out);
                    }
                    buffer.push_str(text);
                    buffer_len += len;
                }
            }
        }
        flush(&mut buffer, &mut buffer_len, out);
    }
}

fn flush(buffer: &mut String, buffer_len: &mut usize, out: &mut Vec<String>) {
    let trimmed = buffer.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
    buffer.clear();
    *buffer_len = 0;
}

/// Alternating text / terminator-run slices of `line`, in order.
fn fragments(line: &str) -> Vec<Fragment<'_>> {
    let mut out = Vec::new();
    let mut start = 0usize;
    let mut in_run = false;

    for (idx, c) in line.char_indices() {
        let term = is_terminator(c);
        if term != in_run {
            if idx > start {
                let piece = &line[start..idx];
                out.push(if in_run {
                    Fragment::Terminators(piece)
                } else {
                    Fragment::Text(piece)
                });
            }
            start = idx;
            in_run = term;
        }
    }
    if start < line.len() {
        let piece = &line[start..];
        out.push(if in_run {
            Fragment::Terminators(piece)
        } else {
            Fragment::Text(piece)
        });
    }
    out
}
