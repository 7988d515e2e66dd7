/*!
 * Deterministic text splitting at natural break points.
 *
 * The splitter never calls out and always succeeds. Lengths are counted in
 * chars, and every cut lands on a char boundary.
 */

use serde::Serialize;

/// Break candidates closer to the window start than this fraction are ignored
const MIN_BREAK_FRACTION: f64 = 0.4;

/// Sentence terminators, tried in this order
const SENTENCE_ENDINGS: [&str; 3] = [". ", "! ", "? "];

/// One ordered piece of raw (unrendered) text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawSegment {
    /// Position within the split
    pub index: usize,
    /// The text of the piece
    pub text: String,
}

impl RawSegment {
    /// Number the given pieces in order
    pub fn sequence(pieces: Vec<String>) -> Vec<RawSegment> {
        pieces
            .into_iter()
            .enumerate()
            .map(|(index, text)| RawSegment { index, text })
            .collect()
    }

    /// Length in chars
    pub fn len(&self) -> usize {
        char_len(&self.text)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Length of `text` in chars
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Longest prefix of `text` holding at most `max_chars` chars
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Splitter preferring paragraph, line, sentence and word boundaries
pub struct HeuristicSplitter;

impl HeuristicSplitter {
    /// Split `text` into pieces of at most `limit` chars.
    ///
    /// Cascade per window: blank line, line break, sentence end, space, hard cut.
    /// Whitespace at each cut is trimmed from both sides. A `limit` of zero is
    /// treated as one.
    pub fn split(text: &str, limit: usize) -> Vec<RawSegment> {
        let limit = limit.max(1);

        if char_len(text) <= limit {
            return RawSegment::sequence(vec![text.to_string()]);
        }

        let min_break = limit as f64 * MIN_BREAK_FRACTION;
        let mut pieces = Vec::new();
        let mut remaining = text;

        while !remaining.is_empty() {
            if char_len(remaining) <= limit {
                pieces.push(remaining.to_string());
                break;
            }

            let window = truncate_chars(remaining, limit);
            let cut = Self::find_break(window, min_break).unwrap_or(window.len());

            pieces.push(remaining[..cut].trim_end().to_string());
            remaining = remaining[cut..].trim_start();
        }

        let pieces = pieces
            .into_iter()
            .map(|piece| truncate_chars(&piece, limit).to_string())
            .collect();

        RawSegment::sequence(pieces)
    }

    /// Byte offset just past the preferred break in `window`, if any qualifies
    fn find_break(window: &str, min_break: f64) -> Option<usize> {
        let candidate = |pattern: &str| {
            window
                .rfind(pattern)
                .filter(|&idx| char_len(&window[..idx]) as f64 > min_break)
                .map(|idx| idx + pattern.len())
        };

        candidate("\n\n")
            .or_else(|| candidate("\n"))
            .or_else(|| SENTENCE_ENDINGS.iter().find_map(|ending| candidate(ending)))
            .or_else(|| candidate(" "))
    }
}
