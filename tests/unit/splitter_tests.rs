/*!
 * Tests for heuristic splitting
 */

use postrelay::formatting::splitter::char_len;
use postrelay::formatting::HeuristicSplitter;

use crate::common::{sample_post, without_whitespace};

/// Every segment respects the limit and the content survives modulo whitespace
#[test]
fn test_split_samplePosts_shouldBeBoundedAndContentPreserving() {
    for len in [0, 10, 974, 3896, 3897, 12_000] {
        let text = sample_post(len);
        for limit in [1, 2, 50, 974, 3896] {
            let segments = HeuristicSplitter::split(&text, limit);

            assert!(!segments.is_empty());
            for segment in &segments {
                assert!(segment.len() <= limit, "segment of {} chars over limit {}", segment.len(), limit);
            }

            let joined: String = segments.iter().map(|s| s.text.as_str()).collect();
            assert_eq!(without_whitespace(&joined), without_whitespace(&text));
        }
    }
}

#[test]
fn test_split_withBoundaryWhitespace_shouldRejoinWithSeparators() {
    let text = "Para satu ada di sini.\n\nPara dua pula di sini.";
    let segments = HeuristicSplitter::split(text, 25);

    let rejoined = segments.iter().map(|s| s.text.as_str()).collect::<Vec<_>>().join("\n\n");
    assert_eq!(rejoined, text);
}

#[test]
fn test_split_sameInput_shouldBeDeterministic() {
    let text = sample_post(5000);
    assert_eq!(HeuristicSplitter::split(&text, 974), HeuristicSplitter::split(&text, 974));
}

#[test]
fn test_split_emojiText_shouldCountCharsNotBytes() {
    let text = "🚀".repeat(30);
    let segments = HeuristicSplitter::split(&text, 7);
    assert!(segments.iter().all(|s| char_len(&s.text) <= 7));
    assert_eq!(segments.iter().map(|s| s.len()).sum::<usize>(), 30);
}

#[test]
fn test_split_segmentIndices_shouldBeSequential() {
    let segments = HeuristicSplitter::split(&sample_post(2000), 300);
    for (i, segment) in segments.iter().enumerate() {
        assert_eq!(segment.index, i);
    }
}
