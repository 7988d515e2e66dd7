/*!
 * Integration tests for the chunk assembler
 *
 * These tests drive the assembler the way the relay does: default platform
 * limits, category tags, both surfaces and a scripted boundary selector.
 */

use std::sync::Arc;

use postrelay::formatting::{AssistantSelector, ChunkAssembler, Surface, SurfaceLimit, SurfaceLimits};
use postrelay::providers::mock::MockProvider;

use crate::common::{sample_post, without_whitespace};

const TAG: &str = "[<b>Market Events</b>]\n\n";

fn small_limits() -> SurfaceLimits {
    SurfaceLimits {
        message: SurfaceLimit { hard_limit: 25, safety_margin: 5 },
        caption: SurfaceLimit { hard_limit: 12, safety_margin: 2 },
    }
}

#[tokio::test]
async fn test_assemble_longMessage_shouldStayWithinEffectiveLimit() {
    let assembler = ChunkAssembler::new(SurfaceLimits::default());
    let text = sample_post(12_000);

    let segments = assembler.assemble(&text, Surface::Message, Some("Market Events")).await;

    assert!(segments.len() >= 4);
    for (i, segment) in segments.iter().enumerate() {
        assert_eq!(segment.index, i);
        assert_eq!(segment.surface, Surface::Message);
        assert!(segment.raw_len <= 3896);
    }
}

#[tokio::test]
async fn test_assemble_longMessage_shouldTagExactlyOnce() {
    let assembler = ChunkAssembler::new(SurfaceLimits::default());
    let segments = assembler.assemble(&sample_post(9000), Surface::Message, Some("Market Events")).await;

    assert!(segments[0].text.starts_with(TAG));
    let tag_count: usize = segments.iter().map(|s| s.text.matches(TAG).count()).sum();
    assert_eq!(tag_count, 1);
    assert!(segments.iter().skip(1).all(|s| !s.tagged));
}

#[tokio::test]
async fn test_assemble_blankCategory_shouldNotTag() {
    let assembler = ChunkAssembler::new(SurfaceLimits::default());
    let segments = assembler.assemble("Harga naik", Surface::Message, Some("   ")).await;
    assert_eq!(segments[0].text, "Harga naik");
    assert!(!segments[0].tagged);
}

#[tokio::test]
async fn test_assemble_longCaption_shouldPutOnlyHeadOnCaption() {
    let assembler = ChunkAssembler::new(SurfaceLimits::default());
    let text = sample_post(1100);

    let segments = assembler.assemble(&text, Surface::Caption, Some("Market Events")).await;

    assert!(segments.len() >= 2);
    assert_eq!(segments[0].surface, Surface::Caption);
    assert!(segments[0].raw_len <= 1024);
    assert!(segments[0].tagged);
    for tail in &segments[1..] {
        assert_eq!(tail.surface, Surface::Message);
        assert!(!tail.tagged);
        assert!(tail.raw_len <= 3896);
    }
}

#[tokio::test]
async fn test_assemble_captionWithoutBreakPoints_shouldHardCutIntoMessageTail() {
    let assembler = ChunkAssembler::new(SurfaceLimits::default());
    let text = "x".repeat(1100);

    let segments = assembler.assemble(&text, Surface::Caption, Some("Market Events")).await;

    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].surface, Surface::Caption);
    assert_eq!(segments[0].raw_len, 974);
    assert!(segments[0].text.starts_with(TAG));
    assert_eq!(segments[1].surface, Surface::Message);
    assert_eq!(segments[1].text, "x".repeat(126));
    assert!(!segments[1].tagged);
}

#[tokio::test]
async fn test_assemble_shortCaption_shouldBeSingleCaption() {
    let assembler = ChunkAssembler::new(SurfaceLimits::default());
    let segments = assembler.assemble("Carta **BTC** hari ini", Surface::Caption, None).await;

    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].surface, Surface::Caption);
    assert_eq!(segments[0].text, "Carta <b>BTC</b> hari ini");
}

#[tokio::test]
async fn test_assemble_validSelectorReply_shouldUseItsBoundaries() {
    let provider = MockProvider::replying(r#"["Alpha one. Beta two.", " Gamma three."]"#);
    let assembler = ChunkAssembler::new(small_limits())
        .with_selector(Arc::new(AssistantSelector::new(provider.clone())));

    let segments = assembler.assemble("Alpha one. Beta two. Gamma three.", Surface::Message, None).await;

    assert_eq!(provider.request_count(), 1);
    let texts: Vec<&str> = segments.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(texts, vec!["Alpha one. Beta two.", " Gamma three."]);
}

#[tokio::test]
async fn test_assemble_rewritingSelector_shouldFallBackToHeuristic() {
    let text = "Alpha one. Beta two. Gamma three.";
    let rewriting = MockProvider::replying(r#"["Alpha 1. Beta two.", " Gamma three."]"#);
    let with_selector = ChunkAssembler::new(small_limits())
        .with_selector(Arc::new(AssistantSelector::new(rewriting)));
    let heuristic_only = ChunkAssembler::new(small_limits());

    let fallback = with_selector.assemble(text, Surface::Message, None).await;
    let expected = heuristic_only.assemble(text, Surface::Message, None).await;

    assert_eq!(fallback, expected);
    let joined: String = fallback.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(without_whitespace(&joined), without_whitespace(text));
}

#[tokio::test]
async fn test_assemble_failingSelector_shouldFallBackToHeuristic() {
    let provider = MockProvider::failing();
    let assembler = ChunkAssembler::new(small_limits())
        .with_selector(Arc::new(AssistantSelector::new(provider.clone())));

    let segments = assembler.assemble(&sample_post(200), Surface::Message, None).await;

    assert_eq!(provider.request_count(), 1);
    assert!(segments.iter().all(|s| s.raw_len <= 20));
}

#[tokio::test]
async fn test_assemble_unconfiguredSelector_shouldNotCallProvider() {
    let provider = MockProvider::unconfigured();
    let assembler = ChunkAssembler::new(small_limits())
        .with_selector(Arc::new(AssistantSelector::new(provider.clone())));

    let segments = assembler.assemble(&sample_post(100), Surface::Message, None).await;

    assert_eq!(provider.request_count(), 0);
    assert!(segments.len() > 1);
}

#[tokio::test]
async fn test_assemble_degenerateInputs_shouldBeDeterministic() {
    let assembler = ChunkAssembler::new(small_limits());
    let inputs = [String::new(), " ".repeat(60), "\n".repeat(60), "x".repeat(60), "🚀".repeat(60)];

    for input in &inputs {
        for surface in [Surface::Message, Surface::Caption] {
            let first = assembler.assemble(input, surface, Some("Tag")).await;
            let second = assembler.assemble(input, surface, Some("Tag")).await;

            assert!(!first.is_empty());
            assert_eq!(first, second);
            assert!(first.iter().all(|s| s.raw_len <= 20));
        }
    }
}

#[tokio::test]
async fn test_assemble_markupAcrossSegments_shouldEscapeEverywhere() {
    let assembler = ChunkAssembler::new(small_limits());
    let segments = assembler.assemble("a < b and c > d and e & f and g < h", Surface::Message, None).await;

    for segment in &segments {
        assert!(!segment.text.contains('<'));
        assert!(!segment.text.contains('>'));
    }
}
