/*!
 * Assistant-chosen split points under a verifiable no-rewrite contract.
 *
 * A boundary selector is an optional accelerant in front of the heuristic
 * splitter. It gets exactly one attempt per call; any reply that does not
 * reproduce the input verbatim, or that overruns the limit, is discarded and
 * the caller falls back to `HeuristicSplitter`.
 */

use async_trait::async_trait;
use log::{debug, warn};

use crate::errors::SplitRejection;
use crate::formatting::splitter::{char_len, RawSegment};
use crate::providers::Provider;

/// Instruction sent to the assistant. `{limit}` and `{text}` are substituted.
const SPLIT_PROMPT: &str = r#"You are helping split a Telegram message.

You are given a text and a maximum character limit per segment: {limit}.

Your task:
1. Split the text into multiple segments.
2. Each segment MUST be a contiguous substring of the original text.
3. DO NOT change, rewrite, translate, or remove any words or characters.
   You are only allowed to INSERT SPLIT POINTS between characters.
4. Splits should happen ONLY:
   - at the end of sentences (right after '.', '!', or '?'), OR
   - at existing newline characters.
5. Each segment MUST have length <= {limit} characters.
6. When all segments are concatenated in order, they MUST reconstruct
   the original text exactly, character for character.

Output format (VERY IMPORTANT):
- Return ONLY a valid JSON array of strings.
- Example: ["segment 1", "segment 2", "segment 3"]
- Do NOT add comments, explanations, or any text outside the JSON.

Text to split:
"""{text}""""#;

/// Capability that may choose split points for a text
#[async_trait]
pub trait BoundarySelector: Send + Sync {
    /// Propose segments of at most `limit` chars, or `None` to request the fallback
    async fn try_split(&self, text: &str, limit: usize) -> Option<Vec<RawSegment>>;

    /// Short name used in logs
    fn name(&self) -> &str;
}

/// Selector used when no assistant is configured; always defers
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledSelector;

#[async_trait]
impl BoundarySelector for DisabledSelector {
    async fn try_split(&self, _text: &str, _limit: usize) -> Option<Vec<RawSegment>> {
        None
    }

    fn name(&self) -> &str {
        "disabled"
    }
}

/// Selector backed by a text-reasoning provider
#[derive(Debug)]
pub struct AssistantSelector<P: Provider> {
    provider: P,
    temperature: Option<f32>,
}

impl<P: Provider> AssistantSelector<P> {
    /// Create a selector over `provider`
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            temperature: None,
        }
    }

    /// Set the sampling temperature of the split request
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Build the instruction for `text`
    pub fn build_prompt(text: &str, limit: usize) -> String {
        SPLIT_PROMPT
            .replace("{limit}", &limit.to_string())
            .replace("{text}", text)
    }

    /// One attempt at assistant splitting, reporting why it was rejected
    pub async fn select(&self, text: &str, limit: usize) -> Result<Vec<RawSegment>, SplitRejection> {
        if char_len(text) <= limit {
            return Ok(RawSegment::sequence(vec![text.to_string()]));
        }

        if !self.provider.is_configured() {
            return Err(SplitRejection::Unavailable("no assistant credential configured".to_string()));
        }

        let prompt = Self::build_prompt(text, limit);
        let reply = self.provider.generate(&prompt, self.temperature).await
            .map_err(|e| SplitRejection::CallFailed(e.to_string()))?;

        let pieces = validate_reply(&reply, text, limit)?;
        Ok(RawSegment::sequence(pieces))
    }
}

#[async_trait]
impl<P: Provider> BoundarySelector for AssistantSelector<P> {
    async fn try_split(&self, text: &str, limit: usize) -> Option<Vec<RawSegment>> {
        match self.select(text, limit).await {
            Ok(segments) => {
                debug!("Assistant split {} chars into {} segments", char_len(text), segments.len());
                Some(segments)
            }
            Err(SplitRejection::Unavailable(reason)) => {
                debug!("Boundary selector unavailable ({}), using heuristic splitter", reason);
                None
            }
            Err(rejection) => {
                warn!("Boundary selector rejected: {}. Falling back to heuristic splitter.", rejection);
                None
            }
        }
    }

    fn name(&self) -> &str {
        "assistant"
    }
}

/// Check an assistant reply against the split contract.
///
/// In order: the reply is a JSON array of strings, the strings concatenate to
/// exactly `text`, and none is longer than `limit` chars. Empty strings are
/// dropped from an accepted reply.
pub fn validate_reply(reply: &str, text: &str, limit: usize) -> Result<Vec<String>, SplitRejection> {
    let pieces: Vec<String> = serde_json::from_str(reply.trim())
        .map_err(|e| SplitRejection::NotStringArray(e.to_string()))?;

    let joined: String = pieces.concat();
    if joined != text {
        return Err(SplitRejection::ReconstructionMismatch {
            expected: char_len(text),
            actual: char_len(&joined),
        });
    }

    if let Some((index, len)) = pieces.iter()
        .map(|p| char_len(p))
        .enumerate()
        .find(|&(_, len)| len > limit)
    {
        return Err(SplitRejection::SegmentTooLong { index, len, limit });
    }

    Ok(pieces.into_iter().filter(|p| !p.is_empty()).collect())
}
