/*!
 * Chunk assembly: limit selection, splitting, rendering and tagging.
 *
 * The assembler composes the optional boundary selector with the heuristic
 * splitter by first success. It never fails: every input yields an ordered,
 * non-empty list of rendered segments.
 */

use log::debug;
use serde::Serialize;
use std::sync::Arc;

use crate::formatting::markup::MarkupRenderer;
use crate::formatting::selector::{BoundarySelector, DisabledSelector};
use crate::formatting::splitter::{char_len, truncate_chars, HeuristicSplitter, RawSegment};
use crate::formatting::surface::{Surface, SurfaceLimits};

/// One ready-to-send piece of a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedSegment {
    /// Position within the post
    pub index: usize,
    /// Surface this segment must be delivered on
    pub surface: Surface,
    /// Rendered markup, tag included
    pub text: String,
    /// Length in chars of the raw text before rendering
    pub raw_len: usize,
    /// Whether the category tag was prefixed
    pub tagged: bool,
}

/// Turns translated text into bounded, rendered segments
pub struct ChunkAssembler {
    limits: SurfaceLimits,
    selector: Arc<dyn BoundarySelector>,
}

impl std::fmt::Debug for ChunkAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkAssembler")
            .field("limits", &self.limits)
            .field("selector", &self.selector.name())
            .finish()
    }
}

impl ChunkAssembler {
    /// Create an assembler that only uses the heuristic splitter
    pub fn new(limits: SurfaceLimits) -> Self {
        Self {
            limits,
            selector: Arc::new(DisabledSelector),
        }
    }

    /// Put a boundary selector in front of the heuristic splitter
    pub fn with_selector(mut self, selector: Arc<dyn BoundarySelector>) -> Self {
        self.selector = selector;
        self
    }

    pub fn limits(&self) -> &SurfaceLimits {
        &self.limits
    }

    /// Split `text` to `limit` chars, selector first and heuristic on refusal
    pub async fn raw_segments(&self, text: &str, limit: usize) -> Vec<RawSegment> {
        if let Some(segments) = self.selector.try_split(text, limit).await {
            if !segments.is_empty() {
                debug!("{} selector produced {} segments", self.selector.name(), segments.len());
                return segments;
            }
        }

        let segments = HeuristicSplitter::split(text, limit);
        debug!("Heuristic splitter produced {} segments (limit {})", segments.len(), limit);
        segments
    }

    /// Assemble `text` for `surface`.
    ///
    /// On the caption surface only the first segment stays a caption; the rest
    /// (and any overflow past the caption hard limit) are re-split for the
    /// message surface. The category tag, when non-empty, goes on the first
    /// segment only.
    pub async fn assemble(&self, text: &str, surface: Surface, category: Option<&str>) -> Vec<RenderedSegment> {
        let limit = self.limits.for_surface(surface);
        let raw = self.raw_segments(text, limit.effective_limit()).await;

        let planned = match surface {
            Surface::Message => raw.into_iter().map(|s| (Surface::Message, s.text)).collect(),
            Surface::Caption => self.plan_caption(raw, limit.hard_limit).await,
        };

        let tag = category
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .map(MarkupRenderer::category_tag);

        planned
            .into_iter()
            .enumerate()
            .map(|(index, (surface, raw_text))| {
                let body = MarkupRenderer::render(&raw_text);
                let (text, tagged) = match (&tag, index) {
                    (Some(tag), 0) => (format!("{}{}", tag, body), true),
                    _ => (body, false),
                };
                RenderedSegment {
                    index,
                    surface,
                    text,
                    raw_len: char_len(&raw_text),
                    tagged,
                }
            })
            .collect()
    }

    /// Caption head plus message-surface tails
    async fn plan_caption(&self, raw: Vec<RawSegment>, hard_limit: usize) -> Vec<(Surface, String)> {
        let mut segments = raw.into_iter();
        let first = segments.next().map(|s| s.text).unwrap_or_default();

        let head = truncate_chars(&first, hard_limit).to_string();
        let overflow = first[head.len()..].trim_start().to_string();
        if !overflow.is_empty() {
            debug!("Caption head truncated to {} chars, {} chars carried over", hard_limit, char_len(&overflow));
        }

        let tails: Vec<String> = std::iter::once(overflow)
            .chain(segments.map(|s| s.text))
            .filter(|t| !t.is_empty())
            .collect();

        let message_limit = self.limits.message.effective_limit();
        let mut planned = vec![(Surface::Caption, head)];
        for tail in tails {
            for segment in self.raw_segments(&tail, message_limit).await {
                planned.push((Surface::Message, segment.text));
            }
        }
        planned
    }
}
