/*!
 * Message formatting and chunking engine.
 *
 * Leaves first:
 * - `markup`: whitelisted markup subset to escaped HTML
 * - `splitter`: deterministic heuristic splitting
 * - `selector`: optional assistant-chosen split points
 * - `assembler`: limit selection, splitting, rendering and tagging
 */

pub mod assembler;
pub mod markup;
pub mod selector;
pub mod splitter;
pub mod surface;

pub use assembler::{ChunkAssembler, RenderedSegment};
pub use markup::{FormattingToken, MarkupRenderer};
pub use selector::{AssistantSelector, BoundarySelector, DisabledSelector};
pub use splitter::{HeuristicSplitter, RawSegment};
pub use surface::{Surface, SurfaceLimit, SurfaceLimits};
