/*!
 * # postrelay - translated post relay with bounded message chunking
 *
 * A Rust library that turns arbitrary-length translated text into ordered,
 * length-bounded, safely marked-up segments for a messaging surface with hard
 * size limits, and relays source posts through that engine.
 *
 * ## Features
 *
 * - Whitelisted markup rendering (links, bold, italics) to escaped HTML
 * - Deterministic heuristic splitting at paragraph, line, sentence and word breaks
 * - Optional assistant-chosen split points under a verified no-rewrite contract
 * - Message (4096/200) and caption (1024/50) surfaces with one-time category tags
 * - Timeline fetching, assistant translation with retries, Telegram delivery
 * - JSON sent-history for de-duplication
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `formatting`: the chunking engine:
 *   - `formatting::markup`: Markup Renderer
 *   - `formatting::splitter`: Heuristic Splitter
 *   - `formatting::selector`: Boundary Selector
 *   - `formatting::assembler`: Chunk Assembler
 *   - `formatting::surface`: surfaces and their limits
 * - `relay`: source, translation, delivery and history collaborators
 * - `providers`: Client implementations for text-reasoning assistants:
 *   - `providers::gemini`: Gemini API client
 *   - `providers::mock`: scripted provider for tests
 * - `app_config`: Configuration management
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod errors;
pub mod formatting;
pub mod language_utils;
pub mod providers;
pub mod relay;

// Re-export main types for easier usage
pub use app_config::Config;
pub use errors::{ProviderError, RelayError, SplitRejection};
pub use formatting::{ChunkAssembler, HeuristicSplitter, MarkupRenderer, RenderedSegment, Surface};
pub use language_utils::{get_language_name, normalize_to_part2t};
pub use relay::{Relay, RelayRecord, SentHistory};
