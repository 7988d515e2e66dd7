/*!
 * Relay pipeline around the chunking engine.
 *
 * For every configured channel the relay fetches the latest posts, skips those
 * already sent, translates them, assembles bounded segments and delivers them.
 * Posts are handled strictly one after another; a failure only skips the
 * current post or channel.
 */

use anyhow::Result;
use bytes::Bytes;
use log::{debug, error, info, warn};
use std::sync::Arc;

use crate::app_config::{ChannelConfig, Config};
use crate::formatting::{ChunkAssembler, RenderedSegment, Surface};

pub mod history;
pub mod sender;
pub mod source;
pub mod translator;

pub use history::{RelayRecord, SentHistory};
pub use sender::{download_image, HttpImageDownloader, ImageDownloader, Sender, TelegramSender};
pub use source::{extract_handle, parse_timeline, Post, PostSource, TimelineClient};
pub use translator::{AssistantTranslator, Translator};

/// Origin label written to every record
const SOURCE_LABEL: &str = "twitter";

/// Outcome of one relay run
#[derive(Debug, Default)]
pub struct RelayReport {
    /// Posts that were translated and handed to the sender
    pub records: Vec<RelayRecord>,
    /// Posts skipped because their text was already sent
    pub duplicates: usize,
    /// Posts skipped because translation failed or came back empty
    pub untranslated: usize,
    /// Segments the sender rejected
    pub failed_segments: usize,
    /// Channels whose fetch failed
    pub failed_channels: usize,
}

/// Sequential relay over all configured channels
pub struct Relay {
    source: Arc<dyn PostSource>,
    translator: Arc<dyn Translator>,
    sender: Arc<dyn Sender>,
    images: Arc<dyn ImageDownloader>,
    assembler: ChunkAssembler,
    fetch_limit: usize,
}

impl Relay {
    pub fn new(
        source: Arc<dyn PostSource>,
        translator: Arc<dyn Translator>,
        sender: Arc<dyn Sender>,
        images: Arc<dyn ImageDownloader>,
        assembler: ChunkAssembler,
    ) -> Self {
        Self {
            source,
            translator,
            sender,
            images,
            assembler,
            fetch_limit: 1,
        }
    }

    /// Posts fetched per channel
    pub fn with_fetch_limit(mut self, fetch_limit: usize) -> Self {
        self.fetch_limit = fetch_limit.max(1);
        self
    }

    /// Wire up the HTTP collaborators described by `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        let source = TimelineClient::new(
            config.source.api_url.clone(),
            config.source.api_key.clone(),
            config.source.api_host.clone(),
            config.source.timeout_secs,
        );
        let translator = AssistantTranslator::new(
            config.assistant.build_provider(),
            &config.translation,
            config.assistant.temperature,
        )?;
        let sender = TelegramSender::new(
            config.telegram.endpoint.clone(),
            config.telegram.bot_token.clone(),
            config.telegram.chat_id.clone(),
            config.telegram.timeout_secs,
        );

        Ok(Self::new(
            Arc::new(source),
            Arc::new(translator),
            Arc::new(sender),
            Arc::new(HttpImageDownloader::new(config.source.timeout_secs)),
            config.build_assembler(config.selector.enabled),
        )
        .with_fetch_limit(config.source.fetch_limit))
    }

    /// Relay every channel once and persist the new records to `history`
    pub async fn run(&self, channels: &[ChannelConfig], history: &mut SentHistory) -> Result<RelayReport> {
        let mut report = RelayReport::default();
        info!("Relaying {} channels ({} texts already sent)", channels.len(), history.len());

        for channel in channels {
            self.relay_channel(channel, history, &mut report).await;
        }

        info!(
            "Relay finished: {} posted, {} duplicates, {} untranslated, {} failed segments",
            report.records.len(), report.duplicates, report.untranslated, report.failed_segments
        );

        if report.records.is_empty() {
            debug!("No new posts, history not updated");
        } else {
            history.append(&report.records)?;
        }

        Ok(report)
    }

    async fn relay_channel(&self, channel: &ChannelConfig, history: &SentHistory, report: &mut RelayReport) {
        let handle = extract_handle(&channel.link);
        let category = channel.category.as_deref().filter(|c| !c.trim().is_empty());
        info!("Processing @{} ({})", handle, category.unwrap_or("no category"));

        let posts = match self.source.fetch_posts(&channel.link, self.fetch_limit).await {
            Ok(posts) => posts,
            Err(e) => {
                error!("Failed to fetch posts for @{}: {}", handle, e);
                report.failed_channels += 1;
                return;
            }
        };

        if posts.is_empty() {
            warn!("No posts returned for @{}", handle);
            return;
        }

        for post in posts {
            let original = post.text.trim();

            if !original.is_empty() && history.already_sent(original) {
                warn!("Skipping duplicate post {} from @{}", post.id, handle);
                report.duplicates += 1;
                continue;
            }

            let translated = match self.translator.translate(original).await {
                Ok(text) if !text.trim().is_empty() => text,
                Ok(_) => {
                    warn!("Empty translation, skipping post {} from @{}", post.id, handle);
                    report.untranslated += 1;
                    continue;
                }
                Err(e) => {
                    warn!("Translation failed ({}), skipping post {} from @{}", e, post.id, handle);
                    report.untranslated += 1;
                    continue;
                }
            };

            report.failed_segments += self.deliver(&post, &translated, category).await;

            report.records.push(RelayRecord {
                source: SOURCE_LABEL.to_string(),
                channel_link: channel.link.clone(),
                category: category.map(str::to_string),
                handle: handle.clone(),
                original_text: original.to_string(),
                translated_text: translated,
                date: post.date.clone(),
                post_id: post.id.clone(),
                photos: post.photos.clone(),
            });
        }
    }

    /// Assemble and send one post; returns the number of failed segments
    async fn deliver(&self, post: &Post, translated: &str, category: Option<&str>) -> usize {
        let image = match post.photos.first() {
            Some(url) => match self.images.download(url).await {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    warn!("Photo download failed ({}), sending text only", e);
                    None
                }
            },
            None => None,
        };

        let surface = if image.is_some() { Surface::Caption } else { Surface::Message };
        let segments = self.assembler.assemble(translated, surface, category).await;
        self.send_all(&segments, image.as_ref()).await
    }

    async fn send_all(&self, segments: &[RenderedSegment], image: Option<&Bytes>) -> usize {
        let total = segments.len();
        let mut failed = 0;

        for segment in segments {
            match self.sender.send_segment(segment, image).await {
                Ok(()) => info!(
                    "Sent {} part {}/{} (raw-len={})",
                    segment.surface, segment.index + 1, total, segment.raw_len
                ),
                Err(e) => {
                    error!("Failed to send {} part {}/{}: {}", segment.surface, segment.index + 1, total, e);
                    failed += 1;
                }
            }
        }

        failed
    }
}
