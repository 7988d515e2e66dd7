/*!
 * Integration tests for the relay loop
 *
 * The relay runs against in-memory collaborators from `common::mock_relay` and
 * a sent-history file in a temporary directory.
 */

use anyhow::Result;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

use postrelay::app_config::ChannelConfig;
use postrelay::formatting::{ChunkAssembler, SurfaceLimits};
use postrelay::relay::{Relay, SentHistory};

use crate::common::create_temp_dir;
use crate::common::create_test_file;
use crate::common::mock_relay::{
    photo_post, text_post, MockImages, MockSource, RecordingSender, Sent, UppercaseTranslator,
};
use crate::common::sample_post;

const TAG: &str = "[<b>Market Events</b>]\n\n";
const PHOTO_URL: &str = "https://pbs.twimg.com/media/chart.jpg";

fn channel(link: &str) -> ChannelConfig {
    ChannelConfig {
        link: link.to_string(),
        category: Some("Market Events".to_string()),
    }
}

fn relay(
    source: MockSource,
    translator: Arc<UppercaseTranslator>,
    sender: Arc<RecordingSender>,
    images: MockImages,
) -> Relay {
    Relay::new(
        Arc::new(source),
        translator,
        sender,
        Arc::new(images),
        ChunkAssembler::new(SurfaceLimits::default()),
    )
    .with_fetch_limit(5)
}

fn stored_messages(path: &Path) -> Result<Vec<Value>> {
    let document: Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    assert!(document["timestamp"].is_string());
    Ok(document["messages"].as_array().cloned().unwrap_or_default())
}

#[tokio::test]
async fn test_run_textPost_shouldSendTaggedMessageAndRecordIt() -> Result<()> {
    let dir = create_temp_dir()?;
    let history_path = dir.path().join("results.json");
    let mut history = SentHistory::load(&history_path);

    let source = MockSource::new().with_posts("lookonchain", vec![text_post("1", "Whale moved **BTC**")]);
    let translator = Arc::new(UppercaseTranslator::new());
    let sender = Arc::new(RecordingSender::new());
    let relay = relay(source, translator.clone(), sender.clone(), MockImages::available());

    let report = relay.run(&[channel("https://x.com/lookonchain")], &mut history).await?;

    assert_eq!(sender.sent(), vec![Sent::Message(format!("{}WHALE MOVED <b>BTC</b>", TAG))]);
    assert_eq!(report.records.len(), 1);
    let record = &report.records[0];
    assert_eq!(record.source, "twitter");
    assert_eq!(record.handle, "lookonchain");
    assert_eq!(record.category.as_deref(), Some("Market Events"));
    assert_eq!(record.translated_text, "WHALE MOVED **BTC**");

    let stored = stored_messages(&history_path)?;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0]["original_text"], "Whale moved **BTC**");
    assert_eq!(stored[0]["twitter_username"], "lookonchain");
    assert_eq!(stored[0]["channel_type"], "Market Events");
    assert!(SentHistory::load(&history_path).already_sent("Whale moved **BTC**"));
    Ok(())
}

#[tokio::test]
async fn test_run_alreadySentPost_shouldBeSkippedWithoutTranslation() -> Result<()> {
    let dir = create_temp_dir()?;
    let history_path = create_test_file(
        dir.path(),
        "results.json",
        r#"[ { "original_text": "Old news", "message_id": "0" } ]"#,
    )?;
    let mut history = SentHistory::load(&history_path);

    let source = MockSource::new().with_posts(
        "whale_alert",
        vec![text_post("2", "Old news"), text_post("3", "Fresh news")],
    );
    let translator = Arc::new(UppercaseTranslator::new());
    let sender = Arc::new(RecordingSender::new());
    let relay = relay(source, translator.clone(), sender.clone(), MockImages::available());

    let report = relay.run(&[channel("@whale_alert")], &mut history).await?;

    assert_eq!(report.duplicates, 1);
    assert_eq!(translator.calls(), vec!["Fresh news"]);
    assert_eq!(sender.sent().len(), 1);

    let stored = stored_messages(&history_path)?;
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0]["original_text"], "Old news");
    assert_eq!(stored[1]["original_text"], "Fresh news");
    Ok(())
}

#[tokio::test]
async fn test_run_translationFailure_shouldSkipOnlyThatPost() -> Result<()> {
    let dir = create_temp_dir()?;
    let mut history = SentHistory::load(dir.path().join("results.json"));

    let source = MockSource::new().with_posts(
        "lookonchain",
        vec![text_post("1", "Untranslatable"), text_post("2", "Fine post")],
    );
    let translator = Arc::new(UppercaseTranslator::new().failing_on("Untranslatable"));
    let sender = Arc::new(RecordingSender::new());
    let relay = relay(source, translator.clone(), sender.clone(), MockImages::available());

    let report = relay.run(&[channel("lookonchain")], &mut history).await?;

    assert_eq!(report.untranslated, 1);
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].post_id, "2");
    assert_eq!(sender.sent(), vec![Sent::Message(format!("{}FINE POST", TAG))]);
    Ok(())
}

#[tokio::test]
async fn test_run_longPhotoPost_shouldSendCaptionThenMessageTails() -> Result<()> {
    let dir = create_temp_dir()?;
    let mut history = SentHistory::load(dir.path().join("results.json"));

    let source = MockSource::new().with_posts("lookonchain", vec![photo_post("1", &sample_post(1500), PHOTO_URL)]);
    let sender = Arc::new(RecordingSender::new());
    let relay = relay(source, Arc::new(UppercaseTranslator::new()), sender.clone(), MockImages::available());

    let report = relay.run(&[channel("lookonchain")], &mut history).await?;

    let sent = sender.sent();
    assert!(sent.len() >= 2);
    match &sent[0] {
        Sent::Photo { caption, image_len } => {
            assert!(caption.starts_with(TAG));
            assert_eq!(*image_len, 7);
        }
        other => panic!("expected a photo first, got {:?}", other),
    }
    for tail in &sent[1..] {
        match tail {
            Sent::Message(text) => assert!(!text.contains(TAG)),
            other => panic!("expected message tails, got {:?}", other),
        }
    }
    assert_eq!(report.records[0].photos, vec![PHOTO_URL]);
    Ok(())
}

#[tokio::test]
async fn test_run_photoDownloadFailure_shouldFallBackToText() -> Result<()> {
    let dir = create_temp_dir()?;
    let mut history = SentHistory::load(dir.path().join("results.json"));

    let source = MockSource::new().with_posts("lookonchain", vec![photo_post("1", "Chart below", PHOTO_URL)]);
    let sender = Arc::new(RecordingSender::new());
    let relay = relay(source, Arc::new(UppercaseTranslator::new()), sender.clone(), MockImages::unavailable());

    let report = relay.run(&[channel("lookonchain")], &mut history).await?;

    assert_eq!(sender.sent(), vec![Sent::Message(format!("{}CHART BELOW", TAG))]);
    assert_eq!(report.records.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_run_rejectingSender_shouldStillRecordPost() -> Result<()> {
    let dir = create_temp_dir()?;
    let history_path = dir.path().join("results.json");
    let mut history = SentHistory::load(&history_path);

    let source = MockSource::new().with_posts("lookonchain", vec![text_post("1", &sample_post(5000))]);
    let sender = Arc::new(RecordingSender::rejecting());
    let relay = relay(source, Arc::new(UppercaseTranslator::new()), sender.clone(), MockImages::available());

    let report = relay.run(&[channel("lookonchain")], &mut history).await?;

    assert_eq!(report.failed_segments, sender.sent().len());
    assert!(report.failed_segments >= 2);
    assert_eq!(report.records.len(), 1);
    assert_eq!(stored_messages(&history_path)?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_run_failingChannel_shouldNotStopOtherChannels() -> Result<()> {
    let dir = create_temp_dir()?;
    let mut history = SentHistory::load(dir.path().join("results.json"));

    let source = MockSource::new().with_posts("whale_alert", vec![text_post("9", "Still here")]);
    let sender = Arc::new(RecordingSender::new());
    let relay = relay(source, Arc::new(UppercaseTranslator::new()), sender.clone(), MockImages::available());

    let channels = [channel("https://x.com/missing"), channel("https://x.com/whale_alert")];
    let report = relay.run(&channels, &mut history).await?;

    assert_eq!(report.failed_channels, 1);
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].handle, "whale_alert");
    Ok(())
}

#[tokio::test]
async fn test_run_nothingNew_shouldNotWriteHistory() -> Result<()> {
    let dir = create_temp_dir()?;
    let history_path = dir.path().join("results.json");
    let mut history = SentHistory::load(&history_path);

    let source = MockSource::new().with_posts("lookonchain", Vec::new());
    let relay = relay(
        source,
        Arc::new(UppercaseTranslator::new()),
        Arc::new(RecordingSender::new()),
        MockImages::available(),
    );

    let report = relay.run(&[channel("lookonchain")], &mut history).await?;

    assert!(report.records.is_empty());
    assert!(!history_path.exists());
    Ok(())
}
