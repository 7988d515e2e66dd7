/*!
 * Tests for timeline response parsing
 */

use postrelay::relay::{extract_handle, parse_timeline};
use serde_json::{json, Value};

fn timeline_entry(id: &str, text: &str, media: &[&str]) -> Value {
    let media: Vec<Value> = media.iter().map(|url| json!({ "media_url_https": url })).collect();
    json!({
        "entryId": format!("tweet-{}", id),
        "content": {
            "itemContent": {
                "tweet_results": {
                    "result": {
                        "__typename": "Tweet",
                        "rest_id": id,
                        "legacy": {
                            "full_text": text,
                            "created_at": "Wed Oct 10 20:19:24 +0000 2018",
                            "entities": { "media": media }
                        }
                    }
                }
            }
        }
    })
}

fn timeline(entries: Vec<Value>) -> Value {
    json!({
        "result": {
            "timeline": {
                "instructions": [
                    { "type": "TimelineClearCache" },
                    { "type": "TimelineAddEntries", "entries": entries }
                ]
            }
        }
    })
}

#[test]
fn test_parseTimeline_realisticResponse_shouldReturnNewestFirst() {
    let data = timeline(vec![
        timeline_entry("300", "  Whale moved 1,000 BTC  ", &[]),
        timeline_entry("200", "Chart of the day", &["https://pbs.twimg.com/media/a.jpg"]),
        timeline_entry("100", "Older post", &[]),
    ]);

    let posts = parse_timeline(&data, 2);
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].id, "300");
    assert_eq!(posts[0].text, "Whale moved 1,000 BTC");
    assert!(!posts[0].has_photo());
    assert_eq!(posts[1].photos, vec!["https://pbs.twimg.com/media/a.jpg"]);
    assert_eq!(posts[1].date, "Wed Oct 10 20:19:24 +0000 2018");
}

#[test]
fn test_parseTimeline_photoOnlyPost_shouldBeKept() {
    let data = timeline(vec![timeline_entry("1", "", &["https://pbs.twimg.com/media/b.jpg"])]);
    let posts = parse_timeline(&data, 5);
    assert_eq!(posts.len(), 1);
    assert!(posts[0].text.is_empty());
}

#[test]
fn test_parseTimeline_noTweets_shouldReturnEmpty() {
    assert!(parse_timeline(&timeline(Vec::new()), 5).is_empty());
    assert!(parse_timeline(&json!({ "errors": [ { "message": "rate limited" } ] }), 5).is_empty());
}

#[test]
fn test_extractHandle_configuredLinks_shouldYieldBareHandles() {
    assert_eq!(extract_handle("https://x.com/lookonchain"), "lookonchain");
    assert_eq!(extract_handle("https://twitter.com/whale_alert/"), "whale_alert");
    assert_eq!(extract_handle("@WatcherGuru"), "WatcherGuru");
}
