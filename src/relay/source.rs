/*!
 * Source posts: handle parsing, timeline JSON parsing and the HTTP client.
 */

use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

use crate::errors::RelayError;

/// One post fetched from a source channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Source-assigned id
    pub id: String,
    /// Full text, trimmed
    pub text: String,
    /// Photo URLs, deduplicated, in source order
    pub photos: Vec<String>,
    /// Creation timestamp as reported by the source
    pub date: String,
}

impl Post {
    pub fn has_photo(&self) -> bool {
        !self.photos.is_empty()
    }
}

/// Capability to fetch the latest posts of a channel
#[async_trait]
pub trait PostSource: Send + Sync {
    /// Fetch at most `limit` posts for `handle`, newest first
    async fn fetch_posts(&self, handle: &str, limit: usize) -> Result<Vec<Post>, RelayError>;
}

/// Reduce a profile URL or `@handle` to the bare handle
pub fn extract_handle(link: &str) -> String {
    let mut value = link.trim();

    for host in ["twitter.com/", "x.com/"] {
        if let Some(idx) = value.rfind(host) {
            value = &value[idx + host.len()..];
        }
    }

    let value = value.trim().trim_matches('/');
    let value = value.strip_prefix('@').unwrap_or(value);
    let value = value.split('?').next().unwrap_or(value);
    value.to_string()
}

/// Collect posts from a timeline response.
///
/// Every `tweet_results.result` object with `__typename == "Tweet"` anywhere in
/// the tree is a candidate. Posts without text and photos are dropped, ids are
/// deduplicated, and at most `max(1, limit)` posts are returned.
pub fn parse_timeline(data: &Value, limit: usize) -> Vec<Post> {
    let mut candidates = Vec::new();
    collect_tweets(data, &mut candidates);

    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter_map(tweet_to_post)
        .filter(|post| !post.id.is_empty() && seen.insert(post.id.clone()))
        .take(limit.max(1))
        .collect()
}

fn collect_tweets<'a>(node: &'a Value, out: &mut Vec<&'a Value>) {
    match node {
        Value::Object(map) => {
            if let Some(tweet) = map.get("tweet_results").and_then(|r| r.get("result")) {
                if tweet.get("__typename").and_then(Value::as_str) == Some("Tweet") {
                    out.push(tweet);
                }
            }
            for child in map.values() {
                collect_tweets(child, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_tweets(item, out);
            }
        }
        _ => {}
    }
}

fn tweet_to_post(tweet: &Value) -> Option<Post> {
    let legacy = tweet.get("legacy");
    let legacy_str = |key: &str| legacy.and_then(|l| l.get(key)).and_then(Value::as_str);

    let text = tweet
        .pointer("/note_tweet_results/result/text")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .or_else(|| legacy_str("full_text"))
        .unwrap_or_default()
        .trim()
        .to_string();

    let mut photos: Vec<String> = Vec::new();
    for path in ["/legacy/entities/media", "/legacy/extended_entities/media"] {
        let media = tweet.pointer(path).and_then(Value::as_array);
        for url in media.into_iter().flatten().filter_map(|m| m.get("media_url_https")?.as_str()) {
            if !url.is_empty() && !photos.iter().any(|p| p == url) {
                photos.push(url.to_string());
            }
        }
    }

    if text.is_empty() && photos.is_empty() {
        return None;
    }

    let id = match tweet.get("rest_id") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => legacy_str("id_str").unwrap_or_default().to_string(),
    };

    Some(Post {
        id,
        text,
        photos,
        date: legacy_str("created_at").unwrap_or_default().to_string(),
    })
}

/// Timeline client for a RapidAPI-hosted endpoint
#[derive(Debug, Clone)]
pub struct TimelineClient {
    client: Client,
    api_url: String,
    api_key: String,
    api_host: String,
}

impl TimelineClient {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>, api_host: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs.max(1)))
                .build()
                .unwrap_or_default(),
            api_url: api_url.into(),
            api_key: api_key.into(),
            api_host: api_host.into(),
        }
    }

    /// Request URL for `handle`
    pub fn request_url(&self, handle: &str, limit: usize) -> Result<Url, RelayError> {
        let mut url = Url::parse(self.api_url.trim())
            .map_err(|e| RelayError::Config(format!("Invalid timeline API URL '{}': {}", self.api_url, e)))?;
        url.query_pairs_mut()
            .append_pair("username", handle)
            .append_pair("count", &limit.to_string());
        Ok(url)
    }
}

#[async_trait]
impl PostSource for TimelineClient {
    async fn fetch_posts(&self, handle: &str, limit: usize) -> Result<Vec<Post>, RelayError> {
        if self.api_key.trim().is_empty() || self.api_host.trim().is_empty() {
            return Err(RelayError::Config("RapidAPI key and host must be set".to_string()));
        }

        let handle = extract_handle(handle);
        if handle.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.request_url(&handle, limit)?;
        debug!("Fetching timeline for @{}", handle);

        let response = self.client.get(url)
            .header("X-RapidAPI-Key", &self.api_key)
            .header("X-RapidAPI-Host", &self.api_host)
            .send()
            .await
            .map_err(|e| RelayError::Source(format!("Timeline request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Timeline API error ({}): {}", status, body);
            return Err(RelayError::Source(format!("Timeline API responded with {}", status)));
        }

        let data: Value = response.json().await
            .map_err(|e| RelayError::Source(format!("Failed to parse timeline response: {}", e)))?;

        Ok(parse_timeline(&data, limit))
    }
}
