/*!
 * Sent-history file (`results.json`).
 *
 * The file holds either `{"timestamp": ..., "messages": [...]}` or a bare list
 * of records. Both are read; writes always use the object form. Only
 * `original_text` is needed to recognise duplicates, so foreign or partial
 * records are kept verbatim.
 */

use chrono::Local;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::errors::RelayError;

/// One relayed post as stored in the history file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayRecord {
    /// Origin platform
    pub source: String,
    /// Channel link as configured
    pub channel_link: String,
    /// Category label
    #[serde(rename = "channel_type")]
    pub category: Option<String>,
    /// Bare source handle
    #[serde(rename = "twitter_username")]
    pub handle: String,
    /// Text before translation
    pub original_text: String,
    /// Text after translation
    pub translated_text: String,
    /// Source timestamp
    pub date: String,
    /// Source post id
    #[serde(rename = "message_id")]
    pub post_id: String,
    /// Photo URLs of the post
    #[serde(default)]
    pub photos: Vec<String>,
}

/// Already-sent texts plus the file they came from
#[derive(Debug)]
pub struct SentHistory {
    path: PathBuf,
    sent: HashSet<String>,
}

impl SentHistory {
    /// Read the history at `path`; a missing or corrupt file is empty
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let sent = read_messages(&path)
            .iter()
            .filter_map(|m| m.get("original_text").and_then(Value::as_str))
            .map(str::to_string)
            .collect::<HashSet<_>>();

        debug!("Loaded {} sent texts from {}", sent.len(), path.display());
        Self { path, sent }
    }

    /// Whether `text` was already relayed
    pub fn already_sent(&self, text: &str) -> bool {
        self.sent.contains(text)
    }

    pub fn len(&self) -> usize {
        self.sent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sent.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `records` to the file, rewriting it in object form
    pub fn append(&mut self, records: &[RelayRecord]) -> Result<(), RelayError> {
        let mut messages = read_messages(&self.path);
        for record in records {
            messages.push(serde_json::to_value(record)?);
            self.sent.insert(record.original_text.clone());
        }

        let document = json!({
            "timestamp": Local::now().naive_local().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            "messages": messages,
        });

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&document)?)?;
        debug!("Saved {} records to {}", records.len(), self.path.display());
        Ok(())
    }
}

/// Stored messages in either file shape
fn read_messages(path: &Path) -> Vec<Value> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => return Vec::new(),
    };

    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Object(mut map)) => match map.remove("messages") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        Ok(Value::Array(items)) => items,
        Ok(_) => Vec::new(),
        Err(e) => {
            warn!("History file {} is not valid JSON ({}), treating it as empty", path.display(), e);
            Vec::new()
        }
    }
}
