/*!
 * Translation of source posts through the assistant.
 *
 * Unlike the boundary selector, translation retries with exponential backoff:
 * failed attempt `n` (counting from one) is followed by a pause of
 * `retry_backoff_ms * 2^n` unless it was the last one.
 */

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, warn};
use std::time::Duration;

use crate::app_config::{GlossaryEntry, TranslationConfig};
use crate::errors::{ProviderError, RelayError};
use crate::language_utils;
use crate::providers::Provider;

/// Capability to translate post text
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text`; blank input yields an empty string without a call
    async fn translate(&self, text: &str) -> Result<String, RelayError>;
}

/// Translator backed by a text-reasoning provider
#[derive(Debug)]
pub struct AssistantTranslator<P: Provider> {
    provider: P,
    language_name: String,
    glossary: Vec<GlossaryEntry>,
    style_notes: Vec<String>,
    temperature: f32,
    retry_count: u32,
    retry_backoff_ms: u64,
}

impl<P: Provider> AssistantTranslator<P> {
    /// Create a translator for the configured target language
    pub fn new(provider: P, config: &TranslationConfig, temperature: f32) -> Result<Self> {
        Ok(Self {
            provider,
            language_name: language_utils::get_language_name(&config.target_language)?,
            glossary: config.glossary.clone(),
            style_notes: config.style_notes.clone(),
            temperature,
            retry_count: config.retry_count.max(1),
            retry_backoff_ms: config.retry_backoff_ms,
        })
    }

    /// Full instruction for `text`
    pub fn build_prompt(&self, text: &str) -> String {
        let mut prompt = format!(
            "Translate this text into {}.\n\nOnly return the translated text without any explanation.\n",
            self.language_name
        );

        for note in self.style_notes.iter().filter(|n| !n.trim().is_empty()) {
            prompt.push_str(note.trim());
            prompt.push('\n');
        }

        for entry in &self.glossary {
            prompt.push_str(&format!(
                "For the specific term \"{}\", translate it into \"{}\".\n",
                entry.term, entry.replacement
            ));
        }

        prompt.push_str("Do not translate brand names or product names.\n\n");
        prompt.push_str("Text:\n");
        prompt.push_str(text);
        prompt
    }

    fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(2u64.saturating_pow(attempt)))
    }
}

#[async_trait]
impl<P: Provider> Translator for AssistantTranslator<P> {
    async fn translate(&self, text: &str) -> Result<String, RelayError> {
        if text.trim().is_empty() {
            warn!("Empty text received for translation");
            return Ok(String::new());
        }

        if !self.provider.is_configured() {
            return Err(RelayError::Config("assistant API key is missing".to_string()));
        }

        let prompt = self.build_prompt(text);
        let mut last_error = ProviderError::ParseError("no translation attempt made".to_string());

        for attempt in 0..self.retry_count {
            match self.provider.generate(&prompt, Some(self.temperature)).await {
                Ok(reply) if !reply.trim().is_empty() => {
                    debug!("Translation completed on attempt {}", attempt + 1);
                    return Ok(reply.trim().to_string());
                }
                Ok(_) => {
                    warn!("Empty translation on attempt {}/{}", attempt + 1, self.retry_count);
                    last_error = ProviderError::ParseError("empty translation".to_string());
                }
                Err(e) => {
                    warn!("Translation attempt {}/{} failed: {}", attempt + 1, self.retry_count, e);
                    last_error = e;
                }
            }

            if attempt + 1 < self.retry_count {
                tokio::time::sleep(self.backoff(attempt + 1)).await;
            }
        }

        Err(RelayError::Provider(last_error))
    }
}
