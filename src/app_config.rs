use anyhow::{anyhow, Context, Result};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::Path;
use std::sync::Arc;

use crate::formatting::surface::{SurfaceLimit, SurfaceLimits};
use crate::formatting::{AssistantSelector, ChunkAssembler};
use crate::providers::gemini::{Gemini, DEFAULT_GEMINI_ENDPOINT};

/// Application configuration module
/// This module handles loading, environment overrides, validation and saving
/// of the relay configuration (`conf.json`).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Length budgets per delivery surface
    #[serde(default)]
    pub surfaces: SurfaceLimits,

    /// Text-reasoning assistant used for splitting and translation
    #[serde(default)]
    pub assistant: AssistantConfig,

    /// Boundary selector settings
    #[serde(default)]
    pub selector: SelectorConfig,

    /// Translation settings
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Delivery bot settings
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Timeline source settings
    #[serde(default)]
    pub source: SourceConfig,

    /// Channels to relay, in processing order
    #[serde(default)]
    pub channels: Vec<ChannelConfig>,

    /// Sent-history file
    #[serde(default = "default_history_path")]
    pub history_path: String,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Assistant provider type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AssistantProvider {
    /// Google Generative Language API
    #[default]
    Gemini,
}

impl AssistantProvider {
    pub fn display_name(&self) -> &str {
        match self {
            Self::Gemini => "Gemini",
        }
    }
}

impl std::fmt::Display for AssistantProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gemini => write!(f, "gemini"),
        }
    }
}

impl std::str::FromStr for AssistantProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Assistant service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AssistantConfig {
    /// Provider type
    #[serde(default)]
    pub provider: AssistantProvider,

    /// Model name
    #[serde(default = "default_gemini_model")]
    pub model: String,

    /// API key; empty disables the selector and translation
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Service endpoint URL
    #[serde(default = "default_gemini_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_assistant_timeout_secs")]
    pub timeout_secs: u64,

    /// Temperature for translation requests
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            provider: AssistantProvider::default(),
            model: default_gemini_model(),
            api_key: String::new(),
            endpoint: default_gemini_endpoint(),
            timeout_secs: default_assistant_timeout_secs(),
            temperature: default_temperature(),
        }
    }
}

impl AssistantConfig {
    /// Whether an API key is present
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Build the provider client described by this configuration
    pub fn build_provider(&self) -> Gemini {
        match self.provider {
            AssistantProvider::Gemini => Gemini::new(
                self.api_key.trim(),
                self.endpoint.clone(),
                self.model.clone(),
                self.timeout_secs,
            ),
        }
    }
}

/// Boundary selector settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SelectorConfig {
    /// Ask the assistant for split points before the heuristic splitter
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Temperature for split requests (provider default when unset)
    #[serde(default)]
    pub temperature: Option<f32>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            temperature: None,
        }
    }
}

/// One fixed replacement the translation must apply
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GlossaryEntry {
    /// Source phrase
    pub term: String,
    /// Required rendering in the target language
    pub replacement: String,
}

impl GlossaryEntry {
    pub fn new(term: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            replacement: replacement.into(),
        }
    }
}

/// Translation settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Target language code (ISO)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Fixed term replacements
    #[serde(default = "default_glossary")]
    pub glossary: Vec<GlossaryEntry>,

    /// Free-form tone and style instructions, one per line
    #[serde(default = "default_style_notes")]
    pub style_notes: Vec<String>,

    /// Attempts per translation
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff base for retries (in milliseconds), doubled on each attempt
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            target_language: default_target_language(),
            glossary: default_glossary(),
            style_notes: default_style_notes(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

/// Delivery bot settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TelegramConfig {
    /// Bot token
    #[serde(default = "String::new")]
    pub bot_token: String,

    /// Destination chat or channel id
    #[serde(default = "String::new")]
    pub chat_id: String,

    /// Bot API base URL
    #[serde(default = "default_telegram_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: String::new(),
            endpoint: default_telegram_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Timeline source settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SourceConfig {
    /// Timeline endpoint URL
    #[serde(default = "String::new")]
    pub api_url: String,

    /// RapidAPI key
    #[serde(default = "String::new")]
    pub api_key: String,

    /// RapidAPI host header
    #[serde(default = "String::new")]
    pub api_host: String,

    /// Posts fetched per channel
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: usize,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            api_key: String::new(),
            api_host: String::new(),
            fetch_limit: default_fetch_limit(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// One relayed channel
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChannelConfig {
    /// Profile URL or handle
    pub link: String,

    /// Category label shown as the tag of each post
    #[serde(default)]
    pub category: Option<String>,
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            Self::Error => LevelFilter::Error,
            Self::Warn => LevelFilter::Warn,
            Self::Info => LevelFilter::Info,
            Self::Debug => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
        }
    }
}

fn default_history_path() -> String {
    "results.json".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_gemini_endpoint() -> String {
    DEFAULT_GEMINI_ENDPOINT.to_string()
}

fn default_assistant_timeout_secs() -> u64 {
    60
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_temperature() -> f32 {
    0.2
}

fn default_true() -> bool {
    true
}

fn default_target_language() -> String {
    "ms".to_string()
}

fn default_glossary() -> Vec<GlossaryEntry> {
    vec![
        GlossaryEntry::new("Market Events", "Update Pasaran"),
        GlossaryEntry::new("Top Mindshare Gainers", "Projek Crypto Viral Hari Ini"),
        GlossaryEntry::new("ref", "sumber"),
    ]
}

fn default_style_notes() -> Vec<String> {
    [
        "Use natural, conversational, friendly language, like how a friend shares info.",
        "Keep it simple, relaxed, and easy to understand.",
        "Avoid exaggerated slang or interjections.",
        "No shouting words or unnecessary excitement.",
        "Keep it informative, approachable, and casual, but clean and neutral.",
        "Do not use emojis unless they appear in the original text.",
        "References such as ref0, ref1, ref2 become SUMBER: 0 1 2.",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_retry_count() -> u32 {
    5
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_telegram_endpoint() -> String {
    "https://api.telegram.org".to_string()
}

fn default_fetch_limit() -> usize {
    1
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Write configuration as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))
    }

    /// Apply secrets and tunables from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`; blank values are ignored
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(v) = get("GEMINI_API_KEY") {
            self.assistant.api_key = v;
        }
        if let Some(v) = get("GEMINI_MODEL_NAME") {
            self.assistant.model = v;
        }
        if let Some(v) = get("TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = v;
        }
        if let Some(v) = get("TELEGRAM_CHAT_ID") {
            self.telegram.chat_id = v;
        }
        if let Some(v) = get("RAPIDAPI_KEY") {
            self.source.api_key = v;
        }
        if let Some(v) = get("RAPIDAPI_HOST") {
            self.source.api_host = v;
        }
        if let Some(v) = get("TWITTER_API_URL") {
            self.source.api_url = v;
        }
        if let Some(v) = get("TWITTER_FETCH_LIMIT") {
            self.source.fetch_limit = v.parse()
                .with_context(|| format!("TWITTER_FETCH_LIMIT is not a number: {}", v))?;
        }

        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        Self::validate_surface("message", &self.surfaces.message)?;
        Self::validate_surface("caption", &self.surfaces.caption)?;

        crate::language_utils::validate_language_code(&self.translation.target_language)?;

        if self.translation.retry_count == 0 {
            return Err(anyhow!("translation.retry_count must be at least 1"));
        }

        if let Some(t) = self.selector.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(anyhow!("selector.temperature must be between 0.0 and 2.0, got {}", t));
            }
        }

        if !(0.0..=2.0).contains(&self.assistant.temperature) {
            return Err(anyhow!("assistant.temperature must be between 0.0 and 2.0, got {}", self.assistant.temperature));
        }

        Ok(())
    }

    /// Validate everything needed by a relay run
    pub fn validate_for_run(&self) -> Result<()> {
        self.validate()?;

        if self.telegram.bot_token.trim().is_empty() || self.telegram.chat_id.trim().is_empty() {
            return Err(anyhow!("Telegram bot token and chat id are required (TELEGRAM_BOT_TOKEN, TELEGRAM_CHAT_ID)"));
        }

        if self.source.api_url.trim().is_empty() {
            return Err(anyhow!("Timeline API URL is required (TWITTER_API_URL)"));
        }

        if self.source.api_key.trim().is_empty() || self.source.api_host.trim().is_empty() {
            return Err(anyhow!("RapidAPI key and host are required (RAPIDAPI_KEY, RAPIDAPI_HOST)"));
        }

        if self.channels.is_empty() {
            return Err(anyhow!("No channels configured"));
        }

        Ok(())
    }

    /// Chunk assembler for the configured limits.
    ///
    /// The assistant selector is only installed when requested and an API key
    /// is present.
    pub fn build_assembler(&self, use_selector: bool) -> ChunkAssembler {
        let assembler = ChunkAssembler::new(self.surfaces);
        if !use_selector || !self.assistant.is_configured() {
            return assembler;
        }

        let mut selector = AssistantSelector::new(self.assistant.build_provider());
        if let Some(temperature) = self.selector.temperature {
            selector = selector.with_temperature(temperature);
        }
        assembler.with_selector(Arc::new(selector))
    }

    fn validate_surface(name: &str, limit: &SurfaceLimit) -> Result<()> {
        if limit.safety_margin >= limit.hard_limit {
            return Err(anyhow!(
                "{} safety margin ({}) must be smaller than its hard limit ({})",
                name, limit.safety_margin, limit.hard_limit
            ));
        }
        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            surfaces: SurfaceLimits::default(),
            assistant: AssistantConfig::default(),
            selector: SelectorConfig::default(),
            translation: TranslationConfig::default(),
            telegram: TelegramConfig::default(),
            source: SourceConfig::default(),
            channels: Vec::new(),
            history_path: default_history_path(),
            log_level: LogLevel::default(),
        }
    }
}
