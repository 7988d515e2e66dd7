/*!
 * Delivery of rendered segments through the Telegram Bot API.
 *
 * Sends are single attempts: a failed segment is reported to the caller and
 * never retried here.
 */

use async_trait::async_trait;
use bytes::Bytes;
use log::{debug, error};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::errors::{ProviderError, RelayError};
use crate::formatting::{RenderedSegment, Surface};

/// Capability to deliver rendered segments
#[async_trait]
pub trait Sender: Send + Sync {
    /// Send an HTML text message
    async fn send_message(&self, html: &str) -> Result<(), RelayError>;

    /// Send a photo with an HTML caption
    async fn send_photo(&self, image: Bytes, caption_html: &str) -> Result<(), RelayError>;

    /// Send one segment; caption segments carry the image when one is given
    async fn send_segment(&self, segment: &RenderedSegment, image: Option<&Bytes>) -> Result<(), RelayError> {
        match (segment.surface, image) {
            (Surface::Caption, Some(image)) => self.send_photo(image.clone(), &segment.text).await,
            _ => self.send_message(&segment.text).await,
        }
    }
}

/// Capability to fetch an attached image
#[async_trait]
pub trait ImageDownloader: Send + Sync {
    async fn download(&self, url: &str) -> Result<Bytes, RelayError>;
}

/// Fetch the bytes at `url`
pub async fn download_image(client: &Client, url: &str) -> Result<Bytes, RelayError> {
    let response = client.get(url)
        .send()
        .await
        .map_err(|e| RelayError::Provider(ProviderError::from_transport(e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(RelayError::Provider(ProviderError::from_status(
            status.as_u16(),
            format!("image download failed: {}", url),
        )));
    }

    response.bytes().await
        .map_err(|e| RelayError::Provider(ProviderError::from_transport(e)))
}

/// Image downloader over HTTP
#[derive(Debug, Clone)]
pub struct HttpImageDownloader {
    client: Client,
}

impl HttpImageDownloader {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs.max(1)))
                .build()
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl ImageDownloader for HttpImageDownloader {
    async fn download(&self, url: &str) -> Result<Bytes, RelayError> {
        download_image(&self.client, url).await
    }
}

/// sendMessage request body
#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
    disable_web_page_preview: bool,
}

/// Envelope of every Bot API response
#[derive(Debug, Deserialize)]
pub struct TelegramResponse {
    /// Whether the call succeeded
    pub ok: bool,
    /// Error description when `ok` is false
    #[serde(default)]
    pub description: Option<String>,
    /// Error code when `ok` is false
    #[serde(default)]
    pub error_code: Option<u16>,
}

/// Telegram Bot API client
#[derive(Clone)]
pub struct TelegramSender {
    client: Client,
    endpoint: String,
    bot_token: String,
    chat_id: String,
}

impl std::fmt::Debug for TelegramSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramSender")
            .field("endpoint", &self.endpoint)
            .field("chat_id", &self.chat_id)
            .field("bot_token", &"<redacted>")
            .finish()
    }
}

impl TelegramSender {
    pub fn new(endpoint: impl Into<String>, bot_token: impl Into<String>, chat_id: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs.max(1)))
                .build()
                .unwrap_or_default(),
            endpoint: endpoint.into(),
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
        }
    }

    /// URL of a Bot API method
    pub fn method_url(&self, method: &str) -> Result<Url, RelayError> {
        let base = Url::parse(self.endpoint.trim())
            .map_err(|e| RelayError::Config(format!("Invalid Telegram endpoint '{}': {}", self.endpoint, e)))?;
        base.join(&format!("/bot{}/{}", self.bot_token, method))
            .map_err(|e| RelayError::Config(format!("Invalid Telegram method URL: {}", e)))
    }

    fn ensure_configured(&self) -> Result<(), RelayError> {
        if self.bot_token.trim().is_empty() || self.chat_id.trim().is_empty() {
            return Err(RelayError::Config("Telegram bot token or chat id is not set".to_string()));
        }
        Ok(())
    }

    async fn check_response(method: &str, response: reqwest::Response) -> Result<(), RelayError> {
        let status = response.status();
        let body = response.text().await
            .unwrap_or_else(|_| "Failed to get error response text".to_string());

        let parsed: Option<TelegramResponse> = serde_json::from_str(&body).ok();
        match parsed {
            Some(r) if r.ok && status.is_success() => Ok(()),
            Some(r) => {
                let message = r.description.unwrap_or(body);
                error!("Telegram {} error ({}): {}", method, status, message);
                Err(ProviderError::ApiError {
                    status_code: r.error_code.unwrap_or(status.as_u16()),
                    message,
                }.into())
            }
            None => {
                error!("Telegram {} error ({}): {}", method, status, body);
                Err(ProviderError::from_status(status.as_u16(), body).into())
            }
        }
    }
}

#[async_trait]
impl Sender for TelegramSender {
    async fn send_message(&self, html: &str) -> Result<(), RelayError> {
        self.ensure_configured()?;

        let request = SendMessageRequest {
            chat_id: &self.chat_id,
            text: html,
            parse_mode: "HTML",
            disable_web_page_preview: false,
        };

        let response = self.client.post(self.method_url("sendMessage")?)
            .json(&request)
            .send()
            .await
            .map_err(ProviderError::from_transport)?;

        Self::check_response("sendMessage", response).await?;
        debug!("Message sent ({} chars)", html.chars().count());
        Ok(())
    }

    async fn send_photo(&self, image: Bytes, caption_html: &str) -> Result<(), RelayError> {
        self.ensure_configured()?;

        let photo = Part::bytes(image.to_vec())
            .file_name("photo.jpg")
            .mime_str("image/jpeg")
            .map_err(|e| RelayError::Provider(ProviderError::RequestFailed(e.to_string())))?;

        let form = Form::new()
            .text("chat_id", self.chat_id.clone())
            .text("caption", caption_html.to_string())
            .text("parse_mode", "HTML")
            .part("photo", photo);

        let response = self.client.post(self.method_url("sendPhoto")?)
            .multipart(form)
            .send()
            .await
            .map_err(ProviderError::from_transport)?;

        Self::check_response("sendPhoto", response).await?;
        debug!("Photo sent (caption {} chars)", caption_html.chars().count());
        Ok(())
    }
}
