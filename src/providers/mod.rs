/*!
 * Provider implementations for text-reasoning assistants.
 *
 * This module contains client implementations used by the boundary selector
 * and the translator:
 * - Gemini: Google Generative Language API integration
 * - Mock: scripted provider for tests
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Text-reasoning assistant reachable with a single prompt
///
/// Both the boundary selector and the translator only need `generate`; the
/// request and response types stay provider specific.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Wire request
    type Request: Send + Sync;

    /// Wire response
    type Response: Send + Sync;

    /// Send `request` and wait for the full response
    ///
    /// # Returns
    /// * The decoded response, or a `ProviderError` for transport, status or decoding failures
    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError>;

    /// Build a single-turn request from a prompt
    fn text_request(&self, prompt: &str, temperature: Option<f32>) -> Self::Request;

    /// Reply text carried by `response`
    fn extract_text(response: &Self::Response) -> String;

    /// Whether credentials for this provider are present
    fn is_configured(&self) -> bool {
        true
    }

    /// Send one prompt and return the reply text
    async fn generate(&self, prompt: &str, temperature: Option<f32>) -> Result<String, ProviderError> {
        let request = self.text_request(prompt, temperature);
        let response = self.complete(request).await?;
        Ok(Self::extract_text(&response))
    }
}

pub mod gemini;
pub mod mock;
