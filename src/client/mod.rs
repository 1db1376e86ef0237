//! Generative content service client
//!
//! The pipeline talks to the service through [`ContentApi`], a client bound
//! to one API key. A [`ClientFactory`] builds such clients so the generator
//! can rebind whenever the key pool rotates.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

pub mod gemini;
#[cfg(test)]
pub mod mock;

pub use gemini::{GeminiClient, GeminiConnector};
#[cfg(test)]
#[allow(unused_imports)]
pub use mock::{MockClientFactory, MockReply};

/// Upper bound for a single HTTP exchange. The generator applies its own,
/// usually tighter, per-attempt timeout on top.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Result type for upstream calls
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// A client bound to a single API key
#[async_trait]
pub trait ContentApi: Send + Sync {
    /// Send a prompt and return the raw generated text
    async fn generate_content(&self, prompt: &str) -> ApiResult<String>;
}

/// Builds clients bound to a given API key
pub trait ClientFactory: Send + Sync {
    type Client: ContentApi;

    fn connect(&self, api_key: &str) -> ApiResult<Self::Client>;
}

/// `generateContent` request body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

impl GenerateContentRequest {
    pub fn from_prompt(prompt: &str, generation_config: GenerationConfig) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config,
        }
    }
}

/// Sampling parameters sent with every request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

/// A turn of conversation content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// `generateContent` response body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate
    pub fn text(&self) -> ApiResult<String> {
        let Some(candidate) = self.candidates.first() else {
            let reason = self
                .prompt_feedback
                .as_ref()
                .and_then(|f| f.block_reason.clone())
                .unwrap_or_else(|| "no candidates returned".to_string());
            return Err(ApiError::InvalidResponse(format!("Empty response: {reason}")));
        };

        let text: String = candidate
            .content
            .iter()
            .flat_map(|c| c.parts.iter())
            .filter_map(|p| p.text.as_deref())
            .collect();

        if text.trim().is_empty() {
            let reason = candidate
                .finish_reason
                .clone()
                .unwrap_or_else(|| "UNKNOWN".to_string());
            return Err(ApiError::InvalidResponse(format!(
                "Candidate has no text (finish reason {reason})"
            )));
        }
        Ok(text)
    }
}
