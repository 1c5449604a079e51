//! Generated comfort messages.
//!
//! Asks a Gemini `generateContent` endpoint for a short, warm reply to a
//! worry. Generation is best-effort: [`ComfortClient::comfort`] never fails
//! and answers with [`FALLBACK_MESSAGE`] whenever the service can't help.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AppConfig;

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Used whenever generation fails.
pub const FALLBACK_MESSAGE: &str = "괜찮아요, 모든 것이 잘 될 거예요. 당신은 혼자가 아니에요.";

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("no API key configured")]
    MissingApiKey,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unauthorized: API key rejected")]
    Unauthorized,

    #[error("Server error: {0}")]
    Server(String),

    #[error("response contained no text")]
    Empty,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<RequestContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<Part>,
}

/// Client for the comfort-text service.
#[derive(Debug, Clone)]
pub struct ComfortClient {
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: Client,
}

impl ComfortClient {
    pub fn from_config(config: &AppConfig) -> Self {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .unwrap_or_default();
        Self {
            client,
            ..Self::new(DEFAULT_ENDPOINT, config.gemini_api_key.clone())
        }
    }

    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key,
            client: Client::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// A comforting reply to `worry_text`, or the fallback message.
    pub async fn comfort(&self, worry_text: &str) -> String {
        match self.generate(worry_text).await {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("Comfort generation failed, using fallback: {}", e);
                FALLBACK_MESSAGE.to_string()
            }
        }
    }

    /// Ask the service once. No retries.
    pub async fn generate(&self, worry_text: &str) -> Result<String, GenerateError> {
        let api_key = self.api_key.as_deref().ok_or(GenerateError::MissingApiKey)?;

        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![Part {
                    text: prompt_for(worry_text),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.8,
                top_p: 1.0,
                top_k: 32,
                max_output_tokens: 150,
            },
        };

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GenerateError::Unauthorized,
                _ => GenerateError::Server(format!("{}: {}", status, body)),
            });
        }

        let body: GenerateResponse = response.json().await?;
        let text: String = body
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .map(|p| p.text)
            .collect::<Vec<_>>()
            .join("");
        let text = text.trim();
        if text.is_empty() {
            return Err(GenerateError::Empty);
        }
        Ok(text.to_string())
    }
}

fn prompt_for(worry_text: &str) -> String {
    format!(
        "사용자가 \"{}\"에 대해 걱정하고 있습니다. 현명하고 다정한 친구가 직접 말을 건네는 말투로, \
         이 걱정을 달래 주는 짧고 따뜻한 위로의 말을 한국어 1~2문장으로 써 주세요.",
        worry_text
    )
}
