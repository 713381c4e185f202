use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, warn};

use super::{ClientError, GeneratedImage, GenerationError, ImageGenerator};
use crate::config::{CREDENTIAL_ENV_VARS, Config};

/// Returned by `advise` when the model answers with no text.
pub const ADVICE_EMPTY_FALLBACK: &str = "Could not produce advice, please try again later.";

/// Returned by `advise` when the request fails.
pub const ADVICE_ERROR_FALLBACK: &str = "Connection error, please check the network or API key.";

const DEFAULT_IMAGE_MIME: &str = "image/png";

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub image_model: String,
    pub advice_model: String,
    pub aspect_ratio: String,
    pub timeout: Duration,
}

impl GeminiSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            api_key: config.credential(),
            base_url: config.generation.base_url.clone(),
            image_model: config.generation.image_model.clone(),
            advice_model: config.generation.advice_model.clone(),
            aspect_ratio: config.generation.aspect_ratio.clone(),
            timeout: Duration::from_secs(config.generation.timeout_secs),
        }
    }
}

/// Client for the Generative Language `generateContent` endpoint.
pub struct GeminiClient {
    client: Client,
    settings: GeminiSettings,
}

impl GeminiClient {
    pub fn new(settings: GeminiSettings) -> Result<Self> {
        let client = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self { client, settings })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(GeminiSettings::from_config(config))
    }

    pub fn has_credential(&self) -> bool {
        self.settings.api_key.is_some()
    }

    pub fn image_model(&self) -> &str {
        &self.settings.image_model
    }

    /// Free-text design advice. Never fails: errors become a fixed message.
    pub async fn advise(&self, prompt: &str) -> String {
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        match self.generate_content(&self.settings.advice_model, &body).await {
            Ok(response) => {
                let text = response.text();
                if text.trim().is_empty() {
                    ADVICE_EMPTY_FALLBACK.to_string()
                } else {
                    text
                }
            }
            Err(e) => {
                warn!("Advice request failed: {}", e);
                ADVICE_ERROR_FALLBACK.to_string()
            }
        }
    }

    async fn generate_content(
        &self,
        model: &str,
        body: &Value,
    ) -> Result<GenerateContentResponse, ClientError> {
        let api_key = self.settings.api_key.as_deref().ok_or_else(|| {
            ClientError::Configuration(format!(
                "API key not found (set generation.api_key or one of {})",
                CREDENTIAL_ENV_VARS.join(", ")
            ))
        })?;

        let url = format!(
            "{}/models/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            model
        );
        debug!("Gemini request to {}: {}", url, body);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(body)
            .send()
            .await
            .map_err(GenerationError::from)?;

        let status = response.status();
        let text = response.text().await.map_err(GenerationError::from)?;

        if !status.is_success() {
            return Err(GenerationError::Service {
                status: status.as_u16(),
                message: service_error_message(&text),
            }
            .into());
        }

        debug!("Gemini response: {} bytes", text.len());

        serde_json::from_str(&text)
            .map_err(|e| GenerationError::Malformed(e.to_string()).into())
    }
}

#[async_trait]
impl ImageGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<Option<GeneratedImage>, ClientError> {
        if prompt.trim().is_empty() {
            return Err(GenerationError::EmptyPrompt.into());
        }

        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "imageConfig": { "aspectRatio": self.settings.aspect_ratio }
            }
        });

        let response = self
            .generate_content(&self.settings.image_model, &body)
            .await?;

        Ok(response.first_image())
    }
}

/// Pull `error.message` out of a Google API error body, or fall back to the raw text.
fn service_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.chars().take(200).collect())
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: Option<String>,
    data: String,
}

impl GenerateContentResponse {
    fn parts(&self) -> &[Part] {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.as_slice())
            .unwrap_or_default()
    }

    /// First inline image part of the first candidate, in order.
    fn first_image(&self) -> Option<GeneratedImage> {
        self.parts().iter().find_map(|part| {
            part.inline_data.as_ref().map(|inline| {
                GeneratedImage::new(
                    inline
                        .mime_type
                        .clone()
                        .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string()),
                    inline.data.clone(),
                )
            })
        })
    }

    fn text(&self) -> String {
        self.parts()
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect::<Vec<_>>()
            .join("")
    }
}
