//! Image generation client seam.
//!
//! `ImageGenerator` is what the session controller talks to; `GeminiClient`
//! is the production implementation over the Generative Language REST API.

mod gemini;

pub use gemini::{ADVICE_EMPTY_FALLBACK, ADVICE_ERROR_FALLBACK, GeminiClient, GeminiSettings};

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::Serialize;
use thiserror::Error;

/// Encoded image as returned inline by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedImage {
    pub mime_type: String,
    /// Base64 payload
    pub data: String,
}

impl GeneratedImage {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Self-describing `data:` URI, ready for an `<img src>`.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(self.data.as_bytes())
    }
}

/// Failure talking to the generation service.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("prompt must not be empty")]
    EmptyPrompt,

    #[error("image service returned HTTP {status}: {message}")]
    Service { status: u16, message: String },

    #[error("request to image service failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response from image service: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum ClientError {
    /// Missing or unusable credential; no request was sent.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

impl ClientError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, ClientError::Configuration(_))
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Render `prompt`. `Ok(None)` means the call succeeded but no image part came back.
    async fn generate(&self, prompt: &str) -> Result<Option<GeneratedImage>, ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_uri_carries_mime_type() {
        let image = GeneratedImage::new("image/webp", "UklGRg==");
        assert_eq!(image.data_uri(), "data:image/webp;base64,UklGRg==");
    }

    #[test]
    fn decode_reports_bad_base64() {
        assert!(GeneratedImage::new("image/png", "%%%").decode().is_err());
        assert_eq!(
            GeneratedImage::new("image/png", "aGk=").decode().unwrap(),
            b"hi".to_vec()
        );
    }

    #[test]
    fn configuration_errors_are_distinguishable() {
        assert!(ClientError::Configuration("no key".into()).is_configuration());
        assert!(!ClientError::from(GenerationError::EmptyPrompt).is_configuration());
    }
}
