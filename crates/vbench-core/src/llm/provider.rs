//! Model client trait and request/response types.
//!
//! Defines the single call the sweep makes against a generative model:
//! one image plus one prompt in, the text of the first candidate out.

use crate::error::ModelError;
use async_trait::async_trait;
use base64::Engine;

/// Base64-encoded image ready to send to a model API.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// Base64-encoded image bytes
    pub data: String,
    /// MIME type (e.g., "image/jpeg", "image/png")
    pub media_type: String,
}

impl ImageInput {
    /// Create an `ImageInput` from raw bytes and a file extension.
    pub fn from_bytes(bytes: &[u8], format: &str) -> Self {
        let media_type = match format {
            "jpeg" | "jpg" => "image/jpeg",
            "png" => "image/png",
            "webp" => "image/webp",
            "gif" => "image/gif",
            "heic" => "image/heic",
            other => {
                tracing::warn!("Unknown image format '{other}', defaulting to image/jpeg");
                "image/jpeg"
            }
        };

        Self {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            media_type: media_type.to_string(),
        }
    }
}

/// One generation request: an image and the composed prompt.
#[derive(Debug, Clone)]
pub struct ModelRequest<'a> {
    pub image: &'a ImageInput,
    pub prompt: &'a str,
}

/// Text of the first part of the first candidate.
#[derive(Debug, Clone)]
pub struct ModelResponse {
    pub text: String,
    /// Wall time of the call that produced this response
    pub latency_ms: f64,
}

/// A generative model service.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (the driver holds a `&dyn ModelClient`).
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Client name for logging.
    fn name(&self) -> &str;

    /// Invoke `model` exactly once. Rate limiting surfaces as
    /// [`ModelError::QuotaExceeded`]; everything else as
    /// [`ModelError::Transport`].
    async fn generate(
        &self,
        model: &str,
        request: &ModelRequest<'_>,
    ) -> Result<ModelResponse, ModelError>;
}

/// Resolve `${ENV_VAR}` references in config strings.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok().filter(|v| !v.is_empty())
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
