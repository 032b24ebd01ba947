//! Vertex AI client using the `generateContent` REST endpoint.
//!
//! Sends the prompt text and the inline base64 image as two parts of a single
//! user turn and returns the text of the first part of the first candidate.

use super::provider::{resolve_env_var, ModelClient, ModelRequest, ModelResponse};
use crate::config::VertexConfig;
use crate::error::{ConfigError, ModelError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Region used when none is configured.
pub const DEFAULT_LOCATION: &str = "us-central1";

/// Project, region and credentials, resolved from the environment once at startup.
#[derive(Clone)]
pub struct VertexSettings {
    pub project: String,
    pub location: String,
    pub access_token: String,
    /// API base URL without trailing slash
    pub base_url: String,
}

impl VertexSettings {
    /// Resolve `${ENV_VAR}` references in the config section.
    pub fn resolve(config: &VertexConfig) -> Result<Self, ConfigError> {
        let project = resolve_env_var(&config.project).ok_or_else(|| {
            ConfigError::MissingSetting {
                setting: "vertex.project".to_string(),
                hint: "Set GOOGLE_CLOUD_PROJECT or vertex.project in the config file.".to_string(),
            }
        })?;
        let location =
            resolve_env_var(&config.location).unwrap_or_else(|| DEFAULT_LOCATION.to_string());
        let access_token = resolve_env_var(&config.access_token).ok_or_else(|| {
            ConfigError::MissingSetting {
                setting: "vertex.access_token".to_string(),
                hint: "Set VERTEX_ACCESS_TOKEN (e.g. from `gcloud auth print-access-token`)."
                    .to_string(),
            }
        })?;
        let base_url = resolve_env_var(&config.endpoint)
            .unwrap_or_else(|| format!("https://{location}-aiplatform.googleapis.com"));

        Ok(Self {
            project,
            location,
            access_token,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl fmt::Debug for VertexSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VertexSettings")
            .field("project", &self.project)
            .field("location", &self.location)
            .field("access_token", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Vertex AI Gemini client.
pub struct VertexClient {
    settings: VertexSettings,
    client: reqwest::Client,
}

impl VertexClient {
    pub fn new(settings: &VertexSettings) -> Self {
        Self {
            settings: settings.clone(),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, model: &str) -> String {
        format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:generateContent",
            self.settings.base_url, self.settings.project, self.settings.location, model
        )
    }
}

// --- Request types ---

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    Text {
        text: &'a str,
    },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

impl<'a> GenerateContentRequest<'a> {
    fn from_request(request: &'a ModelRequest<'a>) -> Self {
        Self {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![
                    RequestPart::Text {
                        text: request.prompt,
                    },
                    RequestPart::Inline {
                        inline_data: InlineData {
                            mime_type: &request.image.media_type,
                            data: &request.image.data,
                        },
                    },
                ],
            }],
        }
    }
}

// --- Response types ---

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first part of the first candidate.
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
    }
}

#[async_trait]
impl ModelClient for VertexClient {
    fn name(&self) -> &str {
        "vertex"
    }

    async fn generate(
        &self,
        model: &str,
        request: &ModelRequest<'_>,
    ) -> Result<ModelResponse, ModelError> {
        let start = Instant::now();
        let body = GenerateContentRequest::from_request(request);

        let resp = self
            .client
            .post(self.url(model))
            .bearer_auth(&self.settings.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| ModelError::Transport {
                model: model.to_string(),
                message: format!("Vertex request failed: {e}"),
                status_code: None,
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ModelError::from_status(model, status.as_u16(), &text));
        }

        let parsed: GenerateContentResponse =
            resp.json().await.map_err(|e| ModelError::Transport {
                model: model.to_string(),
                message: format!("Failed to decode Vertex response: {e}"),
                status_code: Some(status.as_u16()),
            })?;

        let text = parsed.first_text().ok_or_else(|| ModelError::Transport {
            model: model.to_string(),
            message: "Vertex returned no text in the first candidate".to_string(),
            status_code: Some(status.as_u16()),
        })?;

        Ok(ModelResponse {
            text,
            latency_ms: start.elapsed().as_secs_f64() * 1000.0,
        })
    }
}
