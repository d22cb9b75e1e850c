//! Gemini on Vertex AI, called through the REST `generateContent` method.
//!
//! Request shape:
//!
//! ```json
//! {
//!   "contents": [{"role": "user", "parts": [
//!     {"inlineData": {"mimeType": "image/jpeg", "data": "<base64>"}},
//!     {"text": "<prompt>"}
//!   ]}],
//!   "generationConfig": {"temperature": 0.4}
//! }
//! ```
//!
//! Only `candidates[i].content.parts[0]` of each candidate is read.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use reqwest::Client;
use serde_json::{Value, json};
use tracing::debug;

use super::auth::{StaticToken, TokenSource, resolve_token_source};
use super::{CaptionAnswer, CaptionBackend, CaptionRequest};

/// Longest slice of an error body that ends up in an error message.
const ERROR_BODY_PREVIEW: usize = 500;

/// Where and how to reach the model.
#[derive(Debug, Clone)]
pub struct VertexSettings {
    pub project_id: String,
    pub location: String,
    pub model: String,
    /// Full URL override, e.g. a regional proxy or a local fake.
    pub endpoint: Option<String>,
    /// Sent as `Authorization: Bearer ...` instead of discovered
    /// credentials when present.
    pub access_token: Option<String>,
    /// Timeout for one HTTP call (one attempt).
    pub request_timeout: Duration,
}

impl VertexSettings {
    pub fn endpoint_url(&self) -> String {
        match &self.endpoint {
            Some(url) => url.clone(),
            None => format!(
                "https://{loc}-aiplatform.googleapis.com/v1/projects/{project}/locations/{loc}/publishers/google/models/{model}:generateContent",
                loc = self.location,
                project = self.project_id,
                model = self.model,
            ),
        }
    }
}

/// Production [`CaptionBackend`].
pub struct VertexBackend {
    http: Client,
    url: String,
    tokens: Option<Arc<dyn TokenSource>>,
    model: String,
}

impl VertexBackend {
    /// Backend using only the explicit `access_token`, if any.
    pub fn new(settings: &VertexSettings) -> Result<Self> {
        let http = Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .context("building HTTP client for the model endpoint")?;
        let tokens = settings
            .access_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(|t| Arc::new(StaticToken::new(t)) as Arc<dyn TokenSource>);
        Ok(Self {
            http,
            url: settings.endpoint_url(),
            tokens,
            model: settings.model.clone(),
        })
    }

    /// Backend with credentials resolved from the settings and the
    /// environment (see [`resolve_token_source`]).
    pub async fn connect(settings: &VertexSettings) -> Result<Self> {
        let tokens = resolve_token_source(
            settings.access_token.as_deref(),
            settings.endpoint.is_some(),
        )
        .await?;
        let backend = Self::new(settings)?;
        Ok(match tokens {
            Some(tokens) => backend.with_token_source(tokens),
            None => backend,
        })
    }

    pub fn with_token_source(mut self, tokens: Arc<dyn TokenSource>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Where credentials come from, for startup logs.
    pub fn credentials(&self) -> &str {
        self.tokens.as_deref().map_or("none", |t| t.describe())
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CaptionBackend for VertexBackend {
    async fn generate(&self, request: &CaptionRequest<'_>) -> Result<Vec<CaptionAnswer>> {
        let mut call = self.http.post(&self.url).json(&request_body(request));
        if let Some(tokens) = &self.tokens {
            call = call.bearer_auth(tokens.access_token().await?);
        }

        debug!(url = %self.url, image_bytes = request.image.len(), "Calling generateContent");
        let response = call.send().await.context("sending generateContent request")?;

        let status = response.status();
        let text = response
            .text()
            .await
            .context("reading generateContent response")?;
        if !status.is_success() {
            bail!(
                "model endpoint returned {}: {}",
                status,
                preview(&text, ERROR_BODY_PREVIEW)
            );
        }

        let body: Value =
            serde_json::from_str(&text).context("generateContent response is not JSON")?;
        Ok(parse_candidates(&body))
    }

    fn name(&self) -> &str {
        &self.model
    }
}

fn request_body(request: &CaptionRequest<'_>) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [
                {
                    "inlineData": {
                        "mimeType": request.mime_type(),
                        "data": general_purpose::STANDARD.encode(request.image),
                    }
                },
                { "text": request.prompt }
            ]
        }],
        "generationConfig": { "temperature": request.temperature }
    })
}

/// Candidates without content (e.g. blocked by safety filters) are skipped.
fn parse_candidates(body: &Value) -> Vec<CaptionAnswer> {
    let Some(candidates) = body["candidates"].as_array() else {
        return Vec::new();
    };
    candidates
        .iter()
        .filter_map(|candidate| {
            let part = candidate["content"]["parts"].get(0)?;
            Some(match part["text"].as_str() {
                Some(text) => CaptionAnswer::Text(text.to_string()),
                None => CaptionAnswer::Structured(part.clone()),
            })
        })
        .collect()
}

fn preview(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((cut, _)) => &text[..cut],
        None => text,
    }
}
