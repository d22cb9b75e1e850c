//! Bearer tokens for the model endpoint.
//!
//! A token is fetched for every call, so expiring credentials (Application
//! Default Credentials, the metadata server on Cloud Run) refresh on their
//! own. A token given on the command line is sent as-is.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{info, warn};

/// OAuth scope accepted by Vertex AI.
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Anything that can hand out a bearer token for the next request.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String>;

    /// Short label for logs.
    fn describe(&self) -> &str;
}

/// A fixed token, e.g. from `GOOGLE_ACCESS_TOKEN`.
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }

    fn describe(&self) -> &str {
        "static access token"
    }
}

/// Google credentials discovered from the environment: a service account
/// key file, gcloud user credentials or the metadata server.
pub struct GoogleCredentials {
    provider: Arc<dyn gcp_auth::TokenProvider>,
}

impl GoogleCredentials {
    pub async fn discover() -> Result<Self> {
        let provider = gcp_auth::provider()
            .await
            .context("no Google Application Default Credentials found")?;
        Ok(Self { provider })
    }
}

#[async_trait]
impl TokenSource for GoogleCredentials {
    async fn access_token(&self) -> Result<String> {
        let token = self
            .provider
            .token(&[CLOUD_PLATFORM_SCOPE])
            .await
            .context("fetching Google access token")?;
        Ok(token.as_str().to_string())
    }

    fn describe(&self) -> &str {
        "application default credentials"
    }
}

/// Picks the credentials for a backend.
///
/// An explicit token always wins. Without one, the public Vertex endpoint
/// requires discovered credentials, while a custom endpoint falls back to
/// unauthenticated calls when none are found.
pub async fn resolve_token_source(
    access_token: Option<&str>,
    custom_endpoint: bool,
) -> Result<Option<Arc<dyn TokenSource>>> {
    if let Some(token) = access_token.filter(|t| !t.is_empty()) {
        return Ok(Some(Arc::new(StaticToken::new(token))));
    }
    match GoogleCredentials::discover().await {
        Ok(credentials) => {
            info!("Using Google application default credentials");
            Ok(Some(Arc::new(credentials)))
        }
        Err(e) if custom_endpoint => {
            warn!(error = %format!("{e:#}"), "Calling custom model endpoint without credentials");
            Ok(None)
        }
        Err(e) => Err(e.context("set GOOGLE_ACCESS_TOKEN or configure gcloud credentials")),
    }
}
