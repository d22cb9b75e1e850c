//! Request handlers. Each one parses, makes a single [`GuessService`] call
//! and shapes the response; all decisions live in the service.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;
use tracing::{error, warn};

use super::params::ResizeQuery;
use crate::error::{ErrorSeverity, GuessError, HasSeverity};
use crate::service::{GuessService, ResizeRequest};

const DECODE_FAILED: &str = "we're very sorry, but we were unable to decode this image :(";

pub async fn upload(
    State(service): State<Arc<GuessService>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let uploaded = service.upload(body).await?;
    Ok(PrettyJson(uploaded).into_response())
}

pub async fn resized(
    State(service): State<Arc<GuessService>>,
    Query(query): Query<ResizeQuery>,
) -> Result<Response, ApiError> {
    let request = ResizeRequest::try_from(&query)?;
    let jpeg = service.resized(&request).await?;
    Ok(([(header::CONTENT_TYPE, "image/jpeg")], jpeg).into_response())
}

pub async fn guess(
    State(service): State<Arc<GuessService>>,
    Query(query): Query<ResizeQuery>,
) -> Result<Response, ApiError> {
    let request = ResizeRequest::try_from(&query)?;
    let answer = service.guess(&request).await?;
    Ok(PrettyJson(json!({ "answer": answer })).into_response())
}

pub async fn sample_list(State(service): State<Arc<GuessService>>) -> Result<Response, ApiError> {
    let samples = service.samples().await?;
    Ok(PrettyJson(samples).into_response())
}

/// JSON body indented with two spaces.
pub struct PrettyJson<T>(pub T);

impl<T: Serialize> IntoResponse for PrettyJson<T> {
    fn into_response(self) -> Response {
        match serde_json::to_string_pretty(&self.0) {
            Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
            Err(e) => {
                error!(error = %e, "Failed to serialize response");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// A [`GuessError`] on its way out as a plain-text HTTP error.
#[derive(Debug)]
pub struct ApiError(pub GuessError);

impl From<GuessError> for ApiError {
    fn from(error: GuessError) -> Self {
        Self(error)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    /// Text shown to the caller. Server-side details stay in the logs.
    pub fn message(&self) -> String {
        match &self.0 {
            GuessError::Decode { .. } => DECODE_FAILED.to_string(),
            GuessError::NotFound { .. } | GuessError::InvalidSpec { .. } => self.0.to_string(),
            GuessError::Inference { .. } => "error accessing Vertex AI".to_string(),
            GuessError::Io { .. } => "unable to open sample".to_string(),
            _ => "internal server error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error = &self.0;
        match error.severity() {
            ErrorSeverity::Warning => {
                warn!(category = error.category(), error = %error, "Rejected request")
            }
            ErrorSeverity::Error => {
                error!(category = error.category(), error = %error, "Request failed")
            }
            ErrorSeverity::Fatal => error!(
                category = error.category(),
                error = %error,
                "Invariant violated: failed to encode an image we produced"
            ),
        }
        (self.status(), format!("{}\n", self.message())).into_response()
    }
}
