use reqwest::{header::CONTENT_TYPE, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use thiserror::Error;
use tracing::{error, warn};

use crate::upload::ValidationError;

/// Bodies shorter than this are folded into the error message.
const SHORT_BODY_LIMIT: usize = 100;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("Server returned invalid JSON: {0}")]
    InvalidJson(String),
    #[error("Server returned non-JSON data (status {status}, content-type: {content_type})")]
    NonJson { status: u16, content_type: String },
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Network(e.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

fn is_json(content_type: &str) -> bool {
    content_type.contains("application/json")
}

// Error bodies can be whole HTML pages.
fn preview(body: &str) -> &str {
    match body.char_indices().nth(500) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

/// Decodes a success payload or turns the response into an [`ApiError`].
pub async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let body = response.text().await?;
    parse_body(status, &content_type, &body)
}

pub fn parse_body<T: DeserializeOwned>(status: StatusCode, content_type: &str, body: &str) -> Result<T, ApiError> {
    if !status.is_success() {
        return Err(classify_failure(status, content_type, body));
    }

    if !is_json(content_type) {
        error!("❌ Expected JSON but got status={} content-type={:?} body={}", status, content_type, preview(body));
        return Err(ApiError::NonJson { status: status.as_u16(), content_type: content_type.to_string() });
    }

    serde_json::from_str(body).map_err(|e| {
        error!("❌ Failed to decode JSON response (status={}): {} body={}", status, e, preview(body));
        ApiError::InvalidJson(e.to_string())
    })
}

fn classify_failure(status: StatusCode, content_type: &str, body: &str) -> ApiError {
    let code = status.as_u16();
    let generic = || format!("Server error: {}", code);
    error!("❌ Request failed: status={} content-type={:?} body={}", status, content_type, preview(body));

    let message = if is_json(content_type) {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(ErrorBody { error: Some(message) }) => message,
            Ok(_) => generic(),
            Err(e) => {
                warn!("⚠️ Error body claimed JSON but did not decode: {}", e);
                generic()
            }
        }
    } else if body.chars().count() < SHORT_BODY_LIMIT && !body.trim().is_empty() {
        format!("Server error: {} - {}", code, body.trim())
    } else {
        generic()
    };

    ApiError::Status { status: code, message }
}
