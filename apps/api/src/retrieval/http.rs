use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::retrieval::ProviderError;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Shared HTTP client for every provider. Built once at startup.
pub fn build_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout
        } else if e.is_decode() {
            ProviderError::Malformed(e.to_string())
        } else if let Some(status) = e.status() {
            status_error(status)
        } else {
            ProviderError::Transport(e.to_string())
        }
    }
}

fn status_error(status: StatusCode) -> ProviderError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        ProviderError::RateLimited
    } else {
        ProviderError::Http {
            status: status.as_u16(),
        }
    }
}

async fn send(request: RequestBuilder) -> Result<Response, ProviderError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        debug!("Provider responded {status}: {}", body.chars().take(200).collect::<String>());
        return Err(status_error(status));
    }
    Ok(response)
}

/// Sends the request and parses the body as JSON.
pub async fn fetch_json(request: RequestBuilder) -> Result<Value, ProviderError> {
    let body = send(request).await?.text().await?;
    serde_json::from_str(&body).map_err(|e| ProviderError::Malformed(e.to_string()))
}

/// Sends the request and returns the body text (HTML scraping).
pub async fn fetch_text(request: RequestBuilder) -> Result<String, ProviderError> {
    Ok(send(request).await?.text().await?)
}
