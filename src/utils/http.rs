// src/utils/http.rs

//! HTTP client utilities.

use reqwest::{RequestBuilder, StatusCode};

use crate::error::Result;
use crate::models::DispatchConfig;

/// Create the shared asynchronous HTTP client used by every sender.
pub fn create_async_client(config: &DispatchConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(config.request_timeout())
        .build()?;
    Ok(client)
}

/// Status and body text of a completed request.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub body: String,
}

impl Reply {
    /// Parse the body as JSON, `None` when it is not JSON.
    pub fn json(&self) -> Option<serde_json::Value> {
        serde_json::from_str(&self.body).ok()
    }

    /// Short body excerpt for error messages.
    pub fn excerpt(&self) -> String {
        crate::utils::truncate_to_bytes(self.body.trim(), 200)
    }
}

/// Send a request and collect the reply without judging the status.
///
/// Push endpoints carry tokens in their URLs, so errors are stripped of the
/// request URL before they leave this function.
pub async fn send(request: RequestBuilder) -> Result<Reply> {
    let response = request.send().await.map_err(reqwest::Error::without_url)?;
    let status = response.status();
    let body = response.text().await.map_err(reqwest::Error::without_url)?;
    Ok(Reply { status, body })
}
