// Jenkins HTTP client.
// Handles per-account basic authentication and response status mapping.

use std::time::Duration;

use reqwest::{
    Client, Response, StatusCode,
    header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT},
};

use crate::error::{ButlerError, Result};
use crate::store::Account;

/// Per-request timeout. The aggregator itself never times out a fetch.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Jenkins API client. Credentials are supplied per request from the account.
#[derive(Debug, Clone)]
pub struct JenkinsClient {
    client: Client,
}

impl JenkinsClient {
    pub fn new() -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("butler-tui"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(ButlerError::Api)?;

        Ok(Self { client })
    }

    /// GET the JSON API representation of a Jenkins resource URL.
    pub async fn get(&self, url: &str, account: &Account) -> Result<Response> {
        let mut request = self.client.get(api_url(url));
        if let Some(username) = &account.username {
            request = request.basic_auth(username, account.api_token.as_deref());
        }

        let response = request.send().await.map_err(ButlerError::Api)?;
        check_response(response).await
    }
}

/// Build the `/api/json` endpoint for a job or build URL.
pub fn api_url(url: &str) -> String {
    format!("{}/api/json", url.trim_end_matches('/'))
}

/// Map a non-success status to an error. Returns None for 200.
fn status_error(status: StatusCode, url: &str) -> Option<ButlerError> {
    match status {
        StatusCode::OK => None,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Some(ButlerError::Unauthorized(url.to_string()))
        }
        StatusCode::NOT_FOUND => Some(ButlerError::NotFound(url.to_string())),
        status => Some(ButlerError::Other(format!("HTTP {}", status))),
    }
}

/// Check response status and convert errors.
async fn check_response(response: Response) -> Result<Response> {
    match status_error(response.status(), response.url().as_str()) {
        None => Ok(response),
        Some(ButlerError::Other(msg)) => Err(ButlerError::Other(format!(
            "{}: {}",
            msg,
            response.text().await.unwrap_or_default()
        ))),
        Some(e) => Err(e),
    }
}
