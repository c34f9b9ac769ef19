use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::header::CONTENT_TYPE;

use super::client::HttpClient;
use super::client::HttpResponse;
use crate::config::HubConfig;
use crate::error::HubError;

/// Real HTTP client implementation using reqwest
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Create a new client with a per-request timeout.
    ///
    /// `accept_invalid_certs` disables certificate validation, which is what
    /// self-signed hub installs usually need.
    pub fn new(request_timeout: Duration, accept_invalid_certs: bool) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()?;
        Ok(Self { client })
    }

    pub fn from_config(config: &HubConfig) -> Result<Self, reqwest::Error> {
        Self::new(
            Duration::from_secs(config.request_timeout_secs),
            config.accept_invalid_certs,
        )
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn post(&self, url: &str, body: &str, auth_header: &str) -> Result<u16, HubError> {
        let response = self
            .client
            .post(url)
            .header(AUTHORIZATION, auth_header)
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| HubError::Connect(Box::new(e)))?;

        Ok(response.status().as_u16())
    }

    async fn get(&self, url: &str, auth_header: &str) -> Result<HttpResponse, HubError> {
        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, auth_header)
            .send()
            .await
            .map_err(|e| HubError::Connect(Box::new(e)))?;

        let status = response.status();
        if !status.is_success() {
            return Ok(HttpResponse {
                status: status.as_u16(),
                body: String::new(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| HubError::Body(Box::new(e)))?;

        Ok(HttpResponse {
            status: status.as_u16(),
            body,
        })
    }
}
