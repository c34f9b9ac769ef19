use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HubError;

/// Response to a GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Trait for the HTTP operations the client needs
///
/// This trait allows for mocking the hub for testing purposes. Implementations
/// return `Err` only when no response was received; any status code, including
/// errors, is returned as `Ok`.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// POST a JSON body, returning the status code
    async fn post(&self, url: &str, body: &str, auth_header: &str) -> Result<u16, HubError>;

    /// GET a resource, returning status code and body
    async fn get(&self, url: &str, auth_header: &str) -> Result<HttpResponse, HubError>;
}

#[async_trait]
impl<T: HttpClient + ?Sized> HttpClient for Arc<T> {
    async fn post(&self, url: &str, body: &str, auth_header: &str) -> Result<u16, HubError> {
        (**self).post(url, body, auth_header).await
    }

    async fn get(&self, url: &str, auth_header: &str) -> Result<HttpResponse, HubError> {
        (**self).get(url, auth_header).await
    }
}
