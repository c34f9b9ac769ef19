use std::fmt;

use serde::Serialize;
use tracing::debug;
use tracing::warn;

use super::client::HttpClient;
use crate::entity::to_discovery_json;
use crate::error::HubError;

/// Body of a state update.
#[derive(Serialize)]
struct StateUpdate<'a> {
    state: &'a str,
}

/// Authenticated access to `<base>/api/states/<entity_id>`.
pub struct HubApi<C> {
    client: C,
    base_url: String,
    auth_header: String,
}

impl<C> fmt::Debug for HubApi<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The auth header carries the token and stays out of logs.
        f.debug_struct("HubApi")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl<C: HttpClient> HubApi<C> {
    /// Create a new API handle. A trailing slash on `base_url` is dropped.
    pub fn new(client: C, base_url: &str, token: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_header: format!("Bearer {}", token),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn state_url(&self, entity_id: &str) -> String {
        format!("{}/api/states/{}", self.base_url, entity_id)
    }

    /// Set the state of `entity_id` to `value`.
    pub async fn post_state(&self, entity_id: &str, value: &str) -> Result<(), HubError> {
        let url = self.state_url(entity_id);
        let body = to_discovery_json(&StateUpdate { state: value })?;

        let status = self
            .client
            .post(&url, &body, &self.auth_header)
            .await
            .inspect_err(|e| warn!("POST {} failed: {}", url, e))?;

        if !is_success(status) {
            warn!("POST {} failed with code {}", url, status);
            return Err(HubError::Status(status));
        }
        Ok(())
    }

    /// Fetch the current state document of `entity_id`.
    pub async fn get_state(&self, entity_id: &str) -> Result<String, HubError> {
        let url = self.state_url(entity_id);

        let response = self
            .client
            .get(&url, &self.auth_header)
            .await
            .inspect_err(|e| warn!("GET {} failed: {}", url, e))?;

        if !is_success(response.status) {
            // 404 is the normal answer while polling for a new entity.
            debug!("GET {} failed with code {}", url, response.status);
            return Err(HubError::Status(response.status));
        }
        Ok(response.body)
    }

    /// Whether the hub currently has `entity_id`.
    ///
    /// True only for a successful fetch with a non-empty body that is not a
    /// `null` document.
    pub async fn entity_exists(&self, entity_id: &str) -> bool {
        match self.get_state(entity_id).await {
            Ok(body) => !body.is_empty() && !body.starts_with("null"),
            Err(_) => false,
        }
    }
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}
