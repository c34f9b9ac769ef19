//! In-memory hub for unit tests.
//!
//! Stores one state document per entity and can play the hub-side decoder:
//! when the ready sentinel lands in the last slot it reassembles the data
//! slots, reads the discovery topic and makes the entity appear after a
//! configurable number of lookups.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::client::HttpClient;
use super::client::HttpResponse;
use crate::error::HubError;

const SLOT_PREFIX: &str = "input_text.mqtt_buffer_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Request {
    Post {
        url: String,
        body: String,
        auth: String,
    },
    Get {
        url: String,
        auth: String,
    },
}

impl Request {
    pub(crate) fn entity_id(&self) -> &str {
        let url = match self {
            Self::Post { url, .. } | Self::Get { url, .. } => url,
        };
        entity_from_url(url)
    }

    pub(crate) fn is_post(&self) -> bool {
        matches!(self, Self::Post { .. })
    }
}

/// How the mock reacts to a complete discovery envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Decoder {
    /// Never create the entity.
    Off,
    /// Create the entity on the n-th lookup after the sentinel arrives.
    AfterPolls(usize),
}

#[derive(Debug)]
struct Inner {
    documents: HashMap<String, String>,
    values: HashMap<String, String>,
    requests: Vec<Request>,
    pending: HashMap<String, usize>,
    failing_posts: HashMap<String, u16>,
    decoded: Vec<serde_json::Value>,
    decoder: Decoder,
    unreachable: bool,
}

#[derive(Debug)]
pub(crate) struct MockHub {
    inner: Mutex<Inner>,
}

impl Default for MockHub {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHub {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                documents: HashMap::new(),
                values: HashMap::new(),
                requests: Vec::new(),
                pending: HashMap::new(),
                failing_posts: HashMap::new(),
                decoded: Vec::new(),
                decoder: Decoder::Off,
                unreachable: false,
            }),
        }
    }

    pub(crate) fn with_decoder(decoder: Decoder) -> Self {
        let hub = Self::new();
        hub.inner.lock().unwrap().decoder = decoder;
        hub
    }

    pub(crate) fn set_document(&self, entity_id: &str, body: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .documents
            .insert(entity_id.to_string(), body.to_string());
    }

    pub(crate) fn remove(&self, entity_id: &str) {
        self.inner.lock().unwrap().documents.remove(entity_id);
    }

    pub(crate) fn fail_posts_to(&self, entity_id: &str, status: u16) {
        let mut inner = self.inner.lock().unwrap();
        inner.failing_posts.insert(entity_id.to_string(), status);
    }

    pub(crate) fn set_unreachable(&self, unreachable: bool) {
        self.inner.lock().unwrap().unreachable = unreachable;
    }

    pub(crate) fn requests(&self) -> Vec<Request> {
        self.inner.lock().unwrap().requests.clone()
    }

    pub(crate) fn clear_requests(&self) {
        self.inner.lock().unwrap().requests.clear();
    }

    /// Raw value last posted to `entity_id`.
    pub(crate) fn value(&self, entity_id: &str) -> Option<String> {
        self.inner.lock().unwrap().values.get(entity_id).cloned()
    }

    /// Envelopes the decoder has reassembled, in arrival order.
    pub(crate) fn decoded(&self) -> Vec<serde_json::Value> {
        self.inner.lock().unwrap().decoded.clone()
    }

    pub(crate) fn slot_posts(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|r| r.is_post() && r.entity_id().starts_with(SLOT_PREFIX))
            .map(|r| r.entity_id().to_string())
            .collect()
    }
}

impl Inner {
    fn decode_slots(&mut self) {
        let envelope: String = (1..=5)
            .filter_map(|i| self.values.get(&format!("{}{}", SLOT_PREFIX, i)))
            .map(String::as_str)
            .collect();

        let Ok(value) = serde_json::from_str::<serde_json::Value>(&envelope) else {
            return;
        };
        let topic = value["topic"].as_str().unwrap_or_default().to_string();
        self.decoded.push(value);

        let parts: Vec<&str> = topic.split('/').collect();
        if let (Decoder::AfterPolls(polls), [_, kind, object_id, "config"]) =
            (self.decoder, parts.as_slice())
        {
            self.pending
                .insert(format!("{}.{}", kind, object_id), polls);
        }
    }
}

fn entity_from_url(url: &str) -> &str {
    url.rsplit_once("/api/states/")
        .map(|(_, id)| id)
        .unwrap_or_default()
}

#[async_trait]
impl HttpClient for MockHub {
    async fn post(&self, url: &str, body: &str, auth_header: &str) -> Result<u16, HubError> {
        let mut inner = self.inner.lock().unwrap();
        inner.requests.push(Request::Post {
            url: url.to_string(),
            body: body.to_string(),
            auth: auth_header.to_string(),
        });
        if inner.unreachable {
            return Err(HubError::Connect("hub unreachable".into()));
        }

        let entity_id = entity_from_url(url).to_string();
        if let Some(status) = inner.failing_posts.get(&entity_id) {
            return Ok(*status);
        }

        let Ok(parsed) = serde_json::from_str::<serde_json::Value>(body) else {
            return Ok(400);
        };
        let state = parsed["state"].as_str().unwrap_or_default().to_string();

        let document = serde_json::json!({
            "entity_id": entity_id,
            "state": state,
            "attributes": {},
        });
        inner
            .documents
            .insert(entity_id.clone(), document.to_string());
        inner.values.insert(entity_id.clone(), state.clone());

        if entity_id == format!("{}6", SLOT_PREFIX) && state == "END" {
            inner.decode_slots();
        }
        Ok(200)
    }

    async fn get(&self, url: &str, auth_header: &str) -> Result<HttpResponse, HubError> {
        let mut inner = self.inner.lock().unwrap();
        inner.requests.push(Request::Get {
            url: url.to_string(),
            auth: auth_header.to_string(),
        });
        if inner.unreachable {
            return Err(HubError::Connect("hub unreachable".into()));
        }

        let entity_id = entity_from_url(url).to_string();
        if let Some(remaining) = inner.pending.get_mut(&entity_id) {
            *remaining = remaining.saturating_sub(1);
            if *remaining == 0 {
                inner.pending.remove(&entity_id);
                let document = serde_json::json!({
                    "entity_id": entity_id,
                    "state": "unknown",
                    "attributes": {},
                });
                inner
                    .documents
                    .insert(entity_id.clone(), document.to_string());
            }
        }

        Ok(match inner.documents.get(&entity_id) {
            Some(body) => HttpResponse {
                status: 200,
                body: body.clone(),
            },
            None => HttpResponse {
                status: 404,
                body: String::new(),
            },
        })
    }
}
