//! Access to the hub's REST state endpoint.
//!
//! [`HttpClient`] is the only place bytes leave the process. [`HubApi`] builds
//! URLs under `<base>/api/states/`, attaches the bearer token and turns status
//! codes into [`HubError`](crate::error::HubError)s.

mod api;
mod client;
#[cfg(test)]
pub(crate) mod mock;
#[cfg(feature = "client_reqwest")]
mod reqwest_client;

pub use api::HubApi;
pub use client::HttpClient;
pub use client::HttpResponse;
#[cfg(feature = "client_reqwest")]
pub use reqwest_client::ReqwestClient;
