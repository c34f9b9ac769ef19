//! Register virtual controls with a smart-home hub over its REST state API.
//!
//! The hub's discovery transport is not reachable from the device, so
//! discovery envelopes are relayed through a set of text helper entities (see
//! [`discovery`]) and a hub-side automation finishes the registration.

pub mod config;
pub mod discovery;
pub mod entity;
pub mod error;
pub mod hub;
mod registry;

pub use config::Config;
pub use config::LogLevel;
pub use entity::Availability;
pub use entity::Control;
pub use entity::ControlKind;
pub use entity::ControlParams;
pub use entity::Device;
pub use entity::KindParams;
pub use error::CreateError;
pub use error::StateError;
pub use hub::HttpClient;
pub use hub::HubApi;
pub use registry::ControlHandle;
pub use registry::Registry;
