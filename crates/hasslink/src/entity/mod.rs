//! Entity model for virtual controls.
//!
//! A [`Control`] is one entity exposed to the hub (switch, number, sensor,
//! binary sensor). Controls may point at a shared [`Device`] that groups them
//! in the hub's device registry.

mod control;
mod device;
mod json;

pub use control::Availability;
pub use control::Control;
pub use control::ControlKind;
pub use control::ControlParams;
pub use control::KindParams;
pub use device::Device;
pub use json::to_discovery_json;
pub use json::DiscoveryFormatter;
