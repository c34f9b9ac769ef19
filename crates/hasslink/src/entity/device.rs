use serde::ser::SerializeMap;
use serde::Serialize;
use serde::Serializer;

use super::json::to_discovery_json;

/// Identity shared by one or more controls.
///
/// Controls hold a device through an `Arc`, so a device lives as long as the
/// last control that references it. Replacing the registry's default device
/// does not affect controls created before the change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Device {
    /// Unique device identifier, sent as `identifiers: [id]`.
    pub id: String,
    pub name: String,
    pub manufacturer: String,
    pub model: String,
    pub sw_version: String,
}

impl Device {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = manufacturer.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_sw_version(mut self, sw_version: impl Into<String>) -> Self {
        self.sw_version = sw_version.into();
        self
    }

    /// Discovery JSON for this device. Empty optional fields are omitted.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        to_discovery_json(self)
    }
}

impl Serialize for Device {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("identifiers", &[&self.id])?;
        for (key, value) in [
            ("name", &self.name),
            ("manufacturer", &self.manufacturer),
            ("model", &self.model),
            ("sw_version", &self.sw_version),
        ] {
            if !value.is_empty() {
                map.serialize_entry(key, value)?;
            }
        }
        map.end()
    }
}
