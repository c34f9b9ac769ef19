use std::sync::Arc;

use serde::ser::SerializeMap;
use serde::Serialize;
use serde::Serializer;

use super::device::Device;
use super::json::to_discovery_json;

/// The entity platform a control is exposed as.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr, strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
pub enum ControlKind {
    Switch,
    Number,
    Sensor,
    BinarySensor,
}

impl ControlKind {
    /// Icon used when the caller does not pick one.
    pub fn default_icon(self) -> &'static str {
        match self {
            Self::Switch => "mdi:toggle-switch",
            Self::Number | Self::Sensor => "mdi:gauge",
            Self::BinarySensor => "mdi:motion-sensor",
        }
    }

    /// Whether the hub can send commands to this kind (and so needs a command topic).
    pub fn accepts_commands(self) -> bool {
        matches!(self, Self::Switch | Self::Number)
    }
}

/// Kind-specific settings of a control.
#[derive(Debug, Clone, PartialEq)]
pub enum KindParams {
    Switch {
        payload_on: String,
        payload_off: String,
    },
    Number {
        min: f64,
        max: f64,
        step: f64,
        unit: String,
        mode: String,
    },
    Sensor {
        unit: String,
    },
    BinarySensor {
        payload_on: String,
        payload_off: String,
    },
}

impl KindParams {
    pub fn switch() -> Self {
        Self::Switch {
            payload_on: "ON".to_string(),
            payload_off: "OFF".to_string(),
        }
    }

    pub fn number(min: f64, max: f64, step: f64) -> Self {
        Self::Number {
            min,
            max,
            step,
            unit: String::new(),
            mode: "slider".to_string(),
        }
    }

    pub fn sensor(unit: impl Into<String>) -> Self {
        Self::Sensor { unit: unit.into() }
    }

    pub fn binary_sensor() -> Self {
        Self::BinarySensor {
            payload_on: "ON".to_string(),
            payload_off: "OFF".to_string(),
        }
    }

    pub fn kind(&self) -> ControlKind {
        match self {
            Self::Switch { .. } => ControlKind::Switch,
            Self::Number { .. } => ControlKind::Number,
            Self::Sensor { .. } => ControlKind::Sensor,
            Self::BinarySensor { .. } => ControlKind::BinarySensor,
        }
    }

    /// Replace empty payloads and an empty number mode with their defaults.
    fn with_defaults(mut self) -> Self {
        match &mut self {
            Self::Switch {
                payload_on,
                payload_off,
            }
            | Self::BinarySensor {
                payload_on,
                payload_off,
            } => {
                fill(payload_on, "ON");
                fill(payload_off, "OFF");
            }
            Self::Number { mode, .. } => fill(mode, "slider"),
            Self::Sensor { .. } => {}
        }
        self
    }
}

impl Default for KindParams {
    fn default() -> Self {
        Self::switch()
    }
}

fn fill(field: &mut String, default: impl Into<String>) {
    if field.is_empty() {
        *field = default.into();
    }
}

/// Caller-supplied fields shared by every kind.
///
/// Empty strings mean "use the default" when the control is built.
#[derive(Debug, Clone, Default)]
pub struct ControlParams {
    pub object_id: String,
    pub name: String,
    pub unique_id: String,
    pub icon: String,
    pub state_topic: String,
    pub command_topic: String,
    pub availability_topic: String,
    /// Device override. `None` binds the registry's default device.
    pub device: Option<Arc<Device>>,
}

impl ControlParams {
    pub fn new(
        object_id: impl Into<String>,
        name: impl Into<String>,
        unique_id: impl Into<String>,
    ) -> Self {
        Self {
            object_id: object_id.into(),
            name: name.into(),
            unique_id: unique_id.into(),
            ..Default::default()
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn with_device(mut self, device: Arc<Device>) -> Self {
        self.device = Some(device);
        self
    }
}

/// Liveness of a control as last observed by this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Availability {
    /// Built but not yet confirmed by the hub. Never visible in a registry.
    #[default]
    Provisional,
    Online,
    Offline,
}

/// One entity exposed to the hub.
///
/// The kind is fixed at construction. Topic fields exist for parity with the
/// discovery schema; the state transport itself never uses them.
#[derive(Debug, Clone)]
pub struct Control {
    object_id: String,
    name: String,
    unique_id: String,
    icon: String,
    state_topic: String,
    command_topic: String,
    availability_topic: String,
    params: KindParams,
    device: Option<Arc<Device>>,
    current_state: String,
    availability: Availability,
}

impl Control {
    /// Build a control, substituting kind defaults for every empty field.
    ///
    /// Sensors and binary sensors never get a command topic. Callers outside
    /// the crate go through [`Registry::create`](crate::Registry::create),
    /// which rejects an empty object id before a control is built.
    pub(crate) fn new(params: ControlParams, kind: KindParams) -> Self {
        let kind = kind.with_defaults();
        let tag = kind.kind();
        let object_id = params.object_id;

        let mut icon = params.icon;
        fill(&mut icon, tag.default_icon());

        let mut state_topic = params.state_topic;
        fill(&mut state_topic, format!("virt/{}/state", object_id));

        let mut command_topic = params.command_topic;
        if tag.accepts_commands() {
            fill(&mut command_topic, format!("virt/{}/set", object_id));
        } else {
            command_topic.clear();
        }

        let mut availability_topic = params.availability_topic;
        fill(&mut availability_topic, format!("virt/{}/avail", object_id));

        Self {
            object_id,
            name: params.name,
            unique_id: params.unique_id,
            icon,
            state_topic,
            command_topic,
            availability_topic,
            params: kind,
            device: params.device,
            current_state: String::new(),
            availability: Availability::Provisional,
        }
    }

    pub fn kind(&self) -> ControlKind {
        self.params.kind()
    }

    pub fn params(&self) -> &KindParams {
        &self.params
    }

    pub fn object_id(&self) -> &str {
        &self.object_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn icon(&self) -> &str {
        &self.icon
    }

    pub fn state_topic(&self) -> &str {
        &self.state_topic
    }

    pub fn command_topic(&self) -> &str {
        &self.command_topic
    }

    pub fn availability_topic(&self) -> &str {
        &self.availability_topic
    }

    pub fn device(&self) -> Option<&Arc<Device>> {
        self.device.as_ref()
    }

    /// Last state written to or read from the hub.
    pub fn current_state(&self) -> &str {
        &self.current_state
    }

    pub fn availability(&self) -> Availability {
        self.availability
    }

    pub fn is_online(&self) -> bool {
        self.availability == Availability::Online
    }

    /// Hub-facing identifier, e.g. `switch.lamp`.
    pub fn entity_id(&self) -> String {
        format!("{}.{}", self.kind(), self.object_id)
    }

    /// Topic the discovery description is addressed to, e.g.
    /// `homeassistant/switch/lamp/config`.
    pub fn discovery_topic(&self, prefix: &str) -> String {
        format!("{}/{}/{}/config", prefix, self.kind(), self.object_id)
    }

    /// Discovery JSON for this control, including its device if bound.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        to_discovery_json(self)
    }

    pub(crate) fn bind_device(&mut self, device: Arc<Device>) {
        self.device = Some(device);
    }

    pub(crate) fn set_current_state(&mut self, state: String) {
        self.current_state = state;
    }

    pub(crate) fn set_online(&mut self, online: bool) {
        self.availability = if online {
            Availability::Online
        } else {
            Availability::Offline
        };
    }
}

impl Serialize for Control {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;

        for (key, value) in [
            ("name", &self.name),
            ("unique_id", &self.unique_id),
            ("icon", &self.icon),
            ("state_topic", &self.state_topic),
            ("command_topic", &self.command_topic),
            ("availability_topic", &self.availability_topic),
        ] {
            if !value.is_empty() {
                map.serialize_entry(key, value)?;
            }
        }

        if let Some(device) = &self.device {
            map.serialize_entry("device", device.as_ref())?;
        }

        match &self.params {
            KindParams::Number {
                min,
                max,
                step,
                unit,
                mode,
            } => {
                map.serialize_entry("min", min)?;
                map.serialize_entry("max", max)?;
                map.serialize_entry("step", step)?;
                if !unit.is_empty() {
                    map.serialize_entry("unit_of_measurement", unit)?;
                }
                if !mode.is_empty() {
                    map.serialize_entry("mode", mode)?;
                }
            }
            KindParams::Switch {
                payload_on,
                payload_off,
            }
            | KindParams::BinarySensor {
                payload_on,
                payload_off,
            } => {
                map.serialize_entry("payload_on", payload_on)?;
                map.serialize_entry("payload_off", payload_off)?;
            }
            KindParams::Sensor { unit } => {
                if !unit.is_empty() {
                    map.serialize_entry("unit_of_measurement", unit)?;
                }
            }
        }

        map.end()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(ControlKind::Switch.to_string(), "switch");
        assert_eq!(ControlKind::BinarySensor.as_ref(), "binary_sensor");
        assert_eq!(
            ControlKind::from_str("number").unwrap(),
            ControlKind::Number
        );
    }

    #[test]
    fn test_switch_defaults() {
        let control = Control::new(ControlParams::new("lamp", "Lamp", "lamp_1"), KindParams::switch());

        assert_eq!(control.kind(), ControlKind::Switch);
        assert_eq!(control.entity_id(), "switch.lamp");
        assert_eq!(control.icon(), "mdi:toggle-switch");
        assert_eq!(control.state_topic(), "virt/lamp/state");
        assert_eq!(control.command_topic(), "virt/lamp/set");
        assert_eq!(control.availability_topic(), "virt/lamp/avail");
        assert_eq!(control.availability(), Availability::Provisional);
        assert!(!control.is_online());
        assert_eq!(control.current_state(), "");
    }

    #[test]
    fn test_empty_payloads_fall_back_to_defaults() {
        let kind = KindParams::BinarySensor {
            payload_on: String::new(),
            payload_off: "closed".to_string(),
        };
        let control = Control::new(ControlParams::new("door", "Door", "door_1"), kind);

        assert_eq!(
            control.params(),
            &KindParams::BinarySensor {
                payload_on: "ON".to_string(),
                payload_off: "closed".to_string(),
            }
        );
    }

    #[test]
    fn test_sensor_has_no_command_topic() {
        let mut params = ControlParams::new("temp", "Temperature", "temp_1");
        params.command_topic = "custom/set".to_string();
        let control = Control::new(params, KindParams::sensor("°C"));

        assert_eq!(control.command_topic(), "");
        assert_eq!(control.icon(), "mdi:gauge");
        assert!(!control.to_json().unwrap().contains("command_topic"));
    }

    #[test]
    fn test_caller_values_are_kept() {
        let mut params = ControlParams::new("fan", "Fan", "fan_1").with_icon("mdi:fan");
        params.state_topic = "home/fan".to_string();
        let control = Control::new(params, KindParams::switch());

        assert_eq!(control.icon(), "mdi:fan");
        assert_eq!(control.state_topic(), "home/fan");
        assert_eq!(control.command_topic(), "virt/fan/set");
    }

    #[test]
    fn test_discovery_topic() {
        let control = Control::new(
            ControlParams::new("motion", "Motion", "m1"),
            KindParams::binary_sensor(),
        );
        assert_eq!(
            control.discovery_topic("homeassistant"),
            "homeassistant/binary_sensor/motion/config"
        );
    }

    #[test]
    fn test_number_payload() {
        let control = Control::new(
            ControlParams::new("level", "Level", "level_1"),
            KindParams::number(0.0, 10.0, 0.5),
        );
        let json = control.to_json().unwrap();

        assert!(json.contains(r#""min":0.000,"max":10.000,"step":0.500"#));
        assert!(json.contains(r#""mode":"slider""#));
        assert!(!json.contains("unit_of_measurement"));
    }

    #[test]
    fn test_switch_payload_with_device() {
        let device = Arc::new(Device::new("esp32-01", "Workshop"));
        let control = Control::new(
            ControlParams::new("lamp", "Lamp", "lamp_1").with_device(device),
            KindParams::switch(),
        );
        insta::assert_snapshot!(
            control.to_json().unwrap(),
            @r#"{"name":"Lamp","unique_id":"lamp_1","icon":"mdi:toggle-switch","state_topic":"virt/lamp/state","command_topic":"virt/lamp/set","availability_topic":"virt/lamp/avail","device":{"identifiers":["esp32-01"],"name":"Workshop"},"payload_on":"ON","payload_off":"OFF"}"#
        );
    }

    #[test]
    fn test_payload_is_valid_json_without_trailing_separator() {
        let cases = [
            KindParams::switch(),
            KindParams::number(-5.0, 5.0, 0.1),
            KindParams::sensor(""),
            KindParams::sensor("W"),
            KindParams::binary_sensor(),
        ];
        for kind in cases {
            let control = Control::new(ControlParams::new("x", "", ""), kind);
            let json = control.to_json().unwrap();

            assert!(!json.contains(",}"), "dangling separator in {}", json);
            let value: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert!(value.get("name").is_none());
            assert!(value.get("unique_id").is_none());
        }
    }

    #[test]
    fn test_sensor_unit_is_escaped() {
        let control = Control::new(
            ControlParams::new("odd", "Say \"hi\"", "odd_1"),
            KindParams::sensor("a\\b"),
        );
        let json = control.to_json().unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["name"], "Say \"hi\"");
        assert_eq!(value["unit_of_measurement"], "a\\b");
    }

    #[test]
    fn test_set_online_transitions() {
        let mut control =
            Control::new(ControlParams::new("lamp", "Lamp", "lamp_1"), KindParams::switch());
        control.set_online(true);
        assert_eq!(control.availability(), Availability::Online);
        control.set_online(false);
        assert_eq!(control.availability(), Availability::Offline);
        assert!(!control.is_online());
    }
}
