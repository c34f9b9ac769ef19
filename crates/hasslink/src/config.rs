//! Configuration file parsing and structures.
//!
//! hasslink uses TOML. Only `[hub]` is required; everything else has
//! defaults that match the hub-side decoder automation.

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use tracing_subscriber::filter::LevelFilter;

use crate::discovery::PollSchedule;
use crate::discovery::DEFAULT_SLOT_SIZE;
use crate::entity::ControlParams;
use crate::entity::Device;
use crate::entity::KindParams;

/// Top-level configuration structure
#[derive(Debug, Deserialize)]
pub struct Config {
    pub hub: HubConfig,

    #[serde(default)]
    pub discovery: DiscoveryConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Default device for controls that do not name their own
    #[serde(default)]
    pub device: Option<DeviceConfig>,

    /// Controls to create, in order
    #[serde(default)]
    pub controls: Vec<ControlConfig>,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default)]
    pub level: LogLevel,
}

fn default_request_timeout_secs() -> u64 {
    10
}

/// Connection to the hub's REST API
#[derive(Deserialize)]
pub struct HubConfig {
    /// Base URL, e.g. "https://hub.local:8123"
    pub url: String,

    /// Long-lived access token
    pub token: String,

    /// Skip TLS certificate validation
    #[serde(default)]
    pub accept_invalid_certs: bool,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl std::fmt::Debug for HubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubConfig")
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// Side-channel and registry settings
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Discovery topic prefix
    pub prefix: String,

    /// Characters per relay slot
    pub slot_size: usize,

    /// Delay before the first existence check
    pub settle_ms: u64,

    /// Delay between existence checks
    pub poll_interval_ms: u64,

    /// How long to keep checking after settling
    pub timeout_secs: u64,

    /// Maximum number of controls one registry holds
    pub max_controls: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        let schedule = PollSchedule::default();
        Self {
            prefix: "homeassistant".to_string(),
            slot_size: DEFAULT_SLOT_SIZE,
            settle_ms: schedule.settle.as_millis() as u64,
            poll_interval_ms: schedule.interval.as_millis() as u64,
            timeout_secs: schedule.timeout.as_secs(),
            max_controls: 50,
        }
    }
}

impl DiscoveryConfig {
    pub fn poll_schedule(&self) -> PollSchedule {
        PollSchedule {
            settle: Duration::from_millis(self.settle_ms),
            interval: Duration::from_millis(self.poll_interval_ms),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

/// Device identity
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub manufacturer: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub sw_version: String,
}

impl From<DeviceConfig> for Device {
    fn from(config: DeviceConfig) -> Self {
        Device::new(config.id, config.name)
            .with_manufacturer(config.manufacturer)
            .with_model(config.model)
            .with_sw_version(config.sw_version)
    }
}

/// One control to create
#[derive(Debug, Clone, Deserialize)]
pub struct ControlConfig {
    pub object_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub unique_id: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub state_topic: String,
    #[serde(default)]
    pub command_topic: String,
    #[serde(default)]
    pub availability_topic: String,

    /// Device override for this control only
    #[serde(default)]
    pub device: Option<DeviceConfig>,

    /// State written once the control exists
    #[serde(default)]
    pub initial_state: Option<String>,

    #[serde(flatten)]
    pub kind: KindConfig,
}

fn default_max() -> f64 {
    100.0
}

fn default_step() -> f64 {
    1.0
}

/// Kind-specific fields, selected by `kind = "..."`
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KindConfig {
    Switch {
        #[serde(default)]
        payload_on: String,
        #[serde(default)]
        payload_off: String,
    },
    Number {
        #[serde(default)]
        min: f64,
        #[serde(default = "default_max")]
        max: f64,
        #[serde(default = "default_step")]
        step: f64,
        #[serde(default)]
        unit: String,
        #[serde(default)]
        mode: String,
    },
    Sensor {
        #[serde(default)]
        unit: String,
    },
    BinarySensor {
        #[serde(default)]
        payload_on: String,
        #[serde(default)]
        payload_off: String,
    },
}

impl From<KindConfig> for KindParams {
    fn from(config: KindConfig) -> Self {
        match config {
            KindConfig::Switch {
                payload_on,
                payload_off,
            } => KindParams::Switch {
                payload_on,
                payload_off,
            },
            KindConfig::Number {
                min,
                max,
                step,
                unit,
                mode,
            } => KindParams::Number {
                min,
                max,
                step,
                unit,
                mode,
            },
            KindConfig::Sensor { unit } => KindParams::Sensor { unit },
            KindConfig::BinarySensor {
                payload_on,
                payload_off,
            } => KindParams::BinarySensor {
                payload_on,
                payload_off,
            },
        }
    }
}

impl ControlConfig {
    /// Split into the arguments of [`Registry::create`](crate::Registry::create).
    pub fn to_params(&self) -> (ControlParams, KindParams) {
        let params = ControlParams {
            object_id: self.object_id.clone(),
            name: self.name.clone(),
            unique_id: self.unique_id.clone(),
            icon: self.icon.clone(),
            state_topic: self.state_topic.clone(),
            command_topic: self.command_topic.clone(),
            availability_topic: self.availability_topic.clone(),
            device: self
                .device
                .clone()
                .map(|device| Arc::new(Device::from(device))),
        };
        (params, self.kind.clone().into())
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(path.as_ref().to_path_buf(), e))?;

        toml::from_str(&contents).map_err(ConfigError::Parse)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
}
