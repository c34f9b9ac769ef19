//! Creation flow and live state for virtual controls.
//!
//! A [`Registry`] owns every control it has created. Callers get a
//! [`ControlHandle`] back from [`Registry::create`] and pass it to
//! [`Registry::write`], [`Registry::read`] and [`Registry::is_online`].

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::config::DiscoveryConfig;
use crate::discovery;
use crate::discovery::Channel;
use crate::entity::Control;
use crate::entity::ControlParams;
use crate::entity::Device;
use crate::entity::KindParams;
use crate::error::CreateError;
use crate::error::PublishError;
use crate::error::StateError;
use crate::hub::HttpClient;
use crate::hub::HubApi;

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(0);

/// Reference to a control held by a [`Registry`].
///
/// Handles are indices into the registry's insertion order and stay valid for
/// the registry's lifetime, since controls are never removed. A handle is only
/// meaningful to the registry that issued it; any other registry treats it as
/// unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlHandle {
    registry: u64,
    index: usize,
}

impl ControlHandle {
    pub fn index(self) -> usize {
        self.index
    }
}

/// Append-only, capacity-bounded collection of controls confirmed by the hub.
#[derive(Debug)]
pub struct Registry<C> {
    id: u64,
    hub: HubApi<C>,
    settings: DiscoveryConfig,
    default_device: Arc<Device>,
    controls: Vec<Control>,
}

impl<C: HttpClient> Registry<C> {
    pub fn new(hub: HubApi<C>, settings: DiscoveryConfig) -> Self {
        info!(
            "Registry initialized for {} (capacity {})",
            hub.base_url(),
            settings.max_controls
        );
        Self {
            id: NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed),
            hub,
            settings,
            default_device: Arc::new(Device::default()),
            controls: Vec::new(),
        }
    }

    /// Replace the device bound to controls created from now on.
    pub fn set_device(&mut self, device: Device) {
        debug!("Default device set to {:?}", device.id);
        self.default_device = Arc::new(device);
    }

    pub fn default_device(&self) -> &Arc<Device> {
        &self.default_device
    }

    pub fn hub(&self) -> &HubApi<C> {
        &self.hub
    }

    pub fn settings(&self) -> &DiscoveryConfig {
        &self.settings
    }

    /// Publish a new control and wait for the hub to create it.
    ///
    /// The control enters the registry only once the hub confirms it. On any
    /// error the registry is left untouched.
    pub async fn create(
        &mut self,
        params: ControlParams,
        kind: KindParams,
    ) -> Result<ControlHandle, CreateError> {
        if self.controls.len() >= self.settings.max_controls {
            warn!(
                "Cannot create {}: registry is full",
                params.object_id
            );
            return Err(CreateError::AtCapacity {
                capacity: self.settings.max_controls,
            });
        }
        if params.object_id.is_empty() {
            warn!("Cannot create control without an object id");
            return Err(CreateError::EmptyObjectId);
        }

        let mut control = Control::new(params, kind);
        if control.device().is_none() {
            control.bind_device(Arc::clone(&self.default_device));
        }
        let entity_id = control.entity_id();

        if self.hub.entity_exists(&entity_id).await {
            warn!("Control {} already exists", entity_id);
            return Err(CreateError::AlreadyExists { entity_id });
        }

        let channel = Channel::new(&self.hub, self.settings.slot_size);
        let published = match discovery::envelope(&control, &self.settings.prefix) {
            Ok(envelope) => discovery::publish(&channel, &envelope).await,
            Err(e) => Err(PublishError::Encode(e)),
        };
        if let Err(source) = published {
            warn!("Failed to publish discovery for {}: {}", entity_id, source);
            return Err(CreateError::Publish { entity_id, source });
        }

        info!("Waiting for control {} to be created...", entity_id);
        let schedule = self.settings.poll_schedule();
        if discovery::wait_for_entity(&self.hub, &entity_id, &schedule)
            .await
            .is_none()
        {
            warn!("Timed out waiting for {}", entity_id);
            return Err(CreateError::NotConfirmed {
                entity_id,
                timeout: schedule.timeout,
            });
        }

        control.set_online(true);
        self.controls.push(control);
        info!("Control {} created", entity_id);
        Ok(ControlHandle {
            registry: self.id,
            index: self.controls.len() - 1,
        })
    }

    pub async fn create_switch(
        &mut self,
        params: ControlParams,
    ) -> Result<ControlHandle, CreateError> {
        self.create(params, KindParams::switch()).await
    }

    pub async fn create_number(
        &mut self,
        params: ControlParams,
        min: f64,
        max: f64,
        step: f64,
    ) -> Result<ControlHandle, CreateError> {
        self.create(params, KindParams::number(min, max, step)).await
    }

    pub async fn create_sensor(
        &mut self,
        params: ControlParams,
        unit: &str,
    ) -> Result<ControlHandle, CreateError> {
        self.create(params, KindParams::sensor(unit)).await
    }

    pub async fn create_binary_sensor(
        &mut self,
        params: ControlParams,
    ) -> Result<ControlHandle, CreateError> {
        self.create(params, KindParams::binary_sensor()).await
    }

    /// Push `value` as the control's state. The local mirror changes only if
    /// the hub accepts it.
    pub async fn write(&mut self, handle: ControlHandle, value: &str) -> Result<(), StateError> {
        let entity_id = self.online_entity_id(handle)?;
        self.hub.post_state(&entity_id, value).await?;

        if let Some(control) = self.lookup_mut(handle) {
            control.set_current_state(value.to_string());
        }
        Ok(())
    }

    /// Fetch the control's state from the hub and update the local mirror.
    ///
    /// A document without a `state` field reads as an empty string.
    pub async fn read(&mut self, handle: ControlHandle) -> Result<String, StateError> {
        let entity_id = self.online_entity_id(handle)?;
        let body = self.hub.get_state(&entity_id).await?;
        let state = discovery::extract_value(&body, "state")
            .unwrap_or_default()
            .to_string();

        if let Some(control) = self.lookup_mut(handle) {
            control.set_current_state(state.clone());
        }
        Ok(state)
    }

    /// Probe the hub for the control and record the outcome.
    ///
    /// Unknown handles report offline without a request.
    pub async fn is_online(&mut self, handle: ControlHandle) -> bool {
        let Some(control) = self.lookup(handle) else {
            return false;
        };
        let entity_id = control.entity_id();
        let online = self.hub.get_state(&entity_id).await.is_ok();

        if let Some(control) = self.lookup_mut(handle) {
            if control.is_online() != online {
                info!(
                    "Control {} is now {}",
                    entity_id,
                    if online { "online" } else { "offline" }
                );
            }
            control.set_online(online);
        }
        online
    }

    pub fn get(&self, handle: ControlHandle) -> Option<&Control> {
        self.lookup(handle)
    }

    /// Controls in creation order.
    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.settings.max_controls
    }

    fn lookup(&self, handle: ControlHandle) -> Option<&Control> {
        if handle.registry != self.id {
            return None;
        }
        self.controls.get(handle.index)
    }

    fn lookup_mut(&mut self, handle: ControlHandle) -> Option<&mut Control> {
        if handle.registry != self.id {
            return None;
        }
        self.controls.get_mut(handle.index)
    }

    fn online_entity_id(&self, handle: ControlHandle) -> Result<String, StateError> {
        let control = self.lookup(handle).ok_or(StateError::UnknownControl)?;
        if !control.is_online() {
            debug!("Skipping state access for offline {}", control.entity_id());
            return Err(StateError::Offline {
                entity_id: control.entity_id(),
            });
        }
        Ok(control.entity_id())
    }
}
