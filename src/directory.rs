//! One directory over every vendor registry.

use std::sync::Arc;

use futures::future::join_all;
use log::{debug, info};

use crate::config::PrismConfig;
use crate::errors::Error;
use crate::light::Light;
use crate::registry::Registry;
use crate::state::LightState;
use crate::{lifx, yeelight};

/// Outcome of a state change requested through the [`LightDirectory`].
#[derive(Debug)]
pub enum ApplyResult {
    /// The change was accepted; the handle shows the updated cached state.
    Applied(Light),
    /// No registry knows the light, even after a fresh discovery.
    NotFound,
    /// The light exists but the change could not be applied.
    Failed(Error),
}

impl ApplyResult {
    pub fn is_applied(&self) -> bool {
        matches!(self, ApplyResult::Applied(_))
    }
}

/// Unified view of the lights of every registered vendor.
///
/// Registries are consulted in registration order. Names are only unique
/// within a vendor: when two vendors report the same name, lookups return the
/// light of the vendor registered first.
#[derive(Default)]
pub struct LightDirectory {
    registries: Vec<Arc<Registry>>,
}

impl LightDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a directory backed by the LAN transports enabled in `config`.
    ///
    /// LIFX is registered before Yeelight.
    pub fn from_config(config: &PrismConfig) -> Self {
        let mut directory = Self::new();
        if config.lifx.enabled {
            directory.register(Arc::new(Registry::new(lifx::Lifx::new(Arc::new(
                lifx::LanTransport::new(config.lifx.clone()),
            )))));
        }
        if config.yeelight.enabled {
            directory.register(Arc::new(Registry::new(yeelight::Yeelight::new(Arc::new(
                yeelight::LanTransport::new(config.yeelight.clone()),
            )))));
        }
        directory
    }

    /// Append a vendor registry. Earlier registrations win name collisions.
    pub fn register(&mut self, registry: Arc<Registry>) -> &mut Self {
        info!("registered {} lights", registry.protocol());
        self.registries.push(registry);
        self
    }

    pub fn registries(&self) -> &[Arc<Registry>] {
        &self.registries
    }

    /// Discover and list the lights of every vendor.
    ///
    /// Vendors are scanned concurrently; the result is grouped by vendor in
    /// registration order. Names shared across vendors are not merged.
    pub async fn list_all_lights(&self) -> Vec<Light> {
        join_all(self.registries.iter().map(|r| r.discover()))
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    /// Find a light by name. The first vendor that knows it wins; later
    /// vendors are not queried at all.
    pub async fn find_light(&self, name: &str) -> Option<Light> {
        for registry in &self.registries {
            if let Some(light) = registry.lookup(name).await {
                debug!("found {:?} in {} registry", name, registry.protocol());
                return Some(light);
            }
        }
        None
    }

    /// Like [`find_light`](Self::find_light), but a missing light is an error.
    pub async fn require_light(&self, name: &str) -> Result<Light, Error> {
        self.find_light(name)
            .await
            .ok_or_else(|| Error::LightNotFound(name.to_string()))
    }

    pub async fn apply_light_state(&self, name: &str, desired: &LightState) -> ApplyResult {
        let Some(light) = self.find_light(name).await else {
            return ApplyResult::NotFound;
        };
        match light.apply_state(desired).await {
            Ok(_) => ApplyResult::Applied(light),
            Err(e) => ApplyResult::Failed(e),
        }
    }

    pub async fn set_power(&self, name: &str, on: bool) -> ApplyResult {
        let mut desired = LightState::new();
        desired.set_power(on);
        self.apply_light_state(name, &desired).await
    }

    /// Invert the cached power state. A light with unknown power is turned on.
    pub async fn toggle_power(&self, name: &str) -> ApplyResult {
        let Some(light) = self.find_light(name).await else {
            return ApplyResult::NotFound;
        };
        let on = !light.current_state().power().unwrap_or(false);
        let mut desired = LightState::new();
        desired.set_power(on);
        match light.apply_state(&desired).await {
            Ok(_) => ApplyResult::Applied(light),
            Err(e) => ApplyResult::Failed(e),
        }
    }
}
