//! Per vendor discovery cache.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use log::{debug, info, warn};

use crate::errors::Error;
use crate::light::{Device, Light};
use crate::runtime::BoxFuture;
use crate::state::LightState;
use crate::types::Protocol;

type Result<T> = std::result::Result<T, Error>;

/// A light found by a vendor scan, before it is cached.
pub struct DiscoveredLight {
    /// Identity of the light within its vendor namespace.
    pub name: String,
    /// State decoded from the discovery reply.
    pub state: LightState,
    /// Backend that can drive this light.
    pub device: Arc<dyn Device>,
}

/// A vendor's LAN scan.
pub trait Vendor: Send + Sync {
    fn protocol(&self) -> Protocol;

    /// Find the vendor's lights on the local network.
    ///
    /// Bounded by the transport's own timeout.
    fn scan(&self) -> BoxFuture<'_, Result<Vec<DiscoveredLight>>>;
}

impl<V: Vendor + ?Sized> Vendor for Arc<V> {
    fn protocol(&self) -> Protocol {
        (**self).protocol()
    }

    fn scan(&self) -> BoxFuture<'_, Result<Vec<DiscoveredLight>>> {
        (**self).scan()
    }
}

/// Cache of one vendor's lights, keyed by name.
///
/// Entries are created on first sight and updated in place afterwards, so
/// [`Light`] handles given out earlier stay live. Nothing is ever evicted: a
/// light that stops answering keeps its last known state.
pub struct Registry {
    vendor: Box<dyn Vendor>,
    lights: RwLock<HashMap<String, Light>>,
}

impl Registry {
    pub fn new(vendor: impl Vendor + 'static) -> Self {
        Registry {
            vendor: Box::new(vendor),
            lights: RwLock::new(HashMap::new()),
        }
    }

    pub fn protocol(&self) -> Protocol {
        self.vendor.protocol()
    }

    /// Scan the network and merge the results into the cache.
    ///
    /// Returns every cached light, sorted by name. A failed scan is logged
    /// and yields an empty list; missing vendors are a normal condition.
    pub async fn discover(&self) -> Vec<Light> {
        let protocol = self.protocol();
        let found = match self.vendor.scan().await {
            Ok(found) => found,
            Err(e) => {
                warn!("could not discover {} lights: {}", protocol, e);
                return Vec::new();
            }
        };
        info!("discovered {} {} lights", found.len(), protocol);

        let mut lights = self
            .lights
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        for discovered in found {
            match lights.get(&discovered.name) {
                Some(light) => light.observe(&discovered.state, discovered.device),
                None => {
                    debug!("new {} light {:?}", protocol, discovered.name);
                    let light = Light::new(
                        discovered.name.clone(),
                        protocol,
                        discovered.device,
                        discovered.state,
                    );
                    lights.insert(discovered.name, light);
                }
            }
        }
        sorted(lights.values())
    }

    /// Find a light by name, scanning at most once if it is not cached yet.
    pub async fn lookup(&self, name: &str) -> Option<Light> {
        if let Some(light) = self.get(name) {
            return Some(light);
        }
        debug!("{} light {:?} not cached, rediscovering", self.protocol(), name);
        self.discover().await;
        self.get(name)
    }

    /// A cached light, without scanning.
    pub fn get(&self, name: &str) -> Option<Light> {
        self.lights
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Every cached light, without scanning.
    pub fn cached(&self) -> Vec<Light> {
        sorted(
            self.lights
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .values(),
        )
    }

    pub fn len(&self) -> usize {
        self.lights
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn sorted<'a>(lights: impl Iterator<Item = &'a Light>) -> Vec<Light> {
    let mut lights: Vec<Light> = lights.cloned().collect();
    lights.sort_by(|a, b| a.name().cmp(b.name()));
    lights
}
