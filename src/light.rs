//! Vendor agnostic light handles.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, warn};
use serde::Serialize;

use crate::errors::Error;
use crate::runtime::BoxFuture;
use crate::state::LightState;
use crate::types::Protocol;

type Result<T> = std::result::Result<T, Error>;

/// What a vendor backend did with a desired state.
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    /// The attributes that were actually sent to the device.
    ///
    /// May be a subset of the request, e.g. a kelvin that lost to a color.
    pub attempted: LightState,
    /// Whether the device confirmed receipt of every command sent inline.
    ///
    /// `false` means success was assumed because the transport has no replies.
    pub acknowledged: bool,
}

/// The vendor side of a light: turns a [`LightState`] into device commands.
///
/// Implementations only talk to hardware. Caching and timestamps are handled
/// by [`Light`], so a backend never has to remember what it sent.
pub trait Device: Send + Sync {
    /// Send the commands for `desired`, color or temperature first, brightness
    /// next and power last.
    fn apply<'a>(&'a self, desired: &'a LightState) -> BoxFuture<'a, Result<Applied>>;
}

/// A single physical light, as seen by callers.
///
/// `Light` is a cheap handle: clones refer to the same cached entry, so a
/// handle obtained before a rediscovery keeps seeing the fresh state.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use prism::{Applied, Device, Light, LightState, Protocol};
/// use prism::runtime::BoxFuture;
///
/// struct Noop;
///
/// impl Device for Noop {
///     fn apply<'a>(&'a self, desired: &'a LightState) -> BoxFuture<'a, prism::Result<Applied>> {
///         Box::pin(async move {
///             Ok(Applied { attempted: desired.clone(), acknowledged: true })
///         })
///     }
/// }
///
/// let light = Light::new("desk", Protocol::Lifx, Arc::new(Noop), LightState::new());
/// let alias = light.clone();
/// assert!(alias.same_as(&light));
/// assert_eq!(light.protocol().to_string(), "Lifx.v1");
/// ```
#[derive(Clone)]
pub struct Light {
    inner: Arc<LightEntry>,
}

struct LightEntry {
    name: String,
    protocol: Protocol,
    device: RwLock<Arc<dyn Device>>,
    state: RwLock<LightState>,
    last_seen: RwLock<SystemTime>,
}

/// Serializable view of a light at one point in time.
#[derive(Debug, Clone, Serialize)]
pub struct LightSnapshot {
    pub name: String,
    pub protocol: Protocol,
    pub state: LightState,
    /// Seconds since the Unix epoch.
    pub last_seen: u64,
}

impl Light {
    pub fn new(
        name: impl Into<String>,
        protocol: Protocol,
        device: Arc<dyn Device>,
        state: LightState,
    ) -> Self {
        Light {
            inner: Arc::new(LightEntry {
                name: name.into(),
                protocol,
                device: RwLock::new(device),
                state: RwLock::new(state),
                last_seen: RwLock::new(SystemTime::now()),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn protocol(&self) -> Protocol {
        self.inner.protocol
    }

    /// The cached last known state. Never touches the network.
    pub fn current_state(&self) -> LightState {
        self.inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_seen(&self) -> SystemTime {
        *self
            .inner
            .last_seen
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether both handles point at the same cached light.
    pub fn same_as(&self, other: &Light) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn snapshot(&self) -> LightSnapshot {
        LightSnapshot {
            name: self.name().to_string(),
            protocol: self.protocol(),
            state: self.current_state(),
            last_seen: self
                .last_seen()
                .duration_since(UNIX_EPOCH)
                .map_or(0, |d| d.as_secs()),
        }
    }

    /// Realize `desired` on the device.
    ///
    /// On success the attempted attributes are folded into the cached state
    /// and the last seen time moves forward. On failure the error is logged
    /// and returned, and the cache is left untouched. A state that changes
    /// nothing is refused with [`Error::NoAttribute`] before any I/O.
    pub async fn apply_state(&self, desired: &LightState) -> Result<Applied> {
        if !desired.has_changes() {
            return Err(Error::NoAttribute);
        }

        let device = Arc::clone(&*self.inner.device.read().unwrap_or_else(PoisonError::into_inner));
        match device.apply(desired).await {
            Ok(applied) => {
                if !applied.acknowledged {
                    debug!(
                        "{} light {:?} gives no acknowledgment; assuming success",
                        self.protocol(),
                        self.name()
                    );
                }
                self.fold(&applied.attempted);
                Ok(applied)
            }
            Err(e) => {
                warn!(
                    "failed to apply state to {} light {:?}: {}",
                    self.protocol(),
                    self.name(),
                    e
                );
                Err(e)
            }
        }
    }

    /// Record a fresh discovery of this light.
    pub(crate) fn observe(&self, state: &LightState, device: Arc<dyn Device>) {
        *self
            .inner
            .device
            .write()
            .unwrap_or_else(PoisonError::into_inner) = device;
        self.fold(state);
    }

    fn fold(&self, state: &LightState) {
        self.inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .update(state);
        self.touch();
    }

    fn touch(&self) {
        let mut last_seen = self
            .inner
            .last_seen
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *last_seen = (*last_seen).max(SystemTime::now());
    }
}

impl fmt::Debug for Light {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Light")
            .field("name", &self.name())
            .field("protocol", &self.protocol())
            .field("state", &self.current_state())
            .finish()
    }
}
