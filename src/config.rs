//! Transport configuration.

use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::Error;

type Result<T> = std::result::Result<T, Error>;

/// Settings for every vendor, each with working defaults.
///
/// # Example
///
/// ```
/// use prism::PrismConfig;
///
/// let config = PrismConfig::from_json(r#"{"yeelight": {"enabled": false}}"#).unwrap();
/// assert!(config.lifx.enabled);
/// assert!(!config.yeelight.enabled);
/// assert_eq!(config.lifx.port, 56700);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PrismConfig {
    pub lifx: LifxConfig,
    pub yeelight: YeelightConfig,
}

impl PrismConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(Error::JsonLoad)
    }
}

/// LIFX LAN protocol settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LifxConfig {
    pub enabled: bool,
    /// UDP port the bulbs listen on.
    pub port: u16,
    /// Address discovery requests are broadcast to.
    pub broadcast: Ipv4Addr,
    /// How long to collect discovery replies.
    pub discovery_timeout_ms: u64,
}

impl Default for LifxConfig {
    fn default() -> Self {
        LifxConfig {
            enabled: true,
            port: 56700,
            broadcast: Ipv4Addr::BROADCAST,
            discovery_timeout_ms: 1000,
        }
    }
}

impl LifxConfig {
    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_millis(self.discovery_timeout_ms)
    }
}

/// Yeelight LAN protocol settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YeelightConfig {
    pub enabled: bool,
    /// Multicast group and port of the discovery search.
    pub multicast: SocketAddrV4,
    /// How long to collect discovery replies.
    pub discovery_timeout_ms: u64,
    /// Bound on connecting, sending and waiting for a command reply.
    pub command_timeout_ms: u64,
}

impl Default for YeelightConfig {
    fn default() -> Self {
        YeelightConfig {
            enabled: true,
            multicast: SocketAddrV4::new(Ipv4Addr::new(239, 255, 255, 250), 1982),
            discovery_timeout_ms: 1500,
            command_timeout_ms: 1000,
        }
    }
}

impl YeelightConfig {
    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_millis(self.discovery_timeout_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}
