//! # prism
//!
//! An async Rust library for controlling smart lights from several vendors
//! through one vendor neutral model.
//!
//! Lights are addressed by name. A [`LightDirectory`] holds one [`Registry`]
//! per vendor; each registry discovers its lights on the local network and
//! caches them as [`Light`] handles. A desired [`LightState`] is translated
//! into vendor commands by the light's backend.
//!
//! ## Quick Start
//!
//! ```ignore
//! use prism::{ApplyResult, LightDirectory, LightState, PrismConfig};
//!
//! async fn sunset() -> Result<(), Box<dyn std::error::Error>> {
//!     let directory = LightDirectory::from_config(&PrismConfig::default());
//!
//!     let mut desired = LightState::new();
//!     desired.set_power(true).set_brightness(40)?.set_duration(5)?;
//!     desired.set_color([255, 120, 0])?;
//!
//!     match directory.apply_light_state("Living Room", &desired).await {
//!         ApplyResult::Applied(light) => println!("{:?}", light.current_state()),
//!         ApplyResult::NotFound => println!("no such light"),
//!         ApplyResult::Failed(e) => println!("failed: {e}"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Supported vendors
//!
//! - **LIFX** ([`lifx`]): binary LAN protocol over UDP port 56700. Bulbs do not
//!   acknowledge commands, so success means the datagrams were sent.
//! - **Yeelight** ([`yeelight`]): multicast discovery and JSON commands over
//!   TCP. Every command is acknowledged.
//!
//! ## Attribute domains
//!
//! - **Power**: on or off
//! - **Duration**: transition time, 0-3600 seconds, see [`Transition`]
//! - **Brightness**: 0-100 percent, see [`Brightness`]
//! - **Color**: RGB, 0-255 per channel, see [`Color`]
//! - **Kelvin**: white temperature, 2500-9000K, see [`Kelvin`]
//!
//! When both a color and a temperature are requested, the color wins.

mod config;
mod directory;
mod errors;
pub mod lifx;
mod light;
mod registry;
pub mod runtime;
mod state;
#[cfg(test)]
mod testing;
mod types;
pub mod yeelight;

// Re-export public API
pub use config::{LifxConfig, PrismConfig, YeelightConfig};
pub use directory::{ApplyResult, LightDirectory};
pub use errors::{Error, Field, ValidationError};
pub use light::{Applied, Device, Light, LightSnapshot};
pub use registry::{DiscoveredLight, Registry, Vendor};
pub use state::LightState;
pub use types::{Brightness, Color, Hsv, Kelvin, Protocol, Transition};

/// Result type used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
