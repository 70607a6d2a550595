//! LIFX adapter.
//!
//! LIFX bulbs speak HSBK: hue, saturation and brightness on a 16 bit scale
//! plus a white point in Kelvin. The LAN protocol has no command replies
//! unless asked for, so success is always assumed once the datagrams are out.

use std::net::SocketAddr;
use std::sync::Arc;

use log::debug;

use crate::errors::Error;
use crate::light::{Applied, Device};
use crate::registry::{DiscoveredLight, Vendor};
use crate::runtime::BoxFuture;
use crate::state::LightState;
use crate::types::{Brightness, Color, Hsv, Kelvin, Protocol, Transition};

mod lan;

pub use lan::LanTransport;

type Result<T> = std::result::Result<T, Error>;

/// Top of the 16 bit hue, saturation and brightness scales.
pub const MAX_LEVEL: u16 = u16::MAX;

/// White point sent along with an RGB color when no temperature was asked for.
pub const DEFAULT_KELVIN: u16 = 3500;

/// A LIFX native color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Hsbk {
    pub hue: u16,
    pub saturation: u16,
    pub brightness: u16,
    pub kelvin: u16,
}

impl Hsbk {
    /// Translate an RGB color through HSV onto the 16 bit scales.
    ///
    /// # Examples
    ///
    /// ```
    /// use prism::Color;
    /// use prism::lifx::Hsbk;
    ///
    /// let white = Hsbk::from_color(&Color::rgb(255, 255, 255), 3500);
    /// assert_eq!((white.hue, white.saturation, white.brightness), (0, 0, 65535));
    ///
    /// let red = Hsbk::from_color(&Color::rgb(255, 0, 0), 3500);
    /// assert_eq!((red.hue, red.saturation, red.brightness), (0, 65535, 65535));
    /// ```
    pub fn from_color(color: &Color, kelvin: u16) -> Self {
        let hsv = Hsv::from_color(color);
        let scale = |unit: f32| (unit * f32::from(MAX_LEVEL)).round() as u16;
        Hsbk {
            hue: scale(hsv.hue() / 360.0),
            saturation: scale(hsv.saturation()),
            brightness: scale(hsv.value()),
            kelvin,
        }
    }

    /// Decode into the common state.
    ///
    /// An unsaturated color is reported as a white temperature, anything else
    /// as an RGB color at full value with the brightness kept separately.
    pub fn to_state(&self) -> LightState {
        let brightness = Brightness::from_scaled(self.brightness, MAX_LEVEL);
        let state = LightState::new().with_brightness(Some(brightness));
        if self.saturation == 0 {
            return state.with_kelvin(Some(Kelvin::saturating(self.kelvin)));
        }
        let unit = |level: u16| f32::from(level) / f32::from(MAX_LEVEL);
        let color = Hsv::create((unit(self.hue) * 360.0) % 360.0, unit(self.saturation), 1.0)
            .map(|hsv| hsv.to_color());
        state.with_color(color)
    }
}

/// Where a bulb lives on the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub addr: SocketAddr,
    /// The bulb's MAC address, little endian in the low six bytes.
    pub serial: u64,
}

impl Target {
    /// The serial formatted as a MAC address.
    ///
    /// ```
    /// use prism::lifx::Target;
    ///
    /// let target = Target { addr: "10.0.0.2:56700".parse().unwrap(), serial: 0x0000_6655_4433_22d0 };
    /// assert_eq!(target.mac(), "d0:22:33:44:55:66");
    /// ```
    pub fn mac(&self) -> String {
        self.serial.to_le_bytes()[..6]
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect::<Vec<_>>()
            .join(":")
    }
}

/// A bulb as reported by a discovery scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub target: Target,
    pub label: String,
    pub color: Hsbk,
    /// 0 when off, 65535 when on.
    pub power: u16,
}

impl Descriptor {
    /// The label, or the MAC address for bulbs that were never named.
    pub fn name(&self) -> String {
        if self.label.trim().is_empty() {
            self.target.mac()
        } else {
            self.label.clone()
        }
    }

    pub fn to_state(&self) -> LightState {
        self.color.to_state().with_power(Some(self.power > 0))
    }
}

/// A single LIFX command. Durations are in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SetColor { color: Hsbk, duration_ms: u32 },
    SetKelvin { kelvin: u16, duration_ms: u32 },
    SetBrightness { level: u16, duration_ms: u32 },
    SetPower { on: bool, duration_ms: u32 },
}

/// Network access to LIFX bulbs.
pub trait Transport: Send + Sync {
    fn scan(&self) -> BoxFuture<'_, Result<Vec<Descriptor>>>;

    /// Send one command. Bulbs do not answer, so `Ok` only means it was sent.
    fn send<'a>(&'a self, target: &'a Target, command: Command) -> BoxFuture<'a, Result<()>>;
}

/// LIFX vendor: discovers bulbs through a [`Transport`].
pub struct Lifx {
    transport: Arc<dyn Transport>,
}

impl Lifx {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Lifx { transport }
    }
}

impl Vendor for Lifx {
    fn protocol(&self) -> Protocol {
        Protocol::Lifx
    }

    fn scan(&self) -> BoxFuture<'_, Result<Vec<DiscoveredLight>>> {
        Box::pin(async move {
            let found = self.transport.scan().await?;
            debug!("lifx scan returned {} bulbs", found.len());
            Ok(found
                .into_iter()
                .map(|bulb| DiscoveredLight {
                    name: bulb.name(),
                    state: bulb.to_state(),
                    device: Arc::new(LifxLight::new(bulb.target, Arc::clone(&self.transport))),
                })
                .collect())
        })
    }
}

/// One LIFX bulb.
pub struct LifxLight {
    target: Target,
    transport: Arc<dyn Transport>,
}

impl LifxLight {
    pub fn new(target: Target, transport: Arc<dyn Transport>) -> Self {
        LifxLight { target, transport }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// The commands for `desired`, in sending order, and the state they set.
    ///
    /// Every command carries the full transition. A requested brightness
    /// rides along in the color command so the bulb never fades towards the
    /// brightness implied by the RGB value.
    pub fn plan(desired: &LightState) -> (Vec<Command>, LightState) {
        let duration_ms = desired.duration().map_or(0, Transition::millis);
        let mut commands = Vec::new();
        let mut attempted = LightState::new().with_duration(desired.duration().copied());

        if let Some(color) = desired.color() {
            let kelvin = desired.kelvin().map_or(DEFAULT_KELVIN, Kelvin::kelvin);
            let mut hsbk = Hsbk::from_color(color, kelvin);
            if let Some(brightness) = desired.brightness() {
                hsbk.brightness = brightness.scale_to(MAX_LEVEL);
                attempted = attempted.with_brightness(Some(*brightness));
            }
            commands.push(Command::SetColor {
                color: hsbk,
                duration_ms,
            });
            attempted = attempted.with_color(Some(*color));
        } else {
            if let Some(kelvin) = desired.kelvin() {
                commands.push(Command::SetKelvin {
                    kelvin: kelvin.kelvin(),
                    duration_ms,
                });
                attempted = attempted.with_kelvin(Some(*kelvin));
            }
            // partial waveform, keeps hue, saturation and kelvin as they are
            if let Some(brightness) = desired.brightness() {
                commands.push(Command::SetBrightness {
                    level: brightness.scale_to(MAX_LEVEL),
                    duration_ms,
                });
                attempted = attempted.with_brightness(Some(*brightness));
            }
        }

        // power goes last so the bulb never shows an intermediate color
        if let Some(on) = desired.power() {
            commands.push(Command::SetPower { on, duration_ms });
            attempted = attempted.with_power(Some(on));
        }

        (commands, attempted)
    }
}

impl Device for LifxLight {
    fn apply<'a>(&'a self, desired: &'a LightState) -> BoxFuture<'a, Result<Applied>> {
        Box::pin(async move {
            let (commands, attempted) = Self::plan(desired);
            for command in commands {
                debug!("lifx {} <- {:?}", self.target.mac(), command);
                self.transport.send(&self.target, command).await?;
            }
            Ok(Applied {
                attempted,
                acknowledged: false,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::light::Light;
    use crate::registry::Registry;

    #[derive(Default)]
    struct FakeTransport {
        bulbs: Vec<Descriptor>,
        sent: Mutex<Vec<(u64, Command)>>,
        fail_sends: bool,
    }

    impl Transport for FakeTransport {
        fn scan(&self) -> BoxFuture<'_, Result<Vec<Descriptor>>> {
            Box::pin(async move { Ok(self.bulbs.clone()) })
        }

        fn send<'a>(&'a self, target: &'a Target, command: Command) -> BoxFuture<'a, Result<()>> {
            Box::pin(async move {
                if self.fail_sends {
                    return Err(Error::socket(
                        "send_to",
                        std::io::Error::new(std::io::ErrorKind::NetworkUnreachable, "down"),
                    ));
                }
                self.sent.lock().unwrap().push((target.serial, command));
                Ok(())
            })
        }
    }

    fn target() -> Target {
        Target {
            addr: "192.168.1.40:56700".parse().unwrap(),
            serial: 0xd073d5000001,
        }
    }

    fn bulb(label: &str, color: Hsbk, power: u16) -> Descriptor {
        Descriptor {
            target: target(),
            label: label.to_string(),
            color,
            power,
        }
    }

    fn state(json: serde_json::Value) -> LightState {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_plan_sends_color_with_requested_brightness_then_power() {
        let (commands, attempted) = LifxLight::plan(&state(serde_json::json!({
            "power": true, "brightness": 10, "color": [255, 0, 0], "duration": 2
        })));
        assert_eq!(
            commands,
            [
                Command::SetColor {
                    color: Hsbk {
                        hue: 0,
                        saturation: 65535,
                        brightness: 6553,
                        kelvin: DEFAULT_KELVIN
                    },
                    duration_ms: 2000
                },
                Command::SetPower {
                    on: true,
                    duration_ms: 2000
                },
            ]
        );
        assert_eq!(attempted.power(), Some(true));
        assert_eq!(attempted.brightness().unwrap().value(), 10);
        assert_eq!(attempted.color(), Some(&Color::rgb(255, 0, 0)));
    }

    #[test]
    fn test_plan_orders_kelvin_brightness_power() {
        let (commands, attempted) = LifxLight::plan(&state(serde_json::json!({
            "power": false, "brightness": 50, "kelvin": 3000, "duration": 1
        })));
        assert_eq!(
            commands,
            [
                Command::SetKelvin {
                    kelvin: 3000,
                    duration_ms: 1000
                },
                Command::SetBrightness {
                    level: 32767,
                    duration_ms: 1000
                },
                Command::SetPower {
                    on: false,
                    duration_ms: 1000
                },
            ]
        );
        assert_eq!(attempted.kelvin().unwrap().kelvin(), 3000);
    }

    #[test]
    fn test_color_wins_over_kelvin() {
        let (commands, attempted) = LifxLight::plan(&state(serde_json::json!({
            "color": [0, 0, 255], "kelvin": 6000
        })));
        assert_eq!(commands.len(), 1);
        let Command::SetColor { color, duration_ms } = commands[0] else {
            panic!("expected a color command");
        };
        assert_eq!(color.kelvin, 6000);
        assert_eq!(duration_ms, 0);
        assert!(attempted.kelvin().is_none());
        assert_eq!(attempted.color(), Some(&Color::rgb(0, 0, 255)));
    }

    #[test]
    fn test_kelvin_alone() {
        let (commands, _) = LifxLight::plan(&state(serde_json::json!({"kelvin": 2700})));
        assert_eq!(
            commands,
            [Command::SetKelvin {
                kelvin: 2700,
                duration_ms: 0
            }]
        );
    }

    #[test]
    fn test_decode_white_and_color() {
        let white = Hsbk {
            hue: 0,
            saturation: 0,
            brightness: 32768,
            kelvin: 2000,
        }
        .to_state();
        assert_eq!(white.kelvin().unwrap().kelvin(), 2500);
        assert_eq!(white.brightness().unwrap().value(), 50);
        assert!(white.color().is_none());

        let green = Hsbk {
            hue: 21845,
            saturation: 65535,
            brightness: 65535,
            kelvin: 3500,
        }
        .to_state();
        assert_eq!(green.color(), Some(&Color::rgb(0, 255, 0)));
        assert!(green.kelvin().is_none());
    }

    #[test]
    fn test_unnamed_bulb_uses_mac() {
        let unnamed = bulb("", Hsbk::default(), 0);
        assert_eq!(unnamed.name(), "01:00:00:d5:73:d0");
        assert_eq!(unnamed.to_state().power(), Some(false));
    }

    #[tokio::test]
    async fn test_apply_sends_in_order_without_ack() {
        let transport = Arc::new(FakeTransport::default());
        let light = LifxLight::new(target(), transport.clone());
        let applied = light
            .apply(&state(serde_json::json!({"power": false, "kelvin": 4000})))
            .await
            .unwrap();

        assert!(!applied.acknowledged);
        let sent = transport.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 2);
        assert!(matches!(sent[0].1, Command::SetKelvin { kelvin: 4000, .. }));
        assert!(matches!(sent[1].1, Command::SetPower { on: false, .. }));
    }

    #[tokio::test]
    async fn test_send_failure_propagates() {
        let transport = Arc::new(FakeTransport {
            fail_sends: true,
            ..FakeTransport::default()
        });
        let light = Light::new(
            "desk",
            Protocol::Lifx,
            Arc::new(LifxLight::new(target(), transport)),
            LightState::new(),
        );
        assert!(light.apply_state(&state(serde_json::json!({"power": true}))).await.is_err());
        assert!(light.current_state().power().is_none());
    }

    #[tokio::test]
    async fn test_scan_builds_lights() {
        let transport = Arc::new(FakeTransport {
            bulbs: vec![bulb(
                "Desk",
                Hsbk {
                    hue: 0,
                    saturation: 65535,
                    brightness: 65535,
                    kelvin: 3500,
                },
                65535,
            )],
            ..FakeTransport::default()
        });
        let registry = Registry::new(Lifx::new(transport.clone()));
        let lights = registry.discover().await;

        assert_eq!(lights.len(), 1);
        assert_eq!(lights[0].name(), "Desk");
        assert_eq!(lights[0].protocol(), Protocol::Lifx);
        let state = lights[0].current_state();
        assert_eq!(state.power(), Some(true));
        assert_eq!(state.color(), Some(&Color::rgb(255, 0, 0)));

        lights[0]
            .apply_state(&state_with_brightness(20))
            .await
            .unwrap();
        assert_eq!(
            transport.sent.lock().unwrap()[0],
            (
                0xd073d5000001,
                Command::SetBrightness {
                    level: 13107,
                    duration_ms: 0
                }
            )
        );
    }

    fn state_with_brightness(pct: i64) -> LightState {
        let mut state = LightState::new();
        state.set_brightness(pct).unwrap();
        state
    }
}
