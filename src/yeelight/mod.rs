//! Yeelight bulbs.
//!
//! A Yeelight bulb runs one smooth transition at a time, so a change of both
//! color and brightness with a fade is split in two phases: the color fades
//! during the first half, then brightness and power during the second half.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use serde_json::{Value, json};

use crate::errors::Error;
use crate::light::{Applied, Device};
use crate::registry::{DiscoveredLight, Vendor};
use crate::runtime::{self, BoxFuture};
use crate::state::LightState;
use crate::types::{Brightness, Color, Hsv, Kelvin, Protocol, Transition};

mod lan;

pub use lan::LanTransport;

type Result<T> = std::result::Result<T, Error>;

/// Shortest smooth transition the firmware accepts.
pub const MIN_SMOOTH_MS: u32 = 30;

/// Color temperature range of the hardware.
pub const MIN_CT: u16 = 1700;
pub const MAX_CT: u16 = 6500;

/// A bulb as advertised in reply to a discovery search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Advert {
    pub id: String,
    pub name: String,
    pub addr: Option<SocketAddr>,
    pub power: Option<bool>,
    pub bright: Option<u8>,
    /// 1 for rgb, 2 for color temperature, 3 for hue and saturation.
    pub color_mode: Option<u8>,
    pub ct: Option<u16>,
    pub rgb: Option<u32>,
    pub hue: Option<u16>,
    pub sat: Option<u8>,
}

impl Advert {
    /// The advertised name, or the device id for bulbs without one.
    pub fn name(&self) -> String {
        if self.name.trim().is_empty() {
            self.id.clone()
        } else {
            self.name.clone()
        }
    }

    /// Decode the advertised attributes.
    ///
    /// Only the attribute matching the color mode is reported.
    ///
    /// ```
    /// use prism::Color;
    /// use prism::yeelight::Advert;
    ///
    /// let advert = Advert {
    ///     power: Some(true),
    ///     bright: Some(40),
    ///     color_mode: Some(1),
    ///     rgb: Some(0x00FF00),
    ///     ct: Some(4000),
    ///     ..Advert::default()
    /// };
    /// let state = advert.to_state();
    /// assert_eq!(state.power(), Some(true));
    /// assert_eq!(state.color(), Some(&Color::rgb(0, 255, 0)));
    /// assert!(state.kelvin().is_none());
    /// ```
    pub fn to_state(&self) -> LightState {
        let brightness = self.bright.and_then(|b| Brightness::create(i64::from(b)));
        let state = LightState::new()
            .with_power(self.power)
            .with_brightness(brightness);
        match self.color_mode {
            Some(1) => state.with_color(self.rgb.map(Color::from_rgb24)),
            Some(2) => state.with_kelvin(self.ct.map(Kelvin::saturating)),
            Some(3) => {
                let color = self.hue.zip(self.sat).and_then(|(hue, sat)| {
                    Hsv::create(f32::from(hue % 360), f32::from(sat.min(100)) / 100.0, 1.0)
                });
                state.with_color(color.map(|hsv| hsv.to_color()))
            }
            _ => state,
        }
    }
}

/// Network access to Yeelight bulbs.
pub trait Transport: Send + Sync {
    fn scan(&self) -> BoxFuture<'_, Result<Vec<Advert>>>;

    /// Send one command and return the bulb's reply object.
    fn send_command<'a>(
        &'a self,
        addr: SocketAddr,
        method: &'a str,
        params: Vec<Value>,
    ) -> BoxFuture<'a, Result<Value>>;
}

/// Yeelight vendor: discovers bulbs through a [`Transport`].
pub struct Yeelight {
    transport: Arc<dyn Transport>,
}

impl Yeelight {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Yeelight { transport }
    }
}

impl Vendor for Yeelight {
    fn protocol(&self) -> Protocol {
        Protocol::Yeelight
    }

    fn scan(&self) -> BoxFuture<'_, Result<Vec<DiscoveredLight>>> {
        Box::pin(async move {
            let found = self.transport.scan().await?;
            debug!("yeelight scan returned {} bulbs", found.len());
            Ok(found
                .into_iter()
                .filter_map(|advert| {
                    let addr = advert.addr?;
                    Some(DiscoveredLight {
                        name: advert.name(),
                        state: advert.to_state(),
                        device: Arc::new(YeelightLight::new(addr, Arc::clone(&self.transport))),
                    })
                })
                .collect())
        })
    }
}

/// One Yeelight command.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub method: &'static str,
    pub params: Vec<Value>,
}

impl Command {
    fn new(method: &'static str, value: Value, duration_ms: u32) -> Self {
        let (effect, duration_ms) = effect(duration_ms);
        Command {
            method,
            params: vec![value, json!(effect), json!(duration_ms)],
        }
    }

    pub fn set_rgb(color: &Color, duration_ms: u32) -> Self {
        Self::new("set_rgb", json!(color.to_rgb24()), duration_ms)
    }

    pub fn set_ct(kelvin: &Kelvin, duration_ms: u32) -> Self {
        let ct = kelvin.kelvin().clamp(MIN_CT, MAX_CT);
        Self::new("set_ct_abx", json!(ct), duration_ms)
    }

    pub fn set_bright(brightness: &Brightness, duration_ms: u32) -> Self {
        Self::new("set_bright", json!(brightness.value().max(1)), duration_ms)
    }

    pub fn set_power(on: bool, duration_ms: u32) -> Self {
        Self::new("set_power", json!(if on { "on" } else { "off" }), duration_ms)
    }
}

/// Transition effect for a duration.
///
/// ```
/// use prism::yeelight::effect;
///
/// assert_eq!(effect(0), ("sudden", 0));
/// assert_eq!(effect(10), ("smooth", 30));
/// assert_eq!(effect(2000), ("smooth", 2000));
/// ```
pub fn effect(duration_ms: u32) -> (&'static str, u32) {
    if duration_ms == 0 {
        ("sudden", 0)
    } else {
        ("smooth", duration_ms.max(MIN_SMOOTH_MS))
    }
}

/// The commands for one desired state.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    /// Sent right away, in order.
    pub now: Vec<Command>,
    /// Sent in order on a background task once `delay` has passed.
    pub deferred: Vec<Command>,
    pub delay: Duration,
    /// Every attribute the plan sets, deferred ones included.
    pub attempted: LightState,
}

/// One Yeelight bulb.
pub struct YeelightLight {
    addr: SocketAddr,
    transport: Arc<dyn Transport>,
}

impl YeelightLight {
    pub fn new(addr: SocketAddr, transport: Arc<dyn Transport>) -> Self {
        YeelightLight { addr, transport }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn plan(desired: &LightState) -> Plan {
        let total_ms = desired.duration().map_or(0, Transition::millis);
        let mut attempted = LightState::new().with_duration(desired.duration().copied());

        let tint = match (desired.color(), desired.kelvin()) {
            (Some(color), _) => {
                attempted = attempted.with_color(Some(*color));
                Some(Tint::Rgb(*color))
            }
            (None, Some(kelvin)) => {
                attempted = attempted.with_kelvin(Some(*kelvin));
                Some(Tint::Ct(*kelvin))
            }
            (None, None) => None,
        };

        let two_phase = total_ms > 0 && tint.is_some() && desired.brightness().is_some();
        let (first_ms, second_ms) = if two_phase {
            let half = total_ms / 2;
            (half, total_ms - half)
        } else {
            (total_ms, total_ms)
        };

        let mut now = Vec::new();
        let mut deferred = Vec::new();
        if let Some(tint) = tint {
            now.push(tint.command(first_ms));
        }

        let rest = if two_phase { &mut deferred } else { &mut now };
        if let Some(brightness) = desired.brightness() {
            rest.push(Command::set_bright(brightness, second_ms));
            attempted = attempted.with_brightness(Some(*brightness));
        }
        if let Some(on) = desired.power() {
            rest.push(Command::set_power(on, second_ms));
            attempted = attempted.with_power(Some(on));
        }

        Plan {
            now,
            deferred,
            delay: if two_phase {
                Duration::from_millis(u64::from(first_ms))
            } else {
                Duration::ZERO
            },
            attempted,
        }
    }
}

/// The color part of a change: an RGB color or a white temperature.
#[derive(Clone, Copy)]
enum Tint {
    Rgb(Color),
    Ct(Kelvin),
}

impl Tint {
    fn command(&self, duration_ms: u32) -> Command {
        match self {
            Tint::Rgb(color) => Command::set_rgb(color, duration_ms),
            Tint::Ct(kelvin) => Command::set_ct(kelvin, duration_ms),
        }
    }
}

/// Send a command and insist on an `["ok"]` result.
async fn send(transport: &dyn Transport, addr: SocketAddr, command: &Command) -> Result<()> {
    debug!("yeelight {} <- {} {:?}", addr, command.method, command.params);
    let reply = transport
        .send_command(addr, command.method, command.params.clone())
        .await?;
    if let Some(error) = reply.get("error") {
        let reason = error
            .get("message")
            .and_then(Value::as_str)
            .map_or_else(|| error.to_string(), String::from);
        return Err(Error::rejected(command.method, reason));
    }
    match reply.get("result") {
        Some(result) if *result == json!(["ok"]) => Ok(()),
        Some(result) => Err(Error::rejected(command.method, result)),
        None => Err(Error::MalformedResponse(format!(
            "yeelight reply to {} has no result: {}",
            command.method, reply
        ))),
    }
}

/// Send `commands` in order.
///
/// A refused command does not stop the ones after it: the bulb refuses color
/// changes while off, and the power command still has to go out. A transport
/// failure stops the sequence. The first refusal is returned at the end.
async fn send_all(transport: &dyn Transport, addr: SocketAddr, commands: &[Command]) -> Result<()> {
    let mut refused = None;
    for command in commands {
        match send(transport, addr, command).await {
            Ok(()) => {}
            Err(e @ Error::Rejected { .. }) => {
                debug!("yeelight {} refused {}: {}", addr, command.method, e);
                if refused.is_none() {
                    refused = Some(e);
                }
            }
            Err(e) => return Err(e),
        }
    }
    refused.map_or(Ok(()), Err)
}

impl Device for YeelightLight {
    fn apply<'a>(&'a self, desired: &'a LightState) -> BoxFuture<'a, Result<Applied>> {
        Box::pin(async move {
            let plan = Self::plan(desired);
            let refused = match send_all(&*self.transport, self.addr, &plan.now).await {
                Ok(()) => None,
                Err(e @ Error::Rejected { .. }) => Some(e),
                Err(e) => return Err(e),
            };

            if !plan.deferred.is_empty() {
                let transport = Arc::clone(&self.transport);
                let addr = self.addr;
                let deferred = plan.deferred;
                runtime::spawn_after(plan.delay, async move {
                    if let Err(e) = send_all(&*transport, addr, &deferred).await {
                        warn!("deferred yeelight commands to {} failed: {}", addr, e);
                    }
                });
            }

            if let Some(e) = refused {
                return Err(e);
            }
            Ok(Applied {
                attempted: plan.attempted,
                acknowledged: true,
            })
        })
    }
}
