//! LIFX LAN protocol over UDP.
//!
//! Every message starts with a 36 byte little endian header (frame, frame
//! address, protocol header) followed by a type specific payload.

use std::collections::HashMap;
use std::net::{SocketAddr, SocketAddrV4};
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use log::debug;
use tokio::net::UdpSocket;

use super::{Command, Descriptor, Hsbk, Target, Transport};
use crate::config::LifxConfig;
use crate::errors::Error;
use crate::runtime::{self, BoxFuture, Instant};

type Result<T> = std::result::Result<T, Error>;

const HEADER_LEN: usize = 36;
const PROTOCOL: u16 = 1024;
const ADDRESSABLE: u16 = 1 << 12;
const TAGGED: u16 = 1 << 13;

const LIGHT_GET: u16 = 101;
const SET_COLOR: u16 = 102;
const LIGHT_STATE: u16 = 107;
const SET_LIGHT_POWER: u16 = 117;
const SET_WAVEFORM_OPTIONAL: u16 = 119;

const LIGHT_STATE_LEN: usize = 52;
const LABEL_LEN: usize = 32;

/// Talks to LIFX bulbs directly on the local network.
pub struct LanTransport {
    config: LifxConfig,
    source: u32,
    sequence: AtomicU8,
}

impl LanTransport {
    pub fn new(config: LifxConfig) -> Self {
        LanTransport {
            config,
            source: generate_source(),
            sequence: AtomicU8::new(0),
        }
    }

    fn next_sequence(&self) -> u8 {
        self.sequence.fetch_add(1, Ordering::Relaxed)
    }

    async fn bind() -> Result<UdpSocket> {
        UdpSocket::bind("0.0.0.0:0")
            .await
            .map_err(|e| Error::socket("bind", e))
    }

    async fn discover(&self) -> Result<Vec<Descriptor>> {
        let socket = Self::bind().await?;
        socket
            .set_broadcast(true)
            .map_err(|e| Error::socket("set_broadcast", e))?;

        let msg = encode(self.source, None, self.next_sequence(), LIGHT_GET, &[]);
        let broadcast = SocketAddrV4::new(self.config.broadcast, self.config.port);
        socket
            .send_to(&msg, broadcast)
            .await
            .map_err(|e| Error::socket("send_to", e))?;

        let mut discovered: HashMap<u64, Descriptor> = HashMap::new();
        let start = Instant::now();
        let mut buffer = [0u8; 1024];
        let discovery_timeout = self.config.discovery_timeout();

        loop {
            let remaining = discovery_timeout.saturating_sub(start.elapsed());
            if remaining.is_zero() {
                break;
            }
            match runtime::timeout(remaining, socket.recv_from(&mut buffer)).await {
                Ok(Ok((size, addr))) => match decode_light_state(&buffer[..size], addr) {
                    Ok(Some(bulb)) => {
                        discovered.insert(bulb.target.serial, bulb);
                    }
                    Ok(None) => {}
                    Err(e) => debug!("ignoring lifx datagram from {}: {}", addr, e),
                },
                Ok(Err(e)) => {
                    debug!("lifx discovery receive failed: {}", e);
                    break;
                }
                Err(_) => break,
            }
        }

        Ok(discovered.into_values().collect())
    }

    async fn send_command(&self, target: &Target, command: Command) -> Result<()> {
        let (kind, payload) = encode_command(&command);
        let msg = encode(
            self.source,
            Some(target.serial),
            self.next_sequence(),
            kind,
            &payload,
        );
        let socket = Self::bind().await?;
        socket
            .send_to(&msg, target.addr)
            .await
            .map_err(|e| Error::socket("send_to", e))?;
        Ok(())
    }
}

impl Transport for LanTransport {
    fn scan(&self) -> BoxFuture<'_, Result<Vec<Descriptor>>> {
        Box::pin(self.discover())
    }

    fn send<'a>(&'a self, target: &'a Target, command: Command) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.send_command(target, command))
    }
}

/// Build a full message. Without a target the message is tagged for all bulbs.
fn encode(source: u32, target: Option<u64>, sequence: u8, kind: u16, payload: &[u8]) -> Vec<u8> {
    let size = HEADER_LEN + payload.len();
    let mut flags = PROTOCOL | ADDRESSABLE;
    if target.is_none() {
        flags |= TAGGED;
    }

    let mut msg = Vec::with_capacity(size);
    // frame
    msg.extend_from_slice(&(size as u16).to_le_bytes());
    msg.extend_from_slice(&flags.to_le_bytes());
    msg.extend_from_slice(&source.to_le_bytes());
    // frame address; no ack or response requested
    msg.extend_from_slice(&target.unwrap_or(0).to_le_bytes());
    msg.extend_from_slice(&[0u8; 6]);
    msg.push(0);
    msg.push(sequence);
    // protocol header
    msg.extend_from_slice(&0u64.to_le_bytes());
    msg.extend_from_slice(&kind.to_le_bytes());
    msg.extend_from_slice(&0u16.to_le_bytes());
    msg.extend_from_slice(payload);
    msg
}

fn encode_hsbk(msg: &mut Vec<u8>, color: &Hsbk) {
    for value in [color.hue, color.saturation, color.brightness, color.kelvin] {
        msg.extend_from_slice(&value.to_le_bytes());
    }
}

/// Partial color change through a single cycle saw wave.
fn encode_waveform(color: &Hsbk, period_ms: u32, set_brightness: bool, set_kelvin: bool) -> Vec<u8> {
    let mut payload = vec![0u8, 0u8]; // reserved, transient = false
    encode_hsbk(&mut payload, color);
    payload.extend_from_slice(&period_ms.to_le_bytes());
    payload.extend_from_slice(&1f32.to_le_bytes());
    payload.extend_from_slice(&0i16.to_le_bytes());
    payload.push(0); // saw
    payload.extend_from_slice(&[0, 0, u8::from(set_brightness), u8::from(set_kelvin)]);
    payload
}

fn encode_command(command: &Command) -> (u16, Vec<u8>) {
    match *command {
        Command::SetColor { color, duration_ms } => {
            let mut payload = vec![0u8];
            encode_hsbk(&mut payload, &color);
            payload.extend_from_slice(&duration_ms.to_le_bytes());
            (SET_COLOR, payload)
        }
        Command::SetKelvin {
            kelvin,
            duration_ms,
        } => {
            let color = Hsbk {
                kelvin,
                ..Hsbk::default()
            };
            (
                SET_WAVEFORM_OPTIONAL,
                encode_waveform(&color, duration_ms, false, true),
            )
        }
        Command::SetBrightness { level, duration_ms } => {
            let color = Hsbk {
                brightness: level,
                ..Hsbk::default()
            };
            (
                SET_WAVEFORM_OPTIONAL,
                encode_waveform(&color, duration_ms, true, false),
            )
        }
        Command::SetPower { on, duration_ms } => {
            let level: u16 = if on { u16::MAX } else { 0 };
            let mut payload = level.to_le_bytes().to_vec();
            payload.extend_from_slice(&duration_ms.to_le_bytes());
            (SET_LIGHT_POWER, payload)
        }
    }
}

fn u16_at(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

/// Decode a `LightState` reply. Other message types yield `None`.
fn decode_light_state(bytes: &[u8], addr: SocketAddr) -> Result<Option<Descriptor>> {
    if bytes.len() < HEADER_LEN {
        return Err(Error::MalformedResponse(format!(
            "lifx header needs {HEADER_LEN} bytes, got {}",
            bytes.len()
        )));
    }
    let size = usize::from(u16_at(bytes, 0));
    if size < HEADER_LEN || size > bytes.len() {
        return Err(Error::MalformedResponse(format!(
            "lifx frame size {size} does not match {} received bytes",
            bytes.len()
        )));
    }
    if u16_at(bytes, 32) != LIGHT_STATE {
        return Ok(None);
    }

    let payload = &bytes[HEADER_LEN..size];
    if payload.len() < LIGHT_STATE_LEN {
        return Err(Error::MalformedResponse(format!(
            "lifx light state needs {LIGHT_STATE_LEN} bytes, got {}",
            payload.len()
        )));
    }

    let mut serial = [0u8; 8];
    serial.copy_from_slice(&bytes[8..16]);
    let label = &payload[12..12 + LABEL_LEN];
    let label_end = label.iter().position(|b| *b == 0).unwrap_or(LABEL_LEN);
    let label = String::from_utf8(label[..label_end].to_vec()).map_err(Error::Utf8Decode)?;

    Ok(Some(Descriptor {
        target: Target {
            addr,
            serial: u64::from_le_bytes(serial),
        },
        label,
        color: Hsbk {
            hue: u16_at(payload, 0),
            saturation: u16_at(payload, 2),
            brightness: u16_at(payload, 4),
            kelvin: u16_at(payload, 6),
        },
        power: u16_at(payload, 10),
    }))
}

/// Random-ish non zero client id; zero would make bulbs broadcast replies.
fn generate_source() -> u32 {
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos());
    ((seed & 0xFFFF_FFFF) as u32).max(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn light_state_reply(serial: u64, label: &str, color: Hsbk, power: u16) -> Vec<u8> {
        let mut payload = Vec::new();
        encode_hsbk(&mut payload, &color);
        payload.extend_from_slice(&0i16.to_le_bytes());
        payload.extend_from_slice(&power.to_le_bytes());
        let mut name = [0u8; LABEL_LEN];
        name[..label.len()].copy_from_slice(label.as_bytes());
        payload.extend_from_slice(&name);
        payload.extend_from_slice(&0u64.to_le_bytes());
        encode(7, Some(serial), 0, LIGHT_STATE, &payload)
    }

    #[test]
    fn test_header_layout() {
        let msg = encode(0xAABBCCDD, None, 9, LIGHT_GET, &[]);
        assert_eq!(msg.len(), HEADER_LEN);
        assert_eq!(u16_at(&msg, 0), 36);
        assert_eq!(u16_at(&msg, 2), 0x3400);
        assert_eq!(&msg[4..8], &[0xDD, 0xCC, 0xBB, 0xAA]);
        assert_eq!(msg[23], 9);
        assert_eq!(u16_at(&msg, 32), LIGHT_GET);

        let targeted = encode(1, Some(0xd073d5000001), 0, SET_COLOR, &[0; 13]);
        assert_eq!(u16_at(&targeted, 0), 49);
        assert_eq!(u16_at(&targeted, 2), 0x1400);
        assert_eq!(&targeted[8..14], &[0x01, 0x00, 0x00, 0xd5, 0x73, 0xd0]);
    }

    #[test]
    fn test_set_color_payload() {
        let (kind, payload) = encode_command(&Command::SetColor {
            color: Hsbk {
                hue: 1,
                saturation: 2,
                brightness: 3,
                kelvin: 3500,
            },
            duration_ms: 4000,
        });
        assert_eq!(kind, SET_COLOR);
        assert_eq!(
            payload,
            [0, 1, 0, 2, 0, 3, 0, 0xAC, 0x0D, 0xA0, 0x0F, 0x00, 0x00]
        );
    }

    #[test]
    fn test_partial_updates_use_waveform_flags() {
        let (kind, payload) = encode_command(&Command::SetBrightness {
            level: 0x1234,
            duration_ms: 0,
        });
        assert_eq!(kind, SET_WAVEFORM_OPTIONAL);
        assert_eq!(payload.len(), 25);
        assert_eq!(u16_at(&payload, 6), 0x1234);
        assert_eq!(&payload[21..], &[0, 0, 1, 0]);

        let (_, payload) = encode_command(&Command::SetKelvin {
            kelvin: 2700,
            duration_ms: 0,
        });
        assert_eq!(u16_at(&payload, 8), 2700);
        assert_eq!(&payload[21..], &[0, 0, 0, 1]);
    }

    #[test]
    fn test_power_payload() {
        let (kind, payload) = encode_command(&Command::SetPower {
            on: true,
            duration_ms: 1,
        });
        assert_eq!(kind, SET_LIGHT_POWER);
        assert_eq!(payload, [0xFF, 0xFF, 1, 0, 0, 0]);
    }

    #[test]
    fn test_decode_light_state() {
        let color = Hsbk {
            hue: 100,
            saturation: 200,
            brightness: 300,
            kelvin: 4000,
        };
        let addr: SocketAddr = "10.0.0.5:56700".parse().unwrap();
        let reply = light_state_reply(0xd073d5000002, "Hallway", color, 65535);
        let bulb = decode_light_state(&reply, addr).unwrap().unwrap();

        assert_eq!(bulb.label, "Hallway");
        assert_eq!(bulb.color, color);
        assert_eq!(bulb.power, 65535);
        assert_eq!(bulb.target.serial, 0xd073d5000002);
        assert_eq!(bulb.target.addr, addr);
    }

    #[test]
    fn test_decode_ignores_other_messages() {
        let addr: SocketAddr = "10.0.0.5:56700".parse().unwrap();
        let get = encode(1, None, 0, LIGHT_GET, &[]);
        assert!(decode_light_state(&get, addr).unwrap().is_none());
        assert!(decode_light_state(&get[..20], addr).is_err());

        let mut truncated = encode(1, None, 0, LIGHT_STATE, &[0; 10]);
        assert!(decode_light_state(&truncated, addr).is_err());
        truncated[0] = 0xFF;
        assert!(decode_light_state(&truncated, addr).is_err());
    }

    #[test]
    fn test_source_is_never_zero() {
        assert!(generate_source() >= 2);
    }
}
