//! Yeelight LAN control: multicast search for discovery, JSON lines over TCP
//! for commands.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpStream, UdpSocket};

use super::{Advert, Transport};
use crate::config::YeelightConfig;
use crate::errors::Error;
use crate::runtime::{self, BoxFuture, Instant};

type Result<T> = std::result::Result<T, Error>;

const LOCATION_SCHEME: &str = "yeelight://";

/// Talks to Yeelight bulbs that have LAN control enabled.
pub struct LanTransport {
    config: YeelightConfig,
    next_id: AtomicU64,
}

impl LanTransport {
    pub fn new(config: YeelightConfig) -> Self {
        LanTransport {
            config,
            next_id: AtomicU64::new(1),
        }
    }

    fn search_message(&self) -> String {
        format!(
            "M-SEARCH * HTTP/1.1\r\nHOST: {}\r\nMAN: \"ssdp:discover\"\r\nST: wifi_bulb\r\n",
            self.config.multicast
        )
    }

    async fn discover(&self) -> Result<Vec<Advert>> {
        let socket = UdpSocket::bind("0.0.0.0:0")
            .await
            .map_err(|e| Error::socket("bind", e))?;
        socket
            .send_to(self.search_message().as_bytes(), self.config.multicast)
            .await
            .map_err(|e| Error::socket("send_to", e))?;

        let mut discovered: HashMap<String, Advert> = HashMap::new();
        let start = Instant::now();
        let mut buffer = [0u8; 2048];
        let discovery_timeout = self.config.discovery_timeout();

        loop {
            let remaining = discovery_timeout.saturating_sub(start.elapsed());
            if remaining.is_zero() {
                break;
            }
            match runtime::timeout(remaining, socket.recv_from(&mut buffer)).await {
                Ok(Ok((size, from))) => {
                    let text = String::from_utf8_lossy(&buffer[..size]);
                    match parse_advert(&text) {
                        Some(advert) => {
                            discovered.insert(advert.id.clone(), advert);
                        }
                        None => debug!("ignoring yeelight datagram from {}", from),
                    }
                }
                Ok(Err(e)) => {
                    debug!("yeelight discovery receive failed: {}", e);
                    break;
                }
                Err(_) => break,
            }
        }

        Ok(discovered.into_values().collect())
    }

    async fn request(&self, addr: SocketAddr, method: &str, params: Vec<Value>) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut line = serde_json::to_vec(&json!({"id": id, "method": method, "params": params}))
            .map_err(Error::JsonDump)?;
        line.extend_from_slice(b"\r\n");

        let limit = self.config.command_timeout();
        let start = Instant::now();
        let mut stream = runtime::timeout(limit, TcpStream::connect(addr))
            .await
            .map_err(|_| Error::timed_out("connect"))?
            .map_err(|e| Error::socket("connect", e))?;

        runtime::timeout(limit.saturating_sub(start.elapsed()), stream.write_all(&line))
            .await
            .map_err(|_| Error::timed_out("send"))?
            .map_err(|e| Error::socket("send", e))?;

        let mut lines = BufReader::new(stream).lines();
        loop {
            let next = runtime::timeout(limit.saturating_sub(start.elapsed()), lines.next_line())
                .await
                .map_err(|_| Error::timed_out("receive"))?
                .map_err(|e| Error::socket("receive", e))?;
            let Some(text) = next else {
                return Err(Error::socket(
                    "receive",
                    std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        "connection closed before reply",
                    ),
                ));
            };
            let reply: Value = serde_json::from_str(&text).map_err(Error::JsonLoad)?;
            if reply.get("id").and_then(Value::as_u64) == Some(id) {
                return Ok(reply);
            }
            debug!("skipping yeelight notification from {}: {}", addr, text);
        }
    }
}

impl Transport for LanTransport {
    fn scan(&self) -> BoxFuture<'_, Result<Vec<Advert>>> {
        Box::pin(self.discover())
    }

    fn send_command<'a>(
        &'a self,
        addr: SocketAddr,
        method: &'a str,
        params: Vec<Value>,
    ) -> BoxFuture<'a, Result<Value>> {
        Box::pin(self.request(addr, method, params))
    }
}

/// Parse a search reply or advertisement. Both carry the same headers.
///
/// Returns `None` when the id or location header is missing.
fn parse_advert(text: &str) -> Option<Advert> {
    let mut advert = Advert::default();
    let mut has_location = false;

    for line in text.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim().to_ascii_lowercase().as_str() {
            "location" => {
                advert.addr = value
                    .strip_prefix(LOCATION_SCHEME)
                    .and_then(|a| a.parse().ok());
                has_location = advert.addr.is_some();
            }
            "id" => advert.id = value.to_string(),
            "name" => advert.name = value.to_string(),
            "power" => advert.power = Some(value == "on"),
            "bright" => advert.bright = value.parse().ok(),
            "color_mode" => advert.color_mode = value.parse().ok(),
            "ct" => advert.ct = value.parse().ok(),
            "rgb" => advert.rgb = value.parse().ok(),
            "hue" => advert.hue = value.parse().ok(),
            "sat" => advert.sat = value.parse().ok(),
            _ => {}
        }
    }

    (has_location && !advert.id.is_empty()).then_some(advert)
}
