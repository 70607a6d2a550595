//! RGB color representation.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// An RGB color with red, green, and blue components (0-255 each).
///
/// Serialized as a `[r, g, b]` array.
#[derive(Default, Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Color {
    pub(crate) red: u8,
    pub(crate) green: u8,
    pub(crate) blue: u8,
}

impl Color {
    pub fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Returns `None` unless every channel is within 0-255.
    ///
    /// ```
    /// use prism::Color;
    ///
    /// assert_eq!(Color::create([255, 0, 0]), Some(Color::rgb(255, 0, 0)));
    /// assert!(Color::create([256, 0, 0]).is_none());
    /// assert!(Color::create([0, -1, 0]).is_none());
    /// ```
    pub fn create(channels: [i64; 3]) -> Option<Self> {
        let [r, g, b] = channels;
        Some(Self::rgb(
            u8::try_from(r).ok()?,
            u8::try_from(g).ok()?,
            u8::try_from(b).ok()?,
        ))
    }

    pub fn red(&self) -> u8 {
        self.red
    }

    pub fn green(&self) -> u8 {
        self.green
    }

    pub fn blue(&self) -> u8 {
        self.blue
    }

    /// Pack into a 24-bit `0xRRGGBB` integer.
    ///
    /// ```
    /// use prism::Color;
    ///
    /// assert_eq!(Color::rgb(255, 0, 0).to_rgb24(), 0xFF0000);
    /// assert_eq!(Color::from_rgb24(0x00FF80), Color::rgb(0, 255, 128));
    /// ```
    pub fn to_rgb24(&self) -> u32 {
        (u32::from(self.red) << 16) | (u32::from(self.green) << 8) | u32::from(self.blue)
    }

    pub fn from_rgb24(value: u32) -> Self {
        Self::rgb(
            ((value >> 16) & 0xFF) as u8,
            ((value >> 8) & 0xFF) as u8,
            (value & 0xFF) as u8,
        )
    }
}

impl From<[u8; 3]> for Color {
    fn from([red, green, blue]: [u8; 3]) -> Self {
        Self::rgb(red, green, blue)
    }
}

impl From<Color> for [u8; 3] {
    fn from(color: Color) -> Self {
        [color.red, color.green, color.blue]
    }
}

impl FromStr for Color {
    type Err = String;

    /// Parse from comma-separated string (e.g., "255,128,0").
    fn from_str(s: &str) -> Result<Self, String> {
        let parts = s
            .split(',')
            .map(|c| c.trim().parse::<u8>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("invalid channel in {s:?}: {e}"))?;
        match parts.as_slice() {
            [r, g, b] => Ok(Self::rgb(*r, *g, *b)),
            _ => Err("Expected format: r,g,b".into()),
        }
    }
}
