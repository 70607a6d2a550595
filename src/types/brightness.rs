//! Brightness as a percentage of the light's maximum output.

use serde::{Deserialize, Serialize};

/// Brightness level from 0 to 100 percent.
#[derive(Default, Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(transparent)]
pub struct Brightness {
    pub(crate) value: u8,
}

impl Brightness {
    pub(crate) const MIN: i64 = 0;
    pub(crate) const MAX: i64 = 100;

    /// Full brightness.
    pub fn new() -> Self {
        Brightness { value: 100 }
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    /// Returns None if value is outside the valid range (0-100).
    ///
    /// # Examples
    ///
    /// ```
    /// use prism::Brightness;
    ///
    /// assert!(Brightness::create(-1).is_none());
    /// assert_eq!(Brightness::create(0).unwrap().value(), 0);
    /// assert_eq!(Brightness::create(100).unwrap().value(), 100);
    /// assert!(Brightness::create(101).is_none());
    /// ```
    pub fn create(value: i64) -> Option<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Some(Brightness { value: value as u8 })
        } else {
            None
        }
    }

    /// Scale onto `0..=max`, truncating like integer division.
    ///
    /// ```
    /// use prism::Brightness;
    ///
    /// assert_eq!(Brightness::create(50).unwrap().scale_to(65535), 32767);
    /// assert_eq!(Brightness::new().scale_to(65535), 65535);
    /// ```
    pub fn scale_to(&self, max: u16) -> u16 {
        (u32::from(self.value) * u32::from(max) / 100) as u16
    }

    /// Inverse of [`Brightness::scale_to`], rounding to the nearest percent.
    pub fn from_scaled(level: u16, max: u16) -> Self {
        if max == 0 {
            return Brightness { value: 0 };
        }
        let pct = (f64::from(level) * 100.0 / f64::from(max)).round();
        Brightness {
            value: pct.clamp(0.0, 100.0) as u8,
        }
    }
}
