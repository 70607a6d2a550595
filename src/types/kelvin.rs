//! Color temperature control.

use serde::{Deserialize, Serialize};

/// Color temperature in Kelvin, with valid values from 2500K to 9000K.
///
/// Lower values produce warmer (more yellow/orange) light, while higher
/// values produce cooler (more blue) light.
#[derive(Default, Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(transparent)]
pub struct Kelvin {
    pub(crate) kelvin: u16,
}

impl Kelvin {
    pub(crate) const MIN: u16 = 2500;
    pub(crate) const MAX: u16 = 9000;

    /// Create a new Kelvin with the default value (2500K).
    ///
    /// # Examples
    ///
    /// ```
    /// use prism::Kelvin;
    ///
    /// assert_eq!(Kelvin::new().kelvin(), 2500);
    /// ```
    pub fn new() -> Self {
        Kelvin { kelvin: Self::MIN }
    }

    pub fn kelvin(&self) -> u16 {
        self.kelvin
    }

    /// Returns `None` if value is outside the valid range (2500-9000).
    ///
    /// # Examples
    ///
    /// ```
    /// use prism::Kelvin;
    ///
    /// assert!(Kelvin::create(1000).is_none());
    /// assert!(Kelvin::create(2500).is_some());
    /// assert!(Kelvin::create(9000).is_some());
    /// assert!(Kelvin::create(9001).is_none());
    /// ```
    pub fn create(kelvin: i64) -> Option<Self> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&kelvin) {
            Some(Kelvin {
                kelvin: kelvin as u16,
            })
        } else {
            None
        }
    }

    /// Pull a device-reported temperature into the valid range.
    ///
    /// ```
    /// use prism::Kelvin;
    ///
    /// assert_eq!(Kelvin::saturating(1700).kelvin(), 2500);
    /// assert_eq!(Kelvin::saturating(4000).kelvin(), 4000);
    /// ```
    pub fn saturating(kelvin: u16) -> Self {
        Kelvin {
            kelvin: kelvin.clamp(Self::MIN, Self::MAX),
        }
    }
}
