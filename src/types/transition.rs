//! Transition time for a state change.

use serde::{Deserialize, Serialize};

/// How long a light takes to fade into a new state, from 0 to 3600 seconds.
#[derive(Default, Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(transparent)]
pub struct Transition {
    pub(crate) seconds: u16,
}

impl Transition {
    pub(crate) const MAX: i64 = 3600;

    /// An instant change.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seconds(&self) -> u16 {
        self.seconds
    }

    /// # Examples
    ///
    /// ```
    /// use prism::Transition;
    ///
    /// assert!(Transition::create(-1).is_none());
    /// assert_eq!(Transition::create(3600).unwrap().millis(), 3_600_000);
    /// assert!(Transition::create(3601).is_none());
    /// ```
    pub fn create(seconds: i64) -> Option<Self> {
        if (0..=Self::MAX).contains(&seconds) {
            Some(Transition {
                seconds: seconds as u16,
            })
        } else {
            None
        }
    }

    pub fn millis(&self) -> u32 {
        u32::from(self.seconds) * 1000
    }
}
