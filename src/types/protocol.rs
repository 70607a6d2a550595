//! Vendor protocol tags.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// Identifies which vendor adapter owns a light.
///
/// The string form is the stable tag exposed to API consumers.
///
/// ```
/// use std::str::FromStr;
/// use prism::Protocol;
///
/// assert_eq!(Protocol::Lifx.to_string(), "Lifx.v1");
/// assert_eq!(Protocol::from_str("Yeelight.v1").unwrap(), Protocol::Yeelight);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
pub enum Protocol {
    #[strum(serialize = "Lifx.v1")]
    #[serde(rename = "Lifx.v1")]
    Lifx,
    #[strum(serialize = "Yeelight.v1")]
    #[serde(rename = "Yeelight.v1")]
    Yeelight,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_tags_round_trip() {
        for protocol in Protocol::iter() {
            let tag = protocol.to_string();
            assert_eq!(Protocol::from_str(&tag).unwrap(), protocol);
            assert_eq!(serde_json::to_value(protocol).unwrap(), tag.as_str());
        }
    }
}
