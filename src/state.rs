//! Vendor neutral light state.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{Field, ValidationError};
use crate::types::{Brightness, Color, Kelvin, Transition};

type Result<T> = std::result::Result<T, ValidationError>;

/// Desired or last known state of a light.
///
/// Every attribute is optional. An unset attribute means "leave it alone"
/// in a desired state and "unknown" in a cached one.
///
/// # Example
///
/// ```
/// use prism::{Color, LightState};
///
/// let mut state = LightState::new();
/// state.set_power(true).set_brightness(50)?.set_duration(4)?;
/// state.set_color([255, 0, 0])?;
///
/// assert_eq!(state.power(), Some(true));
/// assert_eq!(state.brightness().unwrap().value(), 50);
/// assert_eq!(state.color(), Some(&Color::rgb(255, 0, 0)));
/// assert!(state.kelvin().is_none());
/// # Ok::<(), prism::ValidationError>(())
/// ```
#[serde_with::skip_serializing_none]
#[derive(Default, Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(try_from = "RawLightState")]
pub struct LightState {
    power: Option<bool>,
    duration: Option<Transition>,
    brightness: Option<Brightness>,
    color: Option<Color>,
    kelvin: Option<Kelvin>,
}

impl LightState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn power(&self) -> Option<bool> {
        self.power
    }

    pub fn duration(&self) -> Option<&Transition> {
        self.duration.as_ref()
    }

    pub fn brightness(&self) -> Option<&Brightness> {
        self.brightness.as_ref()
    }

    pub fn color(&self) -> Option<&Color> {
        self.color.as_ref()
    }

    pub fn kelvin(&self) -> Option<&Kelvin> {
        self.kelvin.as_ref()
    }

    pub fn set_power(&mut self, power: bool) -> &mut Self {
        self.power = Some(power);
        self
    }

    /// Set the transition time in seconds (0-3600).
    pub fn set_duration(&mut self, seconds: i64) -> Result<&mut Self> {
        let duration =
            Transition::create(seconds).ok_or_else(|| ValidationError::new(Field::Duration, seconds))?;
        self.duration = Some(duration);
        Ok(self)
    }

    /// Set the brightness percentage (0-100).
    ///
    /// A rejected value leaves the previous one in place.
    ///
    /// ```
    /// use prism::LightState;
    ///
    /// let mut state = LightState::new();
    /// state.set_brightness(80).unwrap();
    /// assert!(state.set_brightness(101).is_err());
    /// assert_eq!(state.brightness().unwrap().value(), 80);
    /// ```
    pub fn set_brightness(&mut self, brightness: i64) -> Result<&mut Self> {
        let brightness = Brightness::create(brightness)
            .ok_or_else(|| ValidationError::new(Field::Brightness, brightness))?;
        self.brightness = Some(brightness);
        Ok(self)
    }

    /// Set the RGB color, each channel 0-255.
    pub fn set_color(&mut self, channels: [i64; 3]) -> Result<&mut Self> {
        let color = Color::create(channels)
            .ok_or_else(|| ValidationError::new(Field::Color, format!("{channels:?}")))?;
        self.color = Some(color);
        Ok(self)
    }

    /// Set the color temperature in Kelvin (2500-9000).
    pub fn set_kelvin(&mut self, kelvin: i64) -> Result<&mut Self> {
        let kelvin =
            Kelvin::create(kelvin).ok_or_else(|| ValidationError::new(Field::Kelvin, kelvin))?;
        self.kelvin = Some(kelvin);
        Ok(self)
    }

    /// Set a field from an untyped JSON value.
    ///
    /// Values of the wrong kind are rejected like out of range ones.
    ///
    /// ```
    /// use prism::{Field, LightState};
    /// use serde_json::json;
    ///
    /// let mut state = LightState::new();
    /// state.set(Field::Color, &json!([0, 128, 255])).unwrap();
    ///
    /// let err = state.set(Field::Power, &json!("on")).unwrap_err();
    /// assert_eq!(err.field, Field::Power);
    /// assert_eq!(err.value, "\"on\"");
    /// ```
    pub fn set(&mut self, field: Field, value: &Value) -> Result<&mut Self> {
        let wrong_kind = || ValidationError::new(field, value);
        match field {
            Field::Power => Ok(self.set_power(value.as_bool().ok_or_else(wrong_kind)?)),
            Field::Duration => self.set_duration(value.as_i64().ok_or_else(wrong_kind)?),
            Field::Brightness => self.set_brightness(value.as_i64().ok_or_else(wrong_kind)?),
            Field::Kelvin => self.set_kelvin(value.as_i64().ok_or_else(wrong_kind)?),
            Field::Color => {
                let channels = value
                    .as_array()
                    .filter(|c| c.len() == 3)
                    .and_then(|c| {
                        Some([c[0].as_i64()?, c[1].as_i64()?, c[2].as_i64()?])
                    })
                    .ok_or_else(wrong_kind)?;
                self.set_color(channels).map_err(|_| wrong_kind())
            }
        }
    }

    /// Whether this state asks for any visible change.
    ///
    /// A bare duration changes nothing on its own.
    pub fn has_changes(&self) -> bool {
        self.power.is_some()
            || self.brightness.is_some()
            || self.color.is_some()
            || self.kelvin.is_some()
    }

    /// Update this state with values from another state.
    ///
    /// Values set in `other` overwrite values in `self`; unset ones are left alone.
    ///
    /// # Examples
    ///
    /// ```
    /// use prism::LightState;
    ///
    /// let mut known = LightState::new();
    /// known.set_power(true).set_kelvin(4000).unwrap();
    ///
    /// let mut change = LightState::new();
    /// change.set_power(false).set_brightness(20).unwrap();
    ///
    /// known.update(&change);
    /// assert_eq!(known.power(), Some(false));
    /// assert_eq!(known.kelvin().unwrap().kelvin(), 4000);
    /// assert_eq!(known.brightness().unwrap().value(), 20);
    /// ```
    pub fn update(&mut self, other: &Self) {
        if let Some(power) = other.power {
            self.power = Some(power);
        }
        if let Some(duration) = other.duration {
            self.duration = Some(duration);
        }
        if let Some(brightness) = other.brightness {
            self.brightness = Some(brightness);
        }
        if let Some(color) = other.color {
            self.color = Some(color);
        }
        if let Some(kelvin) = other.kelvin {
            self.kelvin = Some(kelvin);
        }
    }

    pub(crate) fn with_power(mut self, power: Option<bool>) -> Self {
        self.power = power;
        self
    }

    pub(crate) fn with_brightness(mut self, brightness: Option<Brightness>) -> Self {
        self.brightness = brightness;
        self
    }

    pub(crate) fn with_color(mut self, color: Option<Color>) -> Self {
        self.color = color;
        self
    }

    pub(crate) fn with_kelvin(mut self, kelvin: Option<Kelvin>) -> Self {
        self.kelvin = kelvin;
        self
    }

    pub(crate) fn with_duration(mut self, duration: Option<Transition>) -> Self {
        self.duration = duration;
        self
    }
}

/// Inbound shape of a light state, before validation.
#[derive(Debug, Default, Deserialize)]
struct RawLightState {
    power: Option<Value>,
    duration: Option<Value>,
    brightness: Option<Value>,
    color: Option<Value>,
    kelvin: Option<Value>,
}

impl TryFrom<RawLightState> for LightState {
    type Error = ValidationError;

    fn try_from(raw: RawLightState) -> Result<Self> {
        let mut state = LightState::new();
        for (field, value) in [
            (Field::Power, raw.power),
            (Field::Duration, raw.duration),
            (Field::Brightness, raw.brightness),
            (Field::Color, raw.color),
            (Field::Kelvin, raw.kelvin),
        ] {
            match value {
                None | Some(Value::Null) => {}
                Some(value) => {
                    state.set(field, &value)?;
                }
            }
        }
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_state() -> LightState {
        let mut state = LightState::new();
        state
            .set_power(true)
            .set_duration(10)
            .unwrap()
            .set_brightness(75)
            .unwrap()
            .set_color([1, 2, 3])
            .unwrap()
            .set_kelvin(6500)
            .unwrap();
        state
    }

    #[test]
    fn test_round_trip_at_domain_edges() {
        let mut state = LightState::new();
        for seconds in [0, 1, 3600] {
            state.set_duration(seconds).unwrap();
            assert_eq!(i64::from(state.duration().unwrap().seconds()), seconds);
        }
        for pct in [0, 50, 100] {
            state.set_brightness(pct).unwrap();
            assert_eq!(i64::from(state.brightness().unwrap().value()), pct);
        }
        for kelvin in [2500, 9000] {
            state.set_kelvin(kelvin).unwrap();
            assert_eq!(i64::from(state.kelvin().unwrap().kelvin()), kelvin);
        }
        state.set_color([0, 255, 17]).unwrap();
        assert_eq!(state.color(), Some(&Color::rgb(0, 255, 17)));
        state.set_power(false);
        assert_eq!(state.power(), Some(false));
    }

    #[test]
    fn test_rejected_values_keep_previous() {
        let mut state = full_state();
        let before = state.clone();

        let err = state.set_brightness(101).unwrap_err();
        assert_eq!(err.field, Field::Brightness);
        assert_eq!(err.value, "101");
        assert!(state.set_kelvin(1000).is_err());
        assert!(state.set_duration(-1).is_err());
        assert!(state.set_duration(3601).is_err());
        assert!(state.set_color([0, 0, 256]).is_err());
        assert!(state.set(Field::Brightness, &json!(50.5)).is_err());
        assert!(state.set(Field::Color, &json!([1, 2])).is_err());
        assert!(state.set(Field::Kelvin, &json!("4000")).is_err());

        assert_eq!(state, before);
    }

    #[test]
    fn test_partial_state_is_legal() {
        let mut state = LightState::new();
        state.set_kelvin(3000).unwrap();
        assert!(state.power().is_none());
        assert!(state.has_changes());
    }

    #[test]
    fn test_duration_alone_is_not_a_change() {
        let mut state = LightState::new();
        state.set_duration(5).unwrap();
        assert!(!state.has_changes());
    }

    #[test]
    fn test_update_with_empty_is_noop() {
        let mut state = full_state();
        state.update(&LightState::new());
        assert_eq!(state, full_state());
    }

    #[test]
    fn test_update_with_full_state_overwrites() {
        let mut state = LightState::new();
        state.set_power(false).set_brightness(1).unwrap();
        state.set_color([9, 9, 9]).unwrap();
        state.update(&full_state());
        assert_eq!(state, full_state());
    }

    #[test]
    fn test_deserialize_validates() {
        let state: LightState = serde_json::from_value(json!({
            "power": true,
            "brightness": 40,
            "color": [255, 0, 0],
            "kelvin": null,
            "extra": "ignored",
        }))
        .unwrap();
        assert_eq!(state.power(), Some(true));
        assert_eq!(state.brightness().unwrap().value(), 40);
        assert!(state.kelvin().is_none());

        let err = serde_json::from_value::<LightState>(json!({"brightness": 101})).unwrap_err();
        assert!(err.to_string().contains("brightness"));
        assert!(serde_json::from_value::<LightState>(json!({"duration": -1})).is_err());
        assert!(serde_json::from_value::<LightState>(json!({"power": 1})).is_err());
    }

    #[test]
    fn test_serialize_skips_unset() {
        let mut state = LightState::new();
        state.set_color([255, 0, 0]).unwrap().set_duration(4).unwrap();
        assert_eq!(
            serde_json::to_value(&state).unwrap(),
            json!({"duration": 4, "color": [255, 0, 0]})
        );
        let back: LightState = serde_json::from_value(serde_json::to_value(&state).unwrap()).unwrap();
        assert_eq!(back, state);
    }
}
