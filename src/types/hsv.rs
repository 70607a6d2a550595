//! Hue, saturation and value color representation.

use super::Color;

/// HSV color, the common currency between [`Color`] and vendor color spaces.
///
/// - Hue: the color angle on the color wheel (0 up to, not including, 360 degrees)
/// - Saturation: the intensity of the color (0.0-1.0)
/// - Value: the lightness of the color (0.0-1.0)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Hsv {
    hue: f32,
    saturation: f32,
    value: f32,
}

impl Hsv {
    /// Returns `None` if any component is outside its range.
    ///
    /// # Examples
    ///
    /// ```
    /// use prism::Hsv;
    ///
    /// assert!(Hsv::create(0.0, 1.0, 1.0).is_some());
    /// assert!(Hsv::create(360.0, 0.5, 1.0).is_none());
    /// assert!(Hsv::create(180.0, 1.5, 1.0).is_none());
    /// ```
    pub fn create(hue: f32, saturation: f32, value: f32) -> Option<Self> {
        let unit = 0.0..=1.0;
        if (0.0..360.0).contains(&hue) && unit.contains(&saturation) && unit.contains(&value) {
            Some(Hsv {
                hue,
                saturation,
                value,
            })
        } else {
            None
        }
    }

    pub fn hue(&self) -> f32 {
        self.hue
    }

    pub fn saturation(&self) -> f32 {
        self.saturation
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// Standard RGB to HSV conversion. Grays report hue 0.
    ///
    /// # Examples
    ///
    /// ```
    /// use prism::{Color, Hsv};
    ///
    /// let white = Hsv::from_color(&Color::rgb(255, 255, 255));
    /// assert_eq!((white.hue(), white.saturation(), white.value()), (0.0, 0.0, 1.0));
    ///
    /// let blue = Hsv::from_color(&Color::rgb(0, 0, 255));
    /// assert_eq!((blue.hue(), blue.saturation(), blue.value()), (240.0, 1.0, 1.0));
    /// ```
    pub fn from_color(color: &Color) -> Self {
        let r = f32::from(color.red) / 255.0;
        let g = f32::from(color.green) / 255.0;
        let b = f32::from(color.blue) / 255.0;

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        if max == 0.0 || delta == 0.0 {
            return Hsv {
                hue: 0.0,
                saturation: 0.0,
                value: max,
            };
        }

        let sector = if max == r {
            ((g - b) / delta).rem_euclid(6.0)
        } else if max == g {
            (b - r) / delta + 2.0
        } else {
            (r - g) / delta + 4.0
        };

        Hsv {
            hue: (sector * 60.0) % 360.0,
            saturation: delta / max,
            value: max,
        }
    }

    /// Convert to RGB Color.
    ///
    /// ```
    /// use prism::{Color, Hsv};
    ///
    /// let red = Hsv::create(0.0, 1.0, 1.0).unwrap();
    /// assert_eq!(red.to_color(), Color::rgb(255, 0, 0));
    /// ```
    pub fn to_color(&self) -> Color {
        let s = self.saturation;
        let v = self.value;

        if s == 0.0 {
            let gray = (v * 255.0).round() as u8;
            return Color::rgb(gray, gray, gray);
        }

        let h = self.hue / 60.0;
        let i = h.floor() as i32;
        let f = h - i as f32;
        let p = v * (1.0 - s);
        let q = v * (1.0 - s * f);
        let t = v * (1.0 - s * (1.0 - f));

        let (r, g, b) = match i % 6 {
            0 => (v, t, p),
            1 => (q, v, p),
            2 => (p, v, t),
            3 => (p, q, v),
            4 => (t, p, v),
            _ => (v, p, q),
        };

        Color::rgb(
            (r * 255.0).round() as u8,
            (g * 255.0).round() as u8,
            (b * 255.0).round() as u8,
        )
    }
}

impl From<&Color> for Hsv {
    fn from(color: &Color) -> Self {
        Hsv::from_color(color)
    }
}

impl From<&Hsv> for Color {
    fn from(hsv: &Hsv) -> Self {
        hsv.to_color()
    }
}
