use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{HeatmapError, HeatmapResult};

/// HSL color: hue in degrees, saturation and lightness in percent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Hsl {
    pub hue: f32,
    pub saturation: f32,
    pub lightness: f32,
}

impl Hsl {
    pub const fn new_unchecked(hue: f32, saturation: f32, lightness: f32) -> Self {
        Self {
            hue,
            saturation,
            lightness,
        }
    }

    pub fn new(hue: f32, saturation: f32, lightness: f32) -> HeatmapResult<Self> {
        Self::new_unchecked(hue, saturation, lightness).validated("color")
    }

    /// Checks channel bounds, naming `key` in the error.
    pub fn validated(self, key: &str) -> HeatmapResult<Self> {
        let in_percent = |value: f32| (0.0..=100.0).contains(&value);
        if (0.0..360.0).contains(&self.hue) && in_percent(self.saturation) && in_percent(self.lightness)
        {
            Ok(self)
        } else {
            Err(HeatmapError::invalid_configuration(key, self))
        }
    }

    /// Channel-wise interpolation. Hue is interpolated linearly, not around the wheel.
    pub fn lerp(min: Hsl, max: Hsl, t: f32) -> Hsl {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let mix = |a: f32, b: f32| a + (b - a) * t;
        Hsl {
            hue: mix(min.hue, max.hue),
            saturation: mix(min.saturation, max.saturation),
            lightness: mix(min.lightness, max.lightness),
        }
    }

    pub fn to_rgb(self) -> [u8; 3] {
        let s = (self.saturation / 100.0).clamp(0.0, 1.0);
        let l = (self.lightness / 100.0).clamp(0.0, 1.0);
        let h = self.hue.rem_euclid(360.0) / 60.0;
        let chroma = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let x = chroma * (1.0 - (h % 2.0 - 1.0).abs());
        let (r, g, b) = match h as u32 {
            0 => (chroma, x, 0.0),
            1 => (x, chroma, 0.0),
            2 => (0.0, chroma, x),
            3 => (0.0, x, chroma),
            4 => (x, 0.0, chroma),
            _ => (chroma, 0.0, x),
        };
        let m = l - chroma / 2.0;
        let channel = |value: f32| ((value + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        [channel(r), channel(g), channel(b)]
    }
}

impl fmt::Display for Hsl {
    /// CSS form: `hsl(134, 100%, 60%)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hsl({}, {}%, {}%)",
            self.hue, self.saturation, self.lightness
        )
    }
}

/// The two endpoints a sample value is interpolated between.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ColorRamp {
    pub min: Hsl,
    pub max: Hsl,
}

impl ColorRamp {
    pub const DEFAULT_MIN: Hsl = Hsl::new_unchecked(134.0, 100.0, 100.0);
    pub const DEFAULT_MAX: Hsl = Hsl::new_unchecked(134.0, 100.0, 20.0);

    pub fn color_at(&self, t: f32) -> Hsl {
        Hsl::lerp(self.min, self.max, t)
    }
}

impl Default for ColorRamp {
    fn default() -> Self {
        Self {
            min: Self::DEFAULT_MIN,
            max: Self::DEFAULT_MAX,
        }
    }
}
