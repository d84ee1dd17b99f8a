//! Legend ramps per layer type and the multi-stop interpolation engine.

use serde::{Serialize, Serializer};
use yieldmap_core::LayerType;

/// RGBA color with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// CSS `rgba()` notation, alpha with two decimals.
    pub fn to_css(&self) -> String {
        format!(
            "rgba({},{},{},{:.2})",
            self.r,
            self.g,
            self.b,
            self.a as f64 / 255.0
        )
    }

    /// `#rrggbb` hex notation (alpha dropped).
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Serialize for Rgba {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_css())
    }
}

/// A color stop: position in [0, 1] mapped to a color.
#[derive(Debug, Clone, Copy)]
pub struct ColorStop {
    pub t: f64,
    pub color: Rgba,
}

impl ColorStop {
    pub const fn new(t: f64, r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            t,
            color: Rgba::new(r, g, b, a),
        }
    }
}

/// Legend ramps. One per known layer type plus a generic fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ramp {
    /// Green -> Amber -> Rose (low to high urbanisation)
    Urban,
    /// Rose -> Amber -> Green (low to high yield)
    CropYield,
    /// Translucent -> solid cyan
    Temperature,
    /// Translucent -> solid cyan
    Precipitation,
    /// Translucent -> solid white, for unrecognised layer types
    Generic,
}

impl Ramp {
    pub const ALL: &[Ramp] = &[
        Self::Urban,
        Self::CropYield,
        Self::Temperature,
        Self::Precipitation,
        Self::Generic,
    ];

    /// Ramp for a layer type; unknown types get [`Ramp::Generic`].
    pub fn for_layer(layer_type: &LayerType) -> Self {
        match layer_type {
            LayerType::Urban => Self::Urban,
            LayerType::CropYield => Self::CropYield,
            LayerType::Temperature => Self::Temperature,
            LayerType::Precipitation => Self::Precipitation,
            LayerType::Other(_) => Self::Generic,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Urban => "Urban",
            Self::CropYield => "Crop Yield",
            Self::Temperature => "Temperature",
            Self::Precipitation => "Precipitation",
            Self::Generic => "Generic",
        }
    }

    /// Labels for the low and high ends of the legend.
    pub fn labels(&self) -> (&'static str, &'static str) {
        match self {
            Self::Urban | Self::Generic => ("Low", "High"),
            Self::CropYield => ("Low Yield", "High Yield"),
            Self::Temperature => ("Cool", "Warm"),
            Self::Precipitation => ("Dry", "Wet"),
        }
    }

    pub fn stops(&self) -> &'static [ColorStop] {
        match self {
            Self::Urban => URBAN_STOPS,
            Self::CropYield => CROP_YIELD_STOPS,
            Self::Temperature | Self::Precipitation => CYAN_STOPS,
            Self::Generic => GENERIC_STOPS,
        }
    }

    /// Stop colors in order, as shown in a legend swatch.
    pub fn swatch(&self) -> Vec<Rgba> {
        self.stops().iter().map(|s| s.color).collect()
    }
}

// ─── Color stop definitions ───────────────────────────────────────────

const URBAN_STOPS: &[ColorStop] = &[
    ColorStop::new(0.0, 156, 255, 134, 102),
    ColorStop::new(0.5, 255, 213, 106, 128),
    ColorStop::new(1.0, 255, 122, 138, 153),
];

const CROP_YIELD_STOPS: &[ColorStop] = &[
    ColorStop::new(0.0, 255, 122, 138, 153),
    ColorStop::new(0.5, 255, 213, 106, 128),
    ColorStop::new(1.0, 156, 255, 134, 153),
];

const CYAN_STOPS: &[ColorStop] = &[
    ColorStop::new(0.0, 127, 224, 255, 102),
    ColorStop::new(0.5, 127, 224, 255, 153),
    ColorStop::new(1.0, 127, 224, 255, 204),
];

const GENERIC_STOPS: &[ColorStop] = &[
    ColorStop::new(0.0, 255, 255, 255, 51),
    ColorStop::new(0.5, 255, 255, 255, 102),
    ColorStop::new(1.0, 255, 255, 255, 153),
];

// ─── Interpolation engine ──────────────────────────────────────────────

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn lerp_channel(a: u8, b: u8, t: f64) -> u8 {
    lerp(a as f64, b as f64, t).round() as u8
}

fn lerp_color(c1: Rgba, c2: Rgba, t: f64) -> Rgba {
    Rgba::new(
        lerp_channel(c1.r, c2.r, t),
        lerp_channel(c1.g, c2.g, t),
        lerp_channel(c1.b, c2.b, t),
        lerp_channel(c1.a, c2.a, t),
    )
}

fn multi_stop(stops: &[ColorStop], t: f64) -> Rgba {
    if t.is_nan() || t <= 0.0 {
        return stops[0].color;
    }
    if t >= 1.0 {
        return stops[stops.len() - 1].color;
    }
    for i in 1..stops.len() {
        if t <= stops[i].t {
            let ratio = (t - stops[i - 1].t) / (stops[i].t - stops[i - 1].t);
            return lerp_color(stops[i - 1].color, stops[i].color, ratio);
        }
    }
    stops[stops.len() - 1].color
}

/// Evaluate a ramp at normalized position `t` ∈ [0, 1].
///
/// Out-of-range and NaN positions clamp to the end stops.
pub fn evaluate(ramp: Ramp, t: f64) -> Rgba {
    multi_stop(ramp.stops(), t)
}
