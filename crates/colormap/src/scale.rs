//! Stepped blue-to-red color scales for value classification.

use crate::scheme::Rgba;

/// Convert HSL (hue in degrees, saturation and lightness in [0, 1]) to RGB.
pub fn hsl_to_rgb(h: f64, s: f64, l: f64) -> Rgba {
    let h = h.rem_euclid(360.0);
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r, g, b) = match h {
        h if h < 60.0 => (c, x, 0.0),
        h if h < 120.0 => (x, c, 0.0),
        h if h < 180.0 => (0.0, c, x),
        h if h < 240.0 => (0.0, x, c),
        h if h < 300.0 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    let to_u8 = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgba::opaque(to_u8(r), to_u8(g), to_u8(b))
}

/// Generate `steps` colors from blue (hue 240) to red (hue 0).
///
/// A single step yields just blue; zero steps yield an empty scale.
pub fn color_scale(steps: usize) -> Vec<Rgba> {
    match steps {
        0 => Vec::new(),
        1 => vec![hsl_to_rgb(240.0, 1.0, 0.5)],
        n => (0..n)
            .map(|i| {
                let ratio = i as f64 / (n - 1) as f64;
                hsl_to_rgb((1.0 - ratio) * 240.0, 1.0, 0.5)
            })
            .collect(),
    }
}

/// Pick the scale bucket for `value` within `[min, max]`.
///
/// Values at or beyond the ends clamp to the first/last color. Returns
/// `None` for an empty scale or a NaN value.
pub fn value_color(value: f64, min: f64, max: f64, scale: &[Rgba]) -> Option<Rgba> {
    let (first, last) = (scale.first()?, scale.last()?);
    if value.is_nan() {
        return None;
    }
    if value <= min {
        return Some(*first);
    }
    if value >= max {
        return Some(*last);
    }
    let ratio = (value - min) / (max - min);
    let index = (ratio * (scale.len() - 1) as f64).floor() as usize;
    scale.get(index).copied()
}
