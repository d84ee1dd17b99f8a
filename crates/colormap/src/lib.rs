//! # yieldmap colormap
//!
//! Legend ramps and color scales for yieldmap map layers.
//!
//! Every known [`LayerType`](yieldmap_core::LayerType) maps to a three-stop
//! RGBA [`Ramp`] with low/high labels; unrecognised types fall back to
//! [`Ramp::Generic`] instead of failing. [`legend_entries`] turns the visible
//! layers of a registry into legend rows.
//!
//! ## Usage
//!
//! ```ignore
//! use yieldmap_colormap::{legend_entries, evaluate, Ramp};
//!
//! let rows = legend_entries(&registry);
//! let mid = evaluate(Ramp::CropYield, 0.5);
//! ```

mod legend;
mod scale;
mod scheme;

pub use legend::{legend_entries, LegendEntry};
pub use scale::{color_scale, hsl_to_rgb, value_color};
pub use scheme::{evaluate, ColorStop, Ramp, Rgba};
