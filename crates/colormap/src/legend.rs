//! Legend rows for the visible layers of a registry.

use serde::Serialize;
use yieldmap_core::{LayerRegistry, MapLayer};

use crate::scheme::{Ramp, Rgba};

/// One legend row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegendEntry {
    pub layer_id: String,
    pub title: String,
    pub ramp: &'static str,
    pub colors: Vec<Rgba>,
    pub min_label: &'static str,
    pub max_label: &'static str,
    pub opacity: f32,
}

impl LegendEntry {
    pub fn for_layer(layer: &MapLayer) -> Self {
        let ramp = Ramp::for_layer(&layer.layer_type);
        let (min_label, max_label) = ramp.labels();
        Self {
            layer_id: layer.id().to_string(),
            title: layer.display_name().into_owned(),
            ramp: ramp.name(),
            colors: ramp.swatch(),
            min_label,
            max_label,
            opacity: layer.opacity,
        }
    }
}

/// Legend rows for visible layers, in rendering order.
pub fn legend_entries(registry: &LayerRegistry) -> Vec<LegendEntry> {
    registry.visible().map(LegendEntry::for_layer).collect()
}
