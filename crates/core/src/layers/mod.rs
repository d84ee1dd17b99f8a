//! Layer registry: keyed overlay collection with stable rendering order.
//!
//! Rendering order is insertion order for new ids; replacing an existing id
//! keeps its position. Updates that target a missing id are no-ops, since
//! async results may land after their layer was removed. Concurrent results
//! for the same id resolve last-write-wins by arrival.

mod layer;

pub use layer::{clamp_opacity, LayerData, LayerStatus, LayerType, MapLayer};

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{Error, Result};

/// The overlays owned by one map view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerRegistry {
    layers: IndexMap<String, MapLayer>,
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a layer, or replace the one with the same id in place.
    ///
    /// Returns the replaced layer, if any.
    pub fn upsert(&mut self, mut layer: MapLayer) -> Option<MapLayer> {
        layer.opacity = clamp_opacity(layer.opacity).unwrap_or(1.0);
        self.layers.insert(layer.id().to_string(), layer)
    }

    /// Set visibility. Returns `false` (and does nothing) for an unknown id.
    pub fn set_visibility(&mut self, id: &str, visible: bool) -> bool {
        match self.layers.get_mut(id) {
            Some(layer) => {
                layer.visible = visible;
                true
            }
            None => {
                debug!(id, "visibility update for unknown layer ignored");
                false
            }
        }
    }

    /// Flip visibility, returning the new value.
    pub fn toggle_visibility(&mut self, id: &str) -> Option<bool> {
        let layer = self.layers.get_mut(id)?;
        layer.visible = !layer.visible;
        Some(layer.visible)
    }

    /// Set opacity, clamped to `[0, 1]`.
    ///
    /// Returns `false` for an unknown id or a non-finite value.
    pub fn set_opacity(&mut self, id: &str, opacity: f32) -> bool {
        let Some(layer) = self.layers.get_mut(id) else {
            debug!(id, "opacity update for unknown layer ignored");
            return false;
        };
        match clamp_opacity(opacity) {
            Some(o) => {
                layer.opacity = o;
                true
            }
            None => false,
        }
    }

    /// Swap the whole layer set at once.
    ///
    /// If `layers` repeats an id, the later entry wins and keeps the first
    /// entry's position.
    pub fn replace_all(&mut self, layers: impl IntoIterator<Item = MapLayer>) {
        let mut next = LayerRegistry::new();
        for layer in layers {
            next.upsert(layer);
        }
        *self = next;
    }

    /// Remove a layer, preserving the order of the rest.
    pub fn remove(&mut self, id: &str) -> Option<MapLayer> {
        self.layers.shift_remove(id)
    }

    pub fn clear(&mut self) {
        self.layers.clear();
    }

    pub fn get(&self, id: &str) -> Option<&MapLayer> {
        self.layers.get(id)
    }

    /// Like [`Self::get`] but reports a missing id as an error.
    pub fn require(&self, id: &str) -> Result<&MapLayer> {
        self.layers
            .get(id)
            .ok_or_else(|| Error::UnknownLayerId(id.to_string()))
    }

    /// Position of a layer in rendering order.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.layers.get_index_of(id)
    }

    /// All layers in rendering order.
    pub fn iter(&self) -> impl Iterator<Item = &MapLayer> {
        self.layers.values()
    }

    /// Visible layers in rendering order.
    pub fn visible(&self) -> impl Iterator<Item = &MapLayer> {
        self.layers.values().filter(|l| l.visible)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.layers.keys().map(String::as_str)
    }

    /// Owned copy of the layers, in rendering order.
    pub fn snapshot(&self) -> Vec<MapLayer> {
        self.layers.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl FromIterator<MapLayer> for LayerRegistry {
    fn from_iter<I: IntoIterator<Item = MapLayer>>(iter: I) -> Self {
        let mut registry = LayerRegistry::new();
        registry.replace_all(iter);
        registry
    }
}
