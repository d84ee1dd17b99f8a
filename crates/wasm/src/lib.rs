//! WebAssembly bindings for the yieldmap map page.
//!
//! Exposes the boundary drawing machine and the layer registry to JavaScript.
//! Geometry, layers and legends cross the boundary as JSON strings; the map
//! widget forwards clicks and renders whatever these objects report.

use wasm_bindgen::prelude::*;

use yieldmap_colormap::legend_entries;
use yieldmap_core::{
    BoundaryConsumer, BoundaryDrawer, FeatureCollection, LayerRegistry, MapLayer,
};

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Keeps the last boundary notification for the page to pick up.
#[derive(Default)]
struct LatestBoundary(Option<FeatureCollection>);

impl BoundaryConsumer for LatestBoundary {
    fn boundary_changed(&mut self, boundary: Option<&FeatureCollection>) {
        self.0 = boundary.cloned();
    }
}

// ===========================================================================
// Boundary drawing
// ===========================================================================

#[wasm_bindgen]
pub struct WasmBoundaryDrawer {
    inner: BoundaryDrawer<LatestBoundary>,
}

#[wasm_bindgen]
impl WasmBoundaryDrawer {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            inner: BoundaryDrawer::new(LatestBoundary::default()),
        }
    }

    /// Begin a new draft, discarding any previous one.
    pub fn start(&mut self) {
        self.inner.start();
    }

    /// Map click. Ignored unless drawing.
    pub fn click(&mut self, lat: f64, lng: f64) {
        self.inner.click(lat, lng);
    }

    pub fn undo(&mut self) {
        self.inner.undo();
    }

    /// Close the polygon. Returns the GeoJSON feature collection, or
    /// `undefined` when fewer than three points were placed.
    pub fn finish(&mut self) -> Result<Option<String>, JsValue> {
        if !self.inner.finish() {
            return Ok(None);
        }
        self.boundary()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// `"idle"`, `"drawing"` or `"closed"`.
    pub fn state(&self) -> String {
        self.inner.state().name().to_string()
    }

    /// Points to render for the current state, as `[[lat, lng], ...]`.
    pub fn points(&self) -> String {
        let pts: Vec<[f64; 2]> = self
            .inner
            .state()
            .preview()
            .iter()
            .map(|p| [p.lat, p.lng])
            .collect();
        serde_json::json!(pts).to_string()
    }

    /// Last boundary handed out, or `undefined` after a clear.
    pub fn boundary(&self) -> Result<Option<String>, JsValue> {
        self.inner
            .consumer()
            .0
            .as_ref()
            .map(|fc| fc.to_json_string().map_err(js_err))
            .transpose()
    }

    /// Geodesic area of the closed boundary in km².
    pub fn area_km2(&self) -> Option<f64> {
        self.inner.state().committed().map(|b| b.area_km2())
    }
}

impl Default for WasmBoundaryDrawer {
    fn default() -> Self {
        Self::new()
    }
}

// ===========================================================================
// Layers
// ===========================================================================

#[wasm_bindgen]
pub struct WasmLayerRegistry {
    inner: LayerRegistry,
}

#[wasm_bindgen]
impl WasmLayerRegistry {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            inner: LayerRegistry::new(),
        }
    }

    /// Insert or replace one layer given as a JSON object.
    pub fn upsert(&mut self, layer_json: &str) -> Result<(), JsValue> {
        let layer: MapLayer = serde_json::from_str(layer_json).map_err(js_err)?;
        self.inner.upsert(layer);
        Ok(())
    }

    /// Swap every layer for the JSON array given.
    pub fn replace_all(&mut self, layers_json: &str) -> Result<(), JsValue> {
        let layers: Vec<MapLayer> = serde_json::from_str(layers_json).map_err(js_err)?;
        self.inner.replace_all(layers);
        Ok(())
    }

    /// Returns `false` for an unknown id.
    pub fn set_visibility(&mut self, id: &str, visible: bool) -> bool {
        self.inner.set_visibility(id, visible)
    }

    pub fn toggle_visibility(&mut self, id: &str) -> Option<bool> {
        self.inner.toggle_visibility(id)
    }

    /// Clamped to `[0, 1]`. Returns `false` for an unknown id or NaN.
    pub fn set_opacity(&mut self, id: &str, opacity: f32) -> bool {
        self.inner.set_opacity(id, opacity)
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.inner.remove(id).is_some()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// All layers in rendering order, as a JSON array.
    pub fn layers(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.inner.snapshot()).map_err(js_err)
    }

    /// Legend rows for the visible layers, as a JSON array.
    pub fn legend(&self) -> Result<String, JsValue> {
        serde_json::to_string(&legend_entries(&self.inner)).map_err(js_err)
    }
}

impl Default for WasmLayerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn drawer_round_trip() {
        let mut d = WasmBoundaryDrawer::new();
        assert_eq!(d.state(), "idle");
        d.click(1.0, 1.0);
        assert_eq!(d.points(), "[]");

        d.start();
        d.click(10.0, 10.0);
        d.click(10.0, 20.0);
        assert_eq!(d.finish().unwrap(), None);
        assert_eq!(d.state(), "drawing");

        d.click(20.0, 20.0);
        d.click(20.0, 10.0);
        let json = d.finish().unwrap().unwrap();
        assert_eq!(d.state(), "closed");
        let v: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            v["features"][0]["geometry"]["coordinates"][0],
            serde_json::json!([[10.0, 10.0], [20.0, 10.0], [20.0, 20.0], [10.0, 20.0], [10.0, 10.0]])
        );
        assert!(d.area_km2().unwrap() > 0.0);

        d.clear();
        assert_eq!(d.state(), "idle");
        assert_eq!(d.boundary().unwrap(), None);
    }

    #[test]
    fn points_preview_is_lat_lng() {
        let mut d = WasmBoundaryDrawer::new();
        d.start();
        d.click(45.5, -73.6);
        let v: Value = serde_json::from_str(&d.points()).unwrap();
        assert_eq!(v, serde_json::json!([[45.5, -73.6]]));
    }

    #[test]
    fn registry_from_json() {
        let mut r = WasmLayerRegistry::new();
        r.upsert(r#"{"id": "a", "type": "urban", "visible": true, "opacity": 0.7}"#)
            .unwrap();
        assert!(!r.set_visibility("b", true));
        assert!(r.set_visibility("a", false));
        assert!(r.set_opacity("a", 1.5));

        let layers: Value = serde_json::from_str(&r.layers().unwrap()).unwrap();
        assert_eq!(layers.as_array().unwrap().len(), 1);
        assert_eq!(layers[0]["visible"], false);
        assert_eq!(layers[0]["opacity"], 1.0);
        assert_eq!(r.legend().unwrap(), "[]");

        r.replace_all(
            r#"[{"id": "s1", "type": "crop_yield", "visible": true, "opacity": 0.5},
                {"id": "s2", "type": "soil_moisture", "visible": true, "opacity": 0.5}]"#,
        )
        .unwrap();
        assert_eq!(r.len(), 2);
        let legend: Value = serde_json::from_str(&r.legend().unwrap()).unwrap();
        assert_eq!(legend[0]["ramp"], "Crop Yield");
        assert_eq!(legend[1]["ramp"], "Generic");
    }
}
