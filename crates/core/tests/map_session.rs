//! A map session end to end: draw a boundary, hand it out, manage overlays.

use serde_json::{json, Value};
use yieldmap_core::{
    BoundaryDrawer, CommittedBoundary, FeatureCollection, LayerRegistry, LayerStatus, LayerType,
    MapLayer,
};

#[test]
fn drawn_boundary_reaches_consumer_as_geojson() {
    let mut received: Vec<Option<String>> = Vec::new();
    let mut drawer = BoundaryDrawer::new(|fc: Option<&FeatureCollection>| {
        received.push(fc.map(|fc| fc.to_json_string().unwrap()));
    });

    drawer.start();
    for (lat, lng) in [(10.0, 10.0), (10.0, 20.0), (20.0, 20.0), (20.0, 10.0)] {
        drawer.click(lat, lng);
    }
    assert!(drawer.finish());
    // Stray clicks after closing change nothing.
    drawer.click(50.0, 50.0);
    drawer.clear();
    drop(drawer);

    assert_eq!(received.len(), 2);
    let geojson: Value = serde_json::from_str(received[0].as_deref().unwrap()).unwrap();
    assert_eq!(geojson["type"], "FeatureCollection");
    assert_eq!(geojson["features"].as_array().unwrap().len(), 1);
    assert_eq!(geojson["features"][0]["geometry"]["type"], "Polygon");
    assert_eq!(
        geojson["features"][0]["geometry"]["coordinates"],
        json!([[[10.0, 10.0], [20.0, 10.0], [20.0, 20.0], [10.0, 20.0], [10.0, 10.0]]])
    );
    assert_eq!(received[1], None);

    // A page reloading the boundary gets the drawn vertices back.
    let fc = FeatureCollection::from_json_str(received[0].as_deref().unwrap()).unwrap();
    let boundary = CommittedBoundary::from_feature_collection(&fc).unwrap();
    assert_eq!(boundary.vertices().len(), 4);
    assert_eq!((boundary.vertices()[1].lat, boundary.vertices()[1].lng), (10.0, 20.0));
}

#[test]
fn overlay_lifecycle() {
    let mut registry = LayerRegistry::new();
    registry.upsert(
        MapLayer::new("a", LayerType::Urban)
            .with_opacity(0.7)
            .with_visible(true),
    );
    registry.set_visibility("a", false);
    registry.set_visibility("b", true);

    assert_eq!(registry.len(), 1);
    let a = registry.get("a").unwrap();
    assert!(!a.visible);
    assert_eq!(a.opacity, 0.7);

    // A pending result arrives, then its completion supersedes it in place.
    registry.upsert(
        MapLayer::new("prediction", LayerType::CropYield).with_status(LayerStatus::Pending),
    );
    registry.upsert(
        MapLayer::new("prediction", LayerType::CropYield)
            .with_data("https://tiles.example.org/p1.png".to_string()),
    );
    let ids: Vec<&str> = registry.ids().collect();
    assert_eq!(ids, ["a", "prediction"]);
    assert_eq!(registry.get("prediction").unwrap().status, LayerStatus::Ready);

    // A comparison replaces the whole view.
    registry.replace_all([
        MapLayer::new("scenario-1", LayerType::CropYield).with_opacity(0.5),
        MapLayer::new("scenario-2", LayerType::CropYield).with_opacity(0.5),
    ]);
    let ids: Vec<&str> = registry.ids().collect();
    assert_eq!(ids, ["scenario-1", "scenario-2"]);
}

#[test]
fn layers_from_service_json() {
    let json = r#"[
        {"id": "u", "name": "Urban 2030", "type": "urban", "visible": true, "opacity": 0.6},
        {"id": "n", "type": "ndvi", "visible": false, "opacity": 2.0},
        {"id": "f", "type": "crop_yield", "visible": true, "opacity": 0.7,
         "status": {"state": "failed", "reason": "timeout"}}
    ]"#;
    let layers: Vec<MapLayer> = serde_json::from_str(json).unwrap();
    let registry: LayerRegistry = layers.into_iter().collect();

    let n = registry.get("n").unwrap();
    assert_eq!(n.layer_type, LayerType::Other("ndvi".into()));
    assert_eq!(n.display_name(), "ndvi");
    assert_eq!(n.opacity, 1.0);
    assert!(registry.get("f").unwrap().is_failed());
    assert_eq!(registry.visible().count(), 2);
}
