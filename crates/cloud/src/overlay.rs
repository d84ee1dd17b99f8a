//! Turn service results into map layers and requests.

use yieldmap_core::{CommittedBoundary, LayerStatus, LayerType, MapLayer};

use crate::api_models::{
    PolicySimulation, PolicySimulationRequest, PredictionResponse, PredictionStatus, Scenario,
};
use crate::error::CloudError;

pub const PREDICTION_LAYER_ID: &str = "prediction-crop-yield";
pub const POLICY_LAYER_ID: &str = "policy-prediction";

/// Opacity of single-result overlays.
pub const RESULT_OPACITY: f32 = 0.7;
/// Opacity of comparison overlays, low enough that stacked scenarios stay legible.
pub const SCENARIO_OPACITY: f32 = 0.5;

/// Layer status for a prediction's job status.
pub fn layer_status(prediction: &PredictionResponse) -> LayerStatus {
    match prediction.status {
        PredictionStatus::Completed => LayerStatus::Ready,
        PredictionStatus::Pending | PredictionStatus::Processing => LayerStatus::Pending,
        PredictionStatus::Failed => LayerStatus::Failed {
            reason: prediction.failure_reason().unwrap_or_default(),
        },
    }
}

fn result_layer(id: &str, name: &str, opacity: f32, prediction: &PredictionResponse) -> MapLayer {
    let layer = MapLayer::new(id, LayerType::CropYield)
        .with_name(name)
        .with_opacity(opacity)
        .with_status(layer_status(prediction));
    match &prediction.prediction_map {
        Some(map) => layer.with_data(map.clone()),
        None => layer,
    }
}

/// Overlay for a yield prediction.
pub fn prediction_layer(prediction: &PredictionResponse) -> MapLayer {
    result_layer(PREDICTION_LAYER_ID, "Predicted Crop Yield", RESULT_OPACITY, prediction)
}

/// Overlay for a policy simulation, if it carries a prediction.
pub fn policy_layer(simulation: &PolicySimulation) -> Option<MapLayer> {
    simulation
        .prediction
        .as_ref()
        .map(|p| result_layer(POLICY_LAYER_ID, "Policy Impact Prediction", RESULT_OPACITY, p))
}

/// Comparison overlay for one scenario's prediction.
pub fn scenario_layer(scenario: &Scenario, prediction: &PredictionResponse) -> MapLayer {
    result_layer(
        &format!("scenario-{}", scenario.id),
        &scenario.name,
        SCENARIO_OPACITY,
        prediction,
    )
}

/// Placeholder overlay recording a remote failure.
pub fn failed_layer(id: &str, name: &str, error: &CloudError) -> MapLayer {
    MapLayer::new(id, LayerType::CropYield)
        .with_name(name)
        .with_opacity(RESULT_OPACITY)
        .with_status(LayerStatus::Failed {
            reason: error.to_string(),
        })
}

/// Policy request for a drawn growth boundary.
pub fn simulation_request(name: impl Into<String>, boundary: &CommittedBoundary) -> PolicySimulationRequest {
    PolicySimulationRequest {
        name: name.into(),
        urban_growth_boundaries: Some(boundary.to_feature_collection()),
        zoning_regulations: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yieldmap_core::{LatLng, LayerData};

    fn prediction(status: PredictionStatus) -> PredictionResponse {
        PredictionResponse {
            id: "p1".into(),
            status,
            prediction_map: Some("data:image/png;base64,AAAA".into()),
            metrics: None,
            confidence: Some(0.8),
            created_at: "2024-05-01T00:00:00".into(),
            completed_at: None,
            error: None,
        }
    }

    #[test]
    fn completed_prediction_layer() {
        let layer = prediction_layer(&prediction(PredictionStatus::Completed));
        assert_eq!(layer.id(), "prediction-crop-yield");
        assert_eq!(layer.display_name(), "Predicted Crop Yield");
        assert_eq!(layer.layer_type, LayerType::CropYield);
        assert!(layer.visible);
        assert_eq!(layer.opacity, 0.7);
        assert_eq!(layer.status, LayerStatus::Ready);
        assert_eq!(layer.data, Some(LayerData("data:image/png;base64,AAAA".into())));
    }

    #[test]
    fn failed_prediction_is_visible_as_failed() {
        let mut p = prediction(PredictionStatus::Failed);
        p.prediction_map = None;
        p.error = Some("out of memory".into());
        let layer = prediction_layer(&p);
        assert!(layer.is_failed());
        assert_eq!(
            layer.status,
            LayerStatus::Failed {
                reason: "out of memory".into()
            }
        );
        assert!(layer.data.is_none());
    }

    #[test]
    fn policy_without_prediction_has_no_layer() {
        let mut sim = PolicySimulation {
            id: "s1".into(),
            name: "Greenbelt".into(),
            urban_growth_boundaries: None,
            zoning_regulations: None,
            prediction: None,
            impact_metrics: None,
        };
        assert!(policy_layer(&sim).is_none());

        sim.prediction = Some(prediction(PredictionStatus::Processing));
        let layer = policy_layer(&sim).unwrap();
        assert_eq!(layer.id(), "policy-prediction");
        assert_eq!(layer.status, LayerStatus::Pending);
    }

    #[test]
    fn simulation_request_embeds_boundary() {
        let pts: Vec<LatLng> = [(10.0, 10.0), (10.0, 20.0), (20.0, 20.0), (20.0, 10.0)]
            .into_iter()
            .map(LatLng::from)
            .collect();
        let boundary = CommittedBoundary::from_points(&pts).unwrap();
        let req = simulation_request("Greenbelt", &boundary);
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["name"], "Greenbelt");
        assert_eq!(v["urbanGrowthBoundaries"]["type"], "FeatureCollection");
        assert_eq!(
            v["urbanGrowthBoundaries"]["features"][0]["geometry"]["coordinates"][0][1],
            serde_json::json!([20.0, 10.0])
        );
        assert!(v.get("zoningRegulations").is_none());
    }

    #[test]
    fn failed_layer_carries_error_text() {
        let err = CloudError::Api {
            status: 404,
            message: "Prediction not found".into(),
        };
        let layer = failed_layer(PREDICTION_LAYER_ID, "Predicted Crop Yield", &err);
        match layer.status {
            LayerStatus::Failed { reason } => assert!(reason.contains("Prediction not found")),
            other => panic!("unexpected status {other:?}"),
        }
    }
}
