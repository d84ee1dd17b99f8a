//! Wire types for the prediction/analytics service.
//!
//! All payloads use camelCase field names. Timestamps are kept as the ISO-8601
//! strings the service emits; they sort lexicographically.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use yieldmap_core::{CommittedBoundary, FeatureCollection};

pub use yieldmap_core::RegionBounds;

// ---------------------------------------------------------------------------
// Uploaded datasets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrbanExpansionData {
    pub id: String,
    pub filename: String,
    pub uploaded_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClimateDataType {
    Temperature,
    Precipitation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClimateData {
    pub id: String,
    pub filename: String,
    #[serde(rename = "type")]
    pub kind: ClimateDataType,
    pub uploaded_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

/// Temperature and precipitation inputs of a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioClimate {
    pub temperature: ClimateData,
    pub precipitation: ClimateData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalYieldData {
    pub id: String,
    pub filename: String,
    pub uploaded_at: String,
    #[serde(default)]
    pub years: Vec<i32>,
}

// ---------------------------------------------------------------------------
// Predictions
// ---------------------------------------------------------------------------

/// A named region with its bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub bounds: RegionBounds,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl Region {
    /// Region enclosing a drawn boundary.
    pub fn from_boundary(name: impl Into<String>, boundary: &CommittedBoundary) -> Self {
        Self {
            id: None,
            name: name.into(),
            bounds: boundary.bounds(),
            code: None,
        }
    }
}

/// Body for `POST /predictions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRequest {
    pub urban_data_id: String,
    pub temperature_data_id: String,
    pub precipitation_data_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historical_yield_data_id: Option<String>,
    pub year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<Region>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl PredictionStatus {
    /// Completed or failed: polling can stop.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for PredictionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Model quality metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub mae: f64,
    pub rmse: f64,
    pub mse: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResponse {
    pub id: String,
    pub status: PredictionStatus,
    /// Raster reference: a data URL or a remote URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prediction_map: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<ModelMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PredictionResponse {
    pub fn is_completed(&self) -> bool {
        self.status == PredictionStatus::Completed
    }

    /// Failure reason, with a generic message when the service gave none.
    pub fn failure_reason(&self) -> Option<String> {
        (self.status == PredictionStatus::Failed).then(|| {
            self.error
                .clone()
                .unwrap_or_else(|| "prediction failed".to_string())
        })
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub urban_data: UrbanExpansionData,
    pub climate_data: ScenarioClimate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historical_yields: Option<HistoricalYieldData>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub predictions: Vec<PredictionResponse>,
    pub created_at: String,
    pub updated_at: String,
}

impl Scenario {
    /// The completed prediction with the greatest `createdAt`.
    pub fn latest_completed(&self) -> Option<&PredictionResponse> {
        self.predictions
            .iter()
            .filter(|p| p.is_completed())
            .max_by(|a, b| a.created_at.cmp(&b.created_at))
    }

    /// The most recently created prediction, whatever its status.
    pub fn latest(&self) -> Option<&PredictionResponse> {
        self.predictions
            .iter()
            .max_by(|a, b| a.created_at.cmp(&b.created_at))
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Body for `POST /scenarios`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewScenario {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub urban_data: UrbanExpansionData,
    pub climate_data: ScenarioClimate,
}

/// Body for `PATCH /scenarios/{id}`. Only set fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScenarioUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Body for `POST /scenarios/compare`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CompareRequest<'a> {
    pub scenario_ids: &'a [String],
}

/// Response of `POST /scenarios/compare`.
///
/// `differences` is passed through without interpretation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResponse {
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
    #[serde(default)]
    pub differences: BTreeMap<String, serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Policy simulation
// ---------------------------------------------------------------------------

/// Body for `POST /policy/simulate`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicySimulationRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urban_growth_boundaries: Option<FeatureCollection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoning_regulations: Option<BTreeMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yield_loss_percentage: Option<f64>,
    /// Affected area in km².
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affected_area: Option<f64>,
    #[serde(default)]
    pub priority_areas: Vec<String>,
    /// Keys the service adds beyond the known ones.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicySimulation {
    pub id: String,
    pub name: String,
    /// GeoJSON as returned; may carry geometry kinds the drawer never emits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urban_growth_boundaries: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoning_regulations: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prediction: Option<PredictionResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact_metrics: Option<ImpactMetrics>,
}

// ---------------------------------------------------------------------------
// Analytics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesPoint {
    pub year: i32,
    #[serde(rename = "yield")]
    pub crop_yield: f64,
    pub urban_extent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YieldTrend {
    Increasing,
    Decreasing,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionalStats {
    pub average_yield: f64,
    pub total_urban_extent: f64,
    pub yield_trend: YieldTrend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsData {
    pub region_id: String,
    #[serde(default)]
    pub time_series: Vec<TimeSeriesPoint>,
    pub regional_stats: RegionalStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use yieldmap_core::LatLng;

    const SCENARIO: &str = r#"{
  "id": "sc-1",
  "name": "Northern growth",
  "description": null,
  "urbanData": {"id": "u1", "filename": "urban_2020.tif", "uploadedAt": "2024-03-01T10:00:00"},
  "climateData": {
    "temperature": {"id": "t1", "filename": "temp.tif", "type": "temperature", "uploadedAt": "2024-03-01T10:01:00"},
    "precipitation": {"id": "p1", "filename": "rain.tif", "type": "precipitation", "uploadedAt": "2024-03-01T10:02:00", "year": 2020}
  },
  "historicalYields": null,
  "predictions": [
    {"id": "pr-1", "status": "completed", "predictionMap": "data:image/png;base64,AAA",
     "metrics": {"mae": 0.4, "rmse": 0.6, "mse": 0.36}, "createdAt": "2024-03-02T08:00:00"},
    {"id": "pr-2", "status": "completed", "predictionMap": "data:image/png;base64,BBB",
     "metrics": {"mae": 0.3, "rmse": 0.5, "mse": 0.25, "accuracy": 0.91}, "createdAt": "2024-03-05T08:00:00",
     "completedAt": "2024-03-05T08:01:10"},
    {"id": "pr-3", "status": "failed", "error": "model crashed", "createdAt": "2024-03-06T08:00:00"}
  ],
  "createdAt": "2024-03-01T10:05:00",
  "updatedAt": "2024-03-06T08:00:00"
}"#;

    #[test]
    fn parse_scenario() {
        let sc: Scenario = serde_json::from_str(SCENARIO).unwrap();
        assert_eq!(sc.name, "Northern growth");
        assert_eq!(sc.climate_data.temperature.kind, ClimateDataType::Temperature);
        assert_eq!(sc.climate_data.precipitation.year, Some(2020));
        assert_eq!(sc.predictions.len(), 3);

        let latest = sc.latest_completed().unwrap();
        assert_eq!(latest.id, "pr-2");
        assert_eq!(latest.metrics.unwrap().accuracy, Some(0.91));

        let newest = sc.latest().unwrap();
        assert_eq!(newest.status, PredictionStatus::Failed);
        assert_eq!(newest.failure_reason().as_deref(), Some("model crashed"));
    }

    #[test]
    fn null_predictions_become_empty() {
        let mut v: serde_json::Value = serde_json::from_str(SCENARIO).unwrap();
        v["predictions"] = serde_json::Value::Null;
        let sc: Scenario = serde_json::from_value(v.clone()).unwrap();
        assert!(sc.predictions.is_empty());

        v.as_object_mut().unwrap().remove("predictions");
        let sc: Scenario = serde_json::from_value(v).unwrap();
        assert!(sc.predictions.is_empty());
        assert!(sc.latest_completed().is_none());
    }

    #[test]
    fn prediction_request_wire_names() {
        let req = PredictionRequest {
            urban_data_id: "u1".into(),
            temperature_data_id: "t1".into(),
            precipitation_data_id: "p1".into(),
            historical_yield_data_id: None,
            year: 2030,
            region: None,
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["urbanDataId"], "u1");
        assert_eq!(v["year"], 2030);
        assert!(v.get("historicalYieldDataId").is_none());
        assert!(v.get("region").is_none());
    }

    #[test]
    fn region_from_boundary() {
        let pts: Vec<LatLng> = [(10.0, 10.0), (10.0, 20.0), (20.0, 20.0)]
            .into_iter()
            .map(LatLng::from)
            .collect();
        let boundary = CommittedBoundary::from_points(&pts).unwrap();
        let region = Region::from_boundary("north", &boundary);
        assert_eq!(region.bounds.north, 20.0);
        assert_eq!(region.bounds.south, 10.0);
        assert_eq!(region.bounds.west, 10.0);
        assert_eq!(region.bounds.east, 20.0);
    }

    #[test]
    fn impact_metrics_keep_unknown_keys() {
        let json = r#"{"yieldLossPercentage": 12.5, "affectedArea": 340.0,
                       "priorityAreas": ["A", "B"], "soilQualityIndex": 0.7}"#;
        let m: ImpactMetrics = serde_json::from_str(json).unwrap();
        assert_eq!(m.yield_loss_percentage, Some(12.5));
        assert_eq!(m.priority_areas, vec!["A", "B"]);
        assert_eq!(m.extra["soilQualityIndex"], 0.7);
    }

    #[test]
    fn parse_analytics() {
        let json = r#"{
          "regionId": "r-9",
          "timeSeries": [
            {"year": 2020, "yield": 4.1, "urbanExtent": 12.0},
            {"year": 2021, "yield": 3.9, "urbanExtent": 13.5}
          ],
          "regionalStats": {"averageYield": 4.0, "totalUrbanExtent": 25.5, "yieldTrend": "decreasing"}
        }"#;
        let a: AnalyticsData = serde_json::from_str(json).unwrap();
        assert_eq!(a.time_series[1].crop_yield, 3.9);
        assert_eq!(a.regional_stats.yield_trend, YieldTrend::Decreasing);
    }

    #[test]
    fn compare_response_passes_differences_through() {
        let json = r#"{"scenarios": [], "differences": {"scenario_count": 2,
                       "comparison_metrics": {"yield_differences": {}}}}"#;
        let r: ComparisonResponse = serde_json::from_str(json).unwrap();
        assert_eq!(r.differences["scenario_count"], 2);
        assert!(r.differences["comparison_metrics"].is_object());
    }
}
