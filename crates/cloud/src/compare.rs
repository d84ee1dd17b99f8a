//! Best-effort comparison of several scenarios.
//!
//! Each scenario is fetched independently and reconciled on its own: a missing
//! or failed prediction only affects that scenario's summary, never its
//! siblings. The service-provided difference mapping is passed through as-is.

use std::collections::BTreeMap;

use async_trait::async_trait;
use futures::stream::{FuturesOrdered, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};
use yieldmap_core::{LayerRegistry, MapLayer};

use crate::api_models::{ModelMetrics, PredictionResponse, PredictionStatus, Scenario};
use crate::client::ApiClient;
use crate::error::Result;
use crate::overlay::scenario_layer;

/// Pass-through difference mapping.
pub type Differences = BTreeMap<String, serde_json::Value>;

/// Where scenarios and their difference report come from.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait ScenarioSource {
    async fn scenario(&self, id: &str) -> Result<Scenario>;

    async fn differences(&self, ids: &[String]) -> Result<Differences>;
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl ScenarioSource for ApiClient {
    async fn scenario(&self, id: &str) -> Result<Scenario> {
        self.get_scenario(id).await
    }

    async fn differences(&self, ids: &[String]) -> Result<Differences> {
        Ok(self.compare_scenarios(ids).await?.differences)
    }
}

/// Outcome for one requested scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ScenarioStatus {
    Completed,
    Pending,
    Processing,
    Failed { reason: String },
    /// The scenario exists but has never been predicted.
    NoPrediction,
    /// The scenario itself could not be fetched.
    Unavailable { reason: String },
}

impl ScenarioStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl From<&PredictionResponse> for ScenarioStatus {
    fn from(prediction: &PredictionResponse) -> Self {
        match prediction.status {
            PredictionStatus::Completed => Self::Completed,
            PredictionStatus::Pending => Self::Pending,
            PredictionStatus::Processing => Self::Processing,
            PredictionStatus::Failed => Self::Failed {
                reason: prediction.failure_reason().unwrap_or_default(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioSummary {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub status: ScenarioStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<ModelMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl ScenarioSummary {
    fn bare(id: &str, name: Option<String>, status: ScenarioStatus) -> Self {
        Self {
            id: id.to_string(),
            name,
            status,
            prediction_id: None,
            metrics: None,
            confidence: None,
        }
    }
}

/// Aggregate of one comparison request. Built fresh per request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioComparisonResult {
    /// One entry per distinct requested id, in order of first request.
    pub scenarios: Vec<ScenarioSummary>,
    /// One layer per scenario with a completed prediction.
    pub layers: Vec<MapLayer>,
    pub differences: Differences,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub differences_error: Option<String>,
}

impl ScenarioComparisonResult {
    pub fn completed(&self) -> impl Iterator<Item = &ScenarioSummary> {
        self.scenarios.iter().filter(|s| s.status.is_completed())
    }

    /// Swap the registry's contents for this comparison's layers.
    pub fn apply_to(&self, registry: &mut LayerRegistry) {
        registry.replace_all(self.layers.iter().cloned());
    }
}

/// Reconcile one fetched scenario into its summary and optional layer.
pub fn summarize(id: &str, fetched: Result<Scenario>) -> (ScenarioSummary, Option<MapLayer>) {
    let scenario = match fetched {
        Ok(s) => s,
        Err(e) => {
            warn!(id, error = %e, "scenario unavailable");
            let status = ScenarioStatus::Unavailable {
                reason: e.to_string(),
            };
            return (ScenarioSummary::bare(id, None, status), None);
        }
    };

    if let Some(prediction) = scenario.latest_completed() {
        let summary = ScenarioSummary {
            id: id.to_string(),
            name: Some(scenario.name.clone()),
            status: ScenarioStatus::Completed,
            prediction_id: Some(prediction.id.clone()),
            metrics: prediction.metrics,
            confidence: prediction.confidence,
        };
        return (summary, Some(scenario_layer(&scenario, prediction)));
    }

    let name = Some(scenario.name.clone());
    let Some(latest) = scenario.latest() else {
        return (ScenarioSummary::bare(id, name, ScenarioStatus::NoPrediction), None);
    };

    let status = ScenarioStatus::from(latest);
    if let ScenarioStatus::Failed { reason } = &status {
        warn!(id, %reason, "latest prediction failed");
    }
    let mut summary = ScenarioSummary::bare(id, name, status);
    summary.prediction_id = Some(latest.id.clone());
    (summary, None)
}

/// Builds [`ScenarioComparisonResult`]s from a [`ScenarioSource`].
///
/// Cardinality (at least two ids) is the caller's responsibility.
pub struct ComparisonAggregator<S> {
    source: S,
}

impl<S: ScenarioSource> ComparisonAggregator<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch every scenario and the difference report concurrently.
    ///
    /// Repeated ids are compared once, at their first position.
    pub async fn compare(&self, ids: &[String]) -> ScenarioComparisonResult {
        let ids = unique_ids(ids);
        let fetches: FuturesOrdered<_> = ids.iter().map(|id| self.source.scenario(id)).collect();
        let (fetched, differences) =
            futures::join!(fetches.collect::<Vec<_>>(), self.source.differences(&ids));

        let mut scenarios = Vec::with_capacity(ids.len());
        let mut layers = Vec::new();
        for (id, result) in ids.iter().zip(fetched) {
            let (summary, layer) = summarize(id, result);
            scenarios.push(summary);
            layers.extend(layer);
        }

        let (differences, differences_error) = match differences {
            Ok(d) => (d, None),
            Err(e) => {
                warn!(error = %e, "difference report unavailable");
                (Differences::new(), Some(e.to_string()))
            }
        };

        info!(
            requested = ids.len(),
            layers = layers.len(),
            "comparison built"
        );

        ScenarioComparisonResult {
            scenarios,
            layers,
            differences,
            differences_error,
        }
    }
}

fn unique_ids(ids: &[String]) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        if unique.contains(id) {
            debug!(id = %id, "duplicate scenario id skipped");
        } else {
            unique.push(id.clone());
        }
    }
    unique
}
