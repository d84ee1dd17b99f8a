//! Async client for the prediction/analytics service.

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info};

use crate::api_models::{
    AnalyticsData, CompareRequest, ComparisonResponse, ModelMetrics, NewScenario,
    PolicySimulation, PolicySimulationRequest, PredictionRequest, PredictionResponse,
    PredictionStatus, Scenario, ScenarioUpdate,
};
use crate::error::{CloudError, Result};
use crate::http::{sleep, HttpClient};

/// Default service root.
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Configuration for [`ApiClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClientOptions {
    /// Service root, e.g. `http://localhost:8000/api`.
    pub base_url: String,
    /// Per-request timeout (default 30 s).
    pub request_timeout: Duration,
    /// Maximum retries on transient failures (default 3).
    pub max_retries: u32,
    /// Delay between prediction status polls (default 2 s).
    pub poll_interval: Duration,
    /// Polls before [`ApiClient::wait_for_prediction`] gives up (default 150).
    pub max_polls: u32,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            max_retries: 3,
            poll_interval: Duration::from_secs(2),
            max_polls: 150,
        }
    }
}

impl ClientOptions {
    /// Defaults overridden by `YIELDMAP_API_URL`, `YIELDMAP_TIMEOUT_SECS` and
    /// `YIELDMAP_MAX_RETRIES`. Unparseable numbers keep the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut opts = Self::default();
        if let Some(url) = lookup("YIELDMAP_API_URL").filter(|u| !u.trim().is_empty()) {
            opts.base_url = url;
        }
        if let Some(secs) = lookup("YIELDMAP_TIMEOUT_SECS").and_then(|s| s.trim().parse().ok()) {
            opts.request_timeout = Duration::from_secs(secs);
        }
        if let Some(n) = lookup("YIELDMAP_MAX_RETRIES").and_then(|s| s.trim().parse().ok()) {
            opts.max_retries = n;
        }
        opts
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Async client covering predictions, scenarios, policy simulation and analytics.
pub struct ApiClient {
    http: HttpClient,
    options: ClientOptions,
}

#[derive(Deserialize)]
struct Health {
    #[serde(default)]
    status: String,
}

impl ApiClient {
    pub fn new(options: ClientOptions) -> Result<Self> {
        let http = HttpClient::new(&options.base_url, options.request_timeout, options.max_retries)?;
        Ok(Self { http, options })
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }

    // -- predictions --------------------------------------------------------

    /// Submit a prediction job. The response is usually still pending.
    pub async fn create_prediction(&self, request: &PredictionRequest) -> Result<PredictionResponse> {
        let resp: PredictionResponse = self.http.post_json("/predictions", request).await?;
        info!(id = %resp.id, status = %resp.status, "prediction submitted");
        Ok(resp)
    }

    pub async fn get_prediction(&self, id: &str) -> Result<PredictionResponse> {
        self.http.get_json(&format!("/predictions/{id}")).await
    }

    pub async fn list_predictions(&self) -> Result<Vec<PredictionResponse>> {
        self.http.get_json("/predictions").await
    }

    /// Poll a prediction until it completes.
    ///
    /// A failed job becomes [`CloudError::PredictionFailed`]; running out of
    /// polls becomes [`CloudError::Timeout`].
    pub async fn wait_for_prediction(&self, id: &str) -> Result<PredictionResponse> {
        self.wait_for_prediction_with(id, |_| {}).await
    }

    /// Like [`wait_for_prediction`](Self::wait_for_prediction), reporting each
    /// polled status to `on_status`.
    pub async fn wait_for_prediction_with<F>(
        &self,
        id: &str,
        mut on_status: F,
    ) -> Result<PredictionResponse>
    where
        F: FnMut(PredictionStatus),
    {
        for poll in 0..self.options.max_polls {
            if poll > 0 {
                sleep(self.options.poll_interval).await;
            }
            let resp = self.get_prediction(id).await?;
            debug!(id, poll, status = %resp.status, "polled prediction");
            on_status(resp.status);

            match resp.status {
                PredictionStatus::Completed => return Ok(resp),
                PredictionStatus::Failed => {
                    return Err(CloudError::PredictionFailed {
                        id: id.to_string(),
                        reason: resp.failure_reason().unwrap_or_default(),
                    })
                }
                PredictionStatus::Pending | PredictionStatus::Processing => {}
            }
        }

        Err(CloudError::Timeout {
            id: id.to_string(),
            polls: self.options.max_polls,
        })
    }

    // -- scenarios ----------------------------------------------------------

    pub async fn create_scenario(&self, scenario: &NewScenario) -> Result<Scenario> {
        self.http.post_json("/scenarios", scenario).await
    }

    pub async fn get_scenario(&self, id: &str) -> Result<Scenario> {
        self.http.get_json(&format!("/scenarios/{id}")).await
    }

    pub async fn list_scenarios(&self) -> Result<Vec<Scenario>> {
        self.http.get_json("/scenarios").await
    }

    pub async fn update_scenario(&self, id: &str, update: &ScenarioUpdate) -> Result<Scenario> {
        self.http.patch_json(&format!("/scenarios/{id}"), update).await
    }

    pub async fn delete_scenario(&self, id: &str) -> Result<()> {
        self.http.delete(&format!("/scenarios/{id}")).await
    }

    /// Raw `POST /scenarios/compare`. See
    /// [`ComparisonAggregator`](crate::ComparisonAggregator) for the
    /// per-scenario best-effort comparison.
    pub async fn compare_scenarios(&self, ids: &[String]) -> Result<ComparisonResponse> {
        let body = CompareRequest { scenario_ids: ids };
        self.http.post_json("/scenarios/compare", &body).await
    }

    // -- policy -------------------------------------------------------------

    pub async fn simulate_policy(&self, request: &PolicySimulationRequest) -> Result<PolicySimulation> {
        let sim: PolicySimulation = self.http.post_json("/policy/simulate", request).await?;
        info!(id = %sim.id, name = %sim.name, "policy simulated");
        Ok(sim)
    }

    pub async fn get_policy(&self, id: &str) -> Result<PolicySimulation> {
        self.http.get_json(&format!("/policy/{id}")).await
    }

    // -- analytics ----------------------------------------------------------

    pub async fn region_analytics(&self, region_id: &str) -> Result<AnalyticsData> {
        self.http
            .get_json(&format!("/analytics/region/{region_id}"))
            .await
    }

    pub async fn model_metrics(&self) -> Result<ModelMetrics> {
        self.http.get_json("/analytics/metrics").await
    }

    /// `GET /health`; true when the service reports itself healthy.
    pub async fn health(&self) -> Result<bool> {
        let health: Health = self.http.get_json("/health").await?;
        Ok(health.status == "healthy")
    }
}
