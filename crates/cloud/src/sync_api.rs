//! Blocking (synchronous) API for native platforms.
//!
//! Wraps the async [`ApiClient`] with a Tokio runtime so callers such as the
//! CLI don't need to manage their own async runtime.

#[cfg(feature = "native")]
mod inner {
    use crate::api_models::{
        AnalyticsData, ModelMetrics, PolicySimulation, PolicySimulationRequest,
        PredictionRequest, PredictionResponse, PredictionStatus, Scenario,
    };
    use crate::client::{ApiClient, ClientOptions};
    use crate::compare::{ComparisonAggregator, ScenarioComparisonResult};
    use crate::error::{CloudError, Result};

    /// Blocking wrapper around [`ApiClient`].
    ///
    /// Uses an internal single-threaded Tokio runtime. Not available on WASM.
    pub struct ApiClientBlocking {
        rt: tokio::runtime::Runtime,
        aggregator: ComparisonAggregator<ApiClient>,
    }

    impl ApiClientBlocking {
        pub fn new(options: ClientOptions) -> Result<Self> {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| CloudError::Network(e.to_string()))?;
            let client = ApiClient::new(options)?;

            Ok(Self {
                rt,
                aggregator: ComparisonAggregator::new(client),
            })
        }

        /// The wrapped async client.
        pub fn client(&self) -> &ApiClient {
            self.aggregator.source()
        }

        /// Submit a prediction and poll it to completion (blocking).
        pub fn predict<F>(&self, request: &PredictionRequest, on_status: F) -> Result<PredictionResponse>
        where
            F: FnMut(PredictionStatus),
        {
            let client = self.client();
            self.rt.block_on(async {
                let created = client.create_prediction(request).await?;
                if created.status.is_terminal() {
                    return match created.failure_reason() {
                        Some(reason) => Err(CloudError::PredictionFailed {
                            id: created.id,
                            reason,
                        }),
                        None => Ok(created),
                    };
                }
                client.wait_for_prediction_with(&created.id, on_status).await
            })
        }

        pub fn simulate_policy(&self, request: &PolicySimulationRequest) -> Result<PolicySimulation> {
            self.rt.block_on(self.client().simulate_policy(request))
        }

        /// Best-effort comparison of the given scenarios (blocking).
        pub fn compare(&self, ids: &[String]) -> ScenarioComparisonResult {
            self.rt.block_on(self.aggregator.compare(ids))
        }

        pub fn list_scenarios(&self) -> Result<Vec<Scenario>> {
            self.rt.block_on(self.client().list_scenarios())
        }

        pub fn model_metrics(&self) -> Result<ModelMetrics> {
            self.rt.block_on(self.client().model_metrics())
        }

        pub fn region_analytics(&self, region_id: &str) -> Result<AnalyticsData> {
            self.rt.block_on(self.client().region_analytics(region_id))
        }
    }
}

#[cfg(feature = "native")]
pub use inner::*;
