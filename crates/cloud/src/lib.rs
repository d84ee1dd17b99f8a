//! # yieldmap cloud
//!
//! Client for the yieldmap prediction/analytics service.
//!
//! This crate provides typed models for the service's JSON API, an async
//! [`ApiClient`] with retrying HTTP transport, adapters that turn results into
//! [`MapLayer`](yieldmap_core::MapLayer)s, and the best-effort
//! [`ComparisonAggregator`].
//!
//! ## Features
//!
//! - `native` (default): blocking API via tokio `block_on` (not available on WASM)

pub mod api_models;
pub mod client;
pub mod compare;
pub mod error;
pub mod http;
pub mod overlay;

pub mod sync_api;

pub use api_models::{
    AnalyticsData, ComparisonResponse, ImpactMetrics, ModelMetrics, PolicySimulation,
    PolicySimulationRequest, PredictionRequest, PredictionResponse, PredictionStatus, Region,
    RegionBounds, Scenario,
};
pub use client::{ApiClient, ClientOptions, DEFAULT_API_URL};
pub use compare::{
    ComparisonAggregator, Differences, ScenarioComparisonResult, ScenarioSource, ScenarioStatus,
    ScenarioSummary,
};
pub use error::{CloudError, Result};
pub use overlay::{policy_layer, prediction_layer, simulation_request};

/// Blocking API re-exported as `blocking` module (native only).
#[cfg(feature = "native")]
pub mod blocking {
    pub use crate::sync_api::*;
}
