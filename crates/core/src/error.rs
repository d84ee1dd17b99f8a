//! Error types for yieldmap

use thiserror::Error;

/// Main error type for boundary and layer operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Boundary needs at least 3 vertices, got {found}")]
    InsufficientVertices { found: usize },

    #[error("Unknown layer id: {0}")]
    UnknownLayerId(String),

    #[error("Invalid coordinate: lat={lat}, lng={lng}")]
    InvalidCoordinate { lat: f64, lng: f64 },

    #[error("Unsupported geometry: {0}")]
    UnsupportedGeometry(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for yieldmap core operations
pub type Result<T> = std::result::Result<T, Error>;
