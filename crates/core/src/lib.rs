//! # yieldmap core
//!
//! Interaction and overlay model for the yieldmap decision-support tool.
//!
//! This crate provides:
//! - `boundary`: clicked vertices, drafts and committed boundary polygons
//! - `drawing`: the boundary-drawing state machine
//! - `layers`: the map layer registry consumed by rendering and legends
//! - `vector`: the GeoJSON feature model handed to the prediction service
//!
//! Everything here is synchronous; remote calls live in `yieldmap-cloud`.

pub mod boundary;
pub mod drawing;
pub mod error;
pub mod layers;
pub mod vector;

pub use boundary::{
    distinct_vertices, BoundaryDraft, CommittedBoundary, LatLng, RegionBounds, MIN_VERTICES,
};
pub use drawing::{BoundaryConsumer, BoundaryDrawer, BoundaryEvent, DrawAction, DrawingState};
pub use error::{Error, Result};
pub use layers::{LayerData, LayerRegistry, LayerStatus, LayerType, MapLayer};
pub use vector::{Feature, FeatureCollection, Geometry};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::boundary::{CommittedBoundary, LatLng};
    pub use crate::drawing::{BoundaryDrawer, DrawAction, DrawingState};
    pub use crate::error::{Error, Result};
    pub use crate::layers::{LayerRegistry, LayerType, MapLayer};
}
