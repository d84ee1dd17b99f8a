//! Boundary geometry: clicked vertices, drafts and committed polygons.
//!
//! Vertices are stored as `(latitude, longitude)` in drawing order. A
//! committed boundary is a closed single-ring polygon whose coordinates are
//! written `(longitude, latitude)` as GeoJSON requires. Input is validated,
//! never rewritten: no simplification, deduplication or self-intersection
//! repair is performed.

use geo::{BoundingRect, GeodesicArea};
use geo_types::{Coord, LineString, Polygon};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::vector::{Feature, FeatureCollection, Geometry};

/// Minimum number of vertices for a simple polygon.
pub const MIN_VERTICES: usize = 3;

/// A clicked map position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Create a position, rejecting non-finite or out-of-range values.
    pub fn try_new(lat: f64, lng: f64) -> Result<Self> {
        let p = Self { lat, lng };
        if p.is_valid() {
            Ok(p)
        } else {
            Err(Error::InvalidCoordinate { lat, lng })
        }
    }

    /// Whether the position lies within the WGS84 lat/lng domain.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// GeoJSON-ordered coordinate (`x = lng`, `y = lat`).
    pub fn to_coord(self) -> Coord<f64> {
        Coord {
            x: self.lng,
            y: self.lat,
        }
    }
}

impl From<(f64, f64)> for LatLng {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self::new(lat, lng)
    }
}

/// Geographic bounds of a region, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl RegionBounds {
    /// Whether a position falls inside (or on the edge of) the bounds.
    pub fn contains(&self, p: LatLng) -> bool {
        p.lat >= self.south && p.lat <= self.north && p.lng >= self.west && p.lng <= self.east
    }
}

/// Build a closed polygon from vertices in drawing order.
///
/// Fails with [`Error::InsufficientVertices`] for fewer than [`MIN_VERTICES`]
/// distinct points rather than emitting degenerate geometry. An explicit
/// closing vertex does not count.
pub fn build_polygon(points: &[LatLng]) -> Result<Polygon<f64>> {
    let found = distinct_vertices(points);
    if found < MIN_VERTICES {
        return Err(Error::InsufficientVertices { found });
    }
    let ring: LineString<f64> = points.iter().map(|p| p.to_coord()).collect();
    // Polygon::new closes the ring when first != last.
    Ok(Polygon::new(ring, vec![]))
}

/// Number of distinct positions, ignoring a last vertex that repeats the first.
pub fn distinct_vertices(points: &[LatLng]) -> usize {
    let open = match points.split_last() {
        Some((last, init)) if init.first() == Some(last) => init,
        _ => points,
    };
    open.iter()
        .enumerate()
        .filter(|&(i, p)| !open[..i].contains(p))
        .count()
}

/// A polygon under construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundaryDraft {
    points: Vec<LatLng>,
}

impl BoundaryDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, point: LatLng) {
        self.points.push(point);
    }

    /// Remove and return the most recent vertex.
    pub fn pop(&mut self) -> Option<LatLng> {
        self.points.pop()
    }

    pub fn points(&self) -> &[LatLng] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Whether the draft has enough vertices to be committed.
    pub fn can_commit(&self) -> bool {
        distinct_vertices(&self.points) >= MIN_VERTICES
    }

    pub fn commit(&self) -> Result<CommittedBoundary> {
        CommittedBoundary::from_points(&self.points)
    }
}

/// A finished boundary: the drawn vertices plus their closed polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct CommittedBoundary {
    vertices: Vec<LatLng>,
    polygon: Polygon<f64>,
}

impl CommittedBoundary {
    pub fn from_points(points: &[LatLng]) -> Result<Self> {
        let polygon = build_polygon(points)?;
        Ok(Self {
            vertices: points.to_vec(),
            polygon,
        })
    }

    /// Read back a boundary previously produced by [`Self::to_feature_collection`].
    ///
    /// Uses the exterior ring of the first feature; the explicit closing
    /// vertex is dropped.
    pub fn from_feature_collection(fc: &FeatureCollection) -> Result<Self> {
        let feature = fc
            .features
            .first()
            .ok_or(Error::InsufficientVertices { found: 0 })?;
        let ring = feature
            .geometry
            .as_ref()
            .and_then(Geometry::exterior)
            .ok_or(Error::InsufficientVertices { found: 0 })?;

        let mut vertices: Vec<LatLng> = ring.iter().map(|&[lng, lat]| LatLng::new(lat, lng)).collect();
        if vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices.pop();
        }
        Self::from_points(&vertices)
    }

    /// Vertices in drawing order, `(lat, lng)`.
    pub fn vertices(&self) -> &[LatLng] {
        &self.vertices
    }

    pub fn polygon(&self) -> &Polygon<f64> {
        &self.polygon
    }

    /// The closed exterior ring as `[lng, lat]` pairs.
    pub fn ring(&self) -> Vec<[f64; 2]> {
        self.polygon.exterior().coords().map(|c| [c.x, c.y]).collect()
    }

    pub fn to_geometry(&self) -> Geometry {
        Geometry::from(&self.polygon)
    }

    pub fn to_feature(&self) -> Feature {
        Feature::new(self.to_geometry())
    }

    /// Single-feature collection handed to the boundary consumer.
    pub fn to_feature_collection(&self) -> FeatureCollection {
        FeatureCollection::single(self.to_feature())
    }

    /// Bounding box of the ring.
    pub fn bounds(&self) -> RegionBounds {
        match self.polygon.bounding_rect() {
            Some(rect) => RegionBounds {
                north: rect.max().y,
                south: rect.min().y,
                east: rect.max().x,
                west: rect.min().x,
            },
            None => {
                let p = self.vertices[0];
                RegionBounds {
                    north: p.lat,
                    south: p.lat,
                    east: p.lng,
                    west: p.lng,
                }
            }
        }
    }

    /// Geodesic area enclosed by the ring, in square kilometres.
    pub fn area_km2(&self) -> f64 {
        self.polygon.geodesic_area_unsigned() / 1.0e6
    }
}
