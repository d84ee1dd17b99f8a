//! Map overlay descriptors.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of overlay; drives the legend ramp and labels.
///
/// The known kinds form a closed set. Any other name read from JSON is kept
/// as [`LayerType::Other`] so legends can fall back to a generic ramp.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LayerType {
    Urban,
    CropYield,
    Temperature,
    Precipitation,
    Other(String),
}

impl LayerType {
    /// The known layer kinds.
    pub const ALL: &[LayerType] = &[
        Self::Urban,
        Self::CropYield,
        Self::Temperature,
        Self::Precipitation,
    ];

    /// Wire name (`"crop_yield"` etc).
    pub fn as_str(&self) -> &str {
        match self {
            Self::Urban => "urban",
            Self::CropYield => "crop_yield",
            Self::Temperature => "temperature",
            Self::Precipitation => "precipitation",
            Self::Other(name) => name,
        }
    }

    /// Human-readable label used when a layer has no name.
    pub fn label(&self) -> &str {
        match self {
            Self::Urban => "Urban Expansion",
            Self::CropYield => "Crop Yield",
            Self::Temperature => "Temperature",
            Self::Precipitation => "Precipitation",
            Self::Other(name) => name,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<String> for LayerType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "urban" => Self::Urban,
            "crop_yield" => Self::CropYield,
            "temperature" => Self::Temperature,
            "precipitation" => Self::Precipitation,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for LayerType {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<LayerType> for String {
    fn from(t: LayerType) -> Self {
        match t {
            LayerType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for LayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Opaque reference to a rendering payload (URL or `data:` URI).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerData(pub String);

impl LayerData {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Inline payload (`data:image/png;base64,...`).
    pub fn is_inline(&self) -> bool {
        self.0.starts_with("data:")
    }
}

impl From<String> for LayerData {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Per-layer result state. Remote failures stay visible on the layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LayerStatus {
    #[default]
    Ready,
    Pending,
    Failed {
        reason: String,
    },
}

/// Clamp an opacity into `[0, 1]`. Non-finite input yields `None`.
pub fn clamp_opacity(opacity: f32) -> Option<f32> {
    opacity.is_finite().then(|| opacity.clamp(0.0, 1.0))
}

/// A renderable map overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapLayer {
    id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "type")]
    pub layer_type: LayerType,

    pub visible: bool,

    /// Opacity in `[0.0, 1.0]`.
    pub opacity: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<LayerData>,

    #[serde(default)]
    pub status: LayerStatus,
}

impl MapLayer {
    /// A visible, fully opaque layer with no payload yet.
    pub fn new(id: impl Into<String>, layer_type: LayerType) -> Self {
        Self {
            id: id.into(),
            name: None,
            layer_type,
            visible: true,
            opacity: 1.0,
            data: None,
            status: LayerStatus::Ready,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Set opacity, clamped to `[0, 1]`; non-finite values are ignored.
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        if let Some(o) = clamp_opacity(opacity) {
            self.opacity = o;
        }
        self
    }

    pub fn with_data(mut self, data: impl Into<LayerData>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn with_status(mut self, status: LayerStatus) -> Self {
        self.status = status;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Name, falling back to the type label.
    pub fn display_name(&self) -> Cow<'_, str> {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => Cow::Borrowed(name),
            _ => Cow::Borrowed(self.layer_type.label()),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, LayerStatus::Failed { .. })
    }
}
