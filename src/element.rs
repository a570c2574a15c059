use crate::fingerprint::Checksum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Page-relative bounding box of a rendered node
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Leaf/Parent classification assigned by the geometry filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    /// No extractable child elements
    Leaf,
    /// At least one extractable child element
    Parent,
    #[default]
    Unknown,
}

/// Canonical record for one extracted DOM element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Checksum of `outer_html`; the identity key used for dedup and upsert
    pub key: Checksum,

    /// Unique structural locator within the page it was extracted from
    pub locator: String,

    /// Style-selector form of `locator`
    pub selector: String,

    pub tag: String,

    pub attributes: BTreeMap<String, String>,

    /// Computed style properties captured from the live page
    pub rendered_style: BTreeMap<String, String>,

    pub rect: BoundingBox,

    /// Text directly owned by the element (not its descendants)
    pub own_text: String,

    /// Full rendered text of the element and its descendants
    pub all_text: String,

    pub outer_html: String,

    pub foreground_color: String,

    pub background_color: String,

    pub visible: bool,

    pub classification: Classification,

    /// Checksum of the element's PNG crop from the page screenshot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot_checksum: Option<Checksum>,

    pub kind: ElementKind,
}

impl Element {
    /// Whether this element is an image element
    pub fn is_image(&self) -> bool {
        matches!(self.kind, ElementKind::Image(_))
    }

    /// Vision annotations, for image elements
    pub fn annotations(&self) -> Option<&ImageAnnotations> {
        match &self.kind {
            ElementKind::Image(annotations) => Some(annotations),
            ElementKind::Generic => None,
        }
    }
}

/// Generic vs. image element; only the annotation payload differs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    Generic,
    Image(ImageAnnotations),
}

/// Vision annotations attached to an image element
///
/// Left empty when the element is first built; filled by the vision
/// collaborator only on a dedup miss.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageAnnotations {
    #[serde(default)]
    pub labels: Vec<Label>,

    #[serde(default)]
    pub faces: Vec<FaceAnnotation>,

    #[serde(default)]
    pub reverse_search: Option<ReverseImageSearch>,

    #[serde(default)]
    pub safety: Option<SafetyFlags>,
}

impl ImageAnnotations {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
            && self.faces.is_empty()
            && self.reverse_search.is_none()
            && self.safety.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub description: String,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceAnnotation {
    pub bounds: BoundingBox,
    pub detection_confidence: f32,
    #[serde(default)]
    pub landmarks: Vec<Landmark>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub kind: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReverseImageSearch {
    #[serde(default)]
    pub best_guess_labels: Vec<String>,
    #[serde(default)]
    pub matching_image_urls: Vec<String>,
    #[serde(default)]
    pub similar_image_urls: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Likelihood {
    #[default]
    Unknown,
    VeryUnlikely,
    Unlikely,
    Possible,
    Likely,
    VeryLikely,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyFlags {
    pub adult: Likelihood,
    pub spoof: Likelihood,
    pub medical: Likelihood,
    pub violence: Likelihood,
    pub racy: Likelihood,
}
