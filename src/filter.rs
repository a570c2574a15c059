use crate::config::ExtractorConfig;
use crate::element::{BoundingBox, Classification};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Current viewport size and scroll offsets of the live page
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub scroll_x: f64,
    pub scroll_y: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }

    /// Whether a page-relative point lies inside the scrolled viewport
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.scroll_x
            && x < self.scroll_x + self.width
            && y >= self.scroll_y
            && y < self.scroll_y + self.height
    }
}

/// Why a candidate node was not extracted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Hidden,
    TooSmall,
    NegativePosition,
    OutsideViewport,
    ExcludedTag,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Rejection::Hidden => "not displayed",
            Rejection::TooSmall => "width or height not above 1px",
            Rejection::NegativePosition => "negative position",
            Rejection::OutsideViewport => "outside the viewport",
            Rejection::ExcludedTag => "structural tag",
        };
        f.write_str(reason)
    }
}

/// Geometry/semantics filter deciding which live nodes become elements
#[derive(Debug, Clone)]
pub struct GeometryFilter {
    excluded_tags: HashSet<String>,
    require_in_viewport: bool,
}

impl Default for GeometryFilter {
    fn default() -> Self {
        Self::new(&ExtractorConfig::default())
    }
}

impl GeometryFilter {
    /// Create a filter from the extractor configuration
    pub fn new(config: &ExtractorConfig) -> Self {
        Self {
            excluded_tags: config
                .excluded_tags
                .iter()
                .map(|tag| tag.to_ascii_lowercase())
                .collect(),
            require_in_viewport: config.require_in_viewport,
        }
    }

    pub fn is_excluded_tag(&self, tag: &str) -> bool {
        self.excluded_tags.contains(&tag.to_ascii_lowercase())
    }

    /// Checks every acceptance rule, returning the first that fails
    pub fn check(
        &self,
        tag: &str,
        displayed: bool,
        rect: &BoundingBox,
        viewport: &Viewport,
    ) -> Result<(), Rejection> {
        if self.is_excluded_tag(tag) {
            return Err(Rejection::ExcludedTag);
        }
        if !displayed {
            return Err(Rejection::Hidden);
        }
        if rect.width <= 1.0 || rect.height <= 1.0 {
            return Err(Rejection::TooSmall);
        }
        if rect.x < 0.0 || rect.y < 0.0 {
            return Err(Rejection::NegativePosition);
        }
        if self.require_in_viewport && !viewport.contains_point(rect.x, rect.y) {
            return Err(Rejection::OutsideViewport);
        }
        Ok(())
    }

    /// Leaf if no child survives the exclusion set, Parent otherwise
    pub fn classify<S: AsRef<str>>(&self, child_tags: &[S]) -> Classification {
        if child_tags
            .iter()
            .any(|tag| !self.is_excluded_tag(tag.as_ref()))
        {
            Classification::Parent
        } else {
            Classification::Leaf
        }
    }

    /// Accepts or rejects a node and classifies accepted ones
    pub fn evaluate<S: AsRef<str>>(
        &self,
        tag: &str,
        displayed: bool,
        rect: &BoundingBox,
        viewport: &Viewport,
        child_tags: &[S],
    ) -> Result<Classification, Rejection> {
        self.check(tag, displayed, rect, viewport)?;
        Ok(self.classify(child_tags))
    }
}
