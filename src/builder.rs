//! Element Builder: assembles canonical element records.

use crate::config::ExtractorConfig;
use crate::element::{BoundingBox, Classification, Element, ElementKind, ImageAnnotations};
use crate::filter::Viewport;
use crate::fingerprint::{self, Checksum};
use crate::locator::to_css_selector;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::collections::BTreeMap;
use std::io::Cursor;

pub const DEFAULT_FOREGROUND: &str = "rgb(0,0,0)";
pub const DEFAULT_BACKGROUND: &str = "rgb(255,255,255)";

/// Everything captured about one accepted node before it becomes an [`Element`]
#[derive(Debug, Clone, Default)]
pub struct ElementParts {
    pub locator: String,
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    pub rendered_style: BTreeMap<String, String>,
    pub rect: BoundingBox,
    pub own_text: String,
    pub all_text: String,
    pub outer_html: String,
    pub visible: bool,
    pub classification: Classification,
}

/// Builds a generic or image element from captured parts
///
/// The outer-markup checksum becomes the identity key. Image elements start
/// with empty annotations.
pub fn build(parts: ElementParts, config: &ExtractorConfig) -> Element {
    let key = fingerprint::element_checksum(&parts.outer_html);
    let selector = to_css_selector(&parts.locator);
    let foreground_color = style_or(&parts.rendered_style, "color", DEFAULT_FOREGROUND);
    let background_color =
        style_or(&parts.rendered_style, "background-color", DEFAULT_BACKGROUND);

    let kind = if config.is_image_tag(&parts.tag) {
        ElementKind::Image(ImageAnnotations::default())
    } else {
        ElementKind::Generic
    };

    Element {
        key,
        locator: parts.locator,
        selector,
        tag: parts.tag,
        attributes: parts.attributes,
        rendered_style: parts.rendered_style,
        rect: parts.rect,
        own_text: parts.own_text,
        all_text: parts.all_text,
        outer_html: parts.outer_html,
        foreground_color,
        background_color,
        visible: parts.visible,
        classification: parts.classification,
        screenshot_checksum: None,
        kind,
    }
}

fn style_or(style: &BTreeMap<String, String>, property: &str, default: &str) -> String {
    match style.get(property).map(|value| value.trim()) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => default.to_string(),
    }
}

/// Crops an element's box out of a viewport screenshot and encodes it as PNG
///
/// `rect` is page-relative; the screenshot covers the scrolled viewport.
/// The box is clamped to the image. Returns `None` when nothing of the
/// element is inside the screenshot or encoding fails.
pub fn crop_screenshot(
    screenshot: &DynamicImage,
    rect: &BoundingBox,
    viewport: &Viewport,
) -> Option<Vec<u8>> {
    let (image_width, image_height) = screenshot.dimensions();
    let left = (rect.x - viewport.scroll_x).max(0.0);
    let top = (rect.y - viewport.scroll_y).max(0.0);
    let right = (rect.x - viewport.scroll_x + rect.width).min(image_width as f64);
    let bottom = (rect.y - viewport.scroll_y + rect.height).min(image_height as f64);

    if right <= left || bottom <= top {
        return None;
    }

    let x = left.floor() as u32;
    let y = top.floor() as u32;
    let width = ((right.ceil() as u32).min(image_width)).saturating_sub(x);
    let height = ((bottom.ceil() as u32).min(image_height)).saturating_sub(y);
    if width == 0 || height == 0 {
        return None;
    }

    let crop = screenshot.crop_imm(x, y, width, height);
    let mut buffer = Cursor::new(Vec::new());
    match crop.write_to(&mut buffer, ImageFormat::Png) {
        Ok(()) => Some(buffer.into_inner()),
        Err(e) => {
            ::log::warn!("Failed to encode element screenshot: {}", e);
            None
        }
    }
}

/// Attaches a crop's checksum to an element
pub fn attach_screenshot(element: &mut Element, crop: &[u8]) -> Checksum {
    let checksum = fingerprint::screenshot_checksum(crop);
    element.screenshot_checksum = Some(checksum.clone());
    checksum
}
