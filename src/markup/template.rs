//! Normalization of element markup into template strings.
//!
//! A template string keeps the structural shape of an element's outer markup
//! and drops the data that varies between instances of the same component:
//! `script`/`link`/`style` subtrees and the `id`, `name` and `style`
//! attributes. Text nodes are whitespace-normalized and empty ones dropped.

use super::{Fragment, text, write_end_tag, write_start_tag, write_text};
use scraper::ElementRef;

/// Subtrees removed entirely
pub const STRIPPED_SUBTREES: &[&str] = &["script", "link", "style"];

/// Per-instance attributes removed from every element
pub const STRIPPED_ATTRIBUTES: &[&str] = &["id", "name", "style"];

/// Converts outer markup into its template string
pub fn template_string(outer_html: &str) -> String {
    let fragment = Fragment::parse(outer_html);
    let mut out = String::with_capacity(outer_html.len());

    if let Some(element) = fragment.unwrapped() {
        write_template_element(element, &mut out);
        return out;
    }

    for child in fragment.root().children() {
        if let Some(element) = ElementRef::wrap(child) {
            write_template_element(element, &mut out);
        } else if let Some(content) = child.value().as_text() {
            let normalized = text::normalize_whitespace_in_segment(content);
            if !normalized.is_empty() {
                write_text(&mut out, "", &normalized);
            }
        }
    }

    out
}

fn write_template_element(element: ElementRef<'_>, out: &mut String) {
    let tag = element.value().name();
    if STRIPPED_SUBTREES.contains(&tag) {
        return;
    }

    let mut attributes = element
        .value()
        .attrs()
        .filter(|(name, _)| !STRIPPED_ATTRIBUTES.contains(name))
        .collect::<Vec<_>>();
    attributes.sort_by(|a, b| a.0.cmp(b.0));
    write_start_tag(out, tag, attributes);

    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            write_template_element(child_element, out);
        } else if let Some(content) = child.value().as_text() {
            let normalized = text::normalize_whitespace_in_segment(content);
            if !normalized.is_empty() {
                write_text(out, tag, &normalized);
            }
        }
    }

    write_end_tag(out, tag);
}
