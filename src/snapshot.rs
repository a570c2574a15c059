//! Immutable, owned snapshot of one page's parsed HTML.
//!
//! `scraper::Html` is not `Send`, so the parsed tree is copied into a plain
//! arena once and every later query runs against that arena. Nodes are
//! stored in document order: a node's index is its pre-order position.

use crate::fingerprint::{self, Checksum};
use crate::locator::PathStep;
use crate::markup::{self, text};
use scraper::{ElementRef, Html};
use std::collections::BTreeMap;
use url::Url;

/// Index of a node within a [`DocumentSnapshot`]
pub type NodeIndex = usize;

#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Document,
    Element {
        tag: String,
        /// Sorted by attribute name
        attributes: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
pub struct SnapshotNode {
    pub data: NodeData,
    pub parent: Option<NodeIndex>,
    pub children: Vec<NodeIndex>,
}

/// Structural description of one element, as read from a snapshot or a live page
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDescription {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    pub outer_html: String,
    pub own_text: String,
    pub all_text: String,
    pub child_tags: Vec<String>,
    /// The node itself first, then each ancestor element up to `html`
    pub lineage: Vec<PathStep>,
}

#[derive(Debug, Clone)]
pub struct DocumentSnapshot {
    url: String,
    host: Option<String>,
    checksum: Checksum,
    nodes: Vec<SnapshotNode>,
}

impl DocumentSnapshot {
    /// Parses page source captured from `url`
    pub fn parse(url: &str, source: &str) -> Self {
        let document = Html::parse_document(source);
        let mut nodes = vec![SnapshotNode {
            data: NodeData::Document,
            parent: None,
            children: Vec::new(),
        }];
        push_element(&mut nodes, document.root_element(), 0);

        let host = Url::parse(url)
            .ok()
            .and_then(|parsed| parsed.host_str().map(|h| h.to_string()));

        ::log::trace!("Snapshot of {} holds {} nodes", url, nodes.len());

        Self {
            url: url.to_string(),
            host,
            checksum: fingerprint::page_source_checksum(source),
            nodes,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Checksum of the raw page source this snapshot was parsed from
    pub fn checksum(&self) -> &Checksum {
        &self.checksum
    }

    /// The document node
    pub fn root(&self) -> NodeIndex {
        0
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn node(&self, index: NodeIndex) -> Option<&SnapshotNode> {
        self.nodes.get(index)
    }

    /// Tag name if `index` is an element
    pub fn tag(&self, index: NodeIndex) -> Option<&str> {
        match self.nodes.get(index).map(|n| &n.data) {
            Some(NodeData::Element { tag, .. }) => Some(tag.as_str()),
            _ => None,
        }
    }

    pub fn attribute(&self, index: NodeIndex, name: &str) -> Option<&str> {
        match self.nodes.get(index).map(|n| &n.data) {
            Some(NodeData::Element { attributes, .. }) => attributes
                .iter()
                .find(|(attr, _)| attr == name)
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }

    pub fn attributes(&self, index: NodeIndex) -> BTreeMap<String, String> {
        match self.nodes.get(index).map(|n| &n.data) {
            Some(NodeData::Element { attributes, .. }) => attributes.iter().cloned().collect(),
            _ => BTreeMap::new(),
        }
    }

    /// Element children of a node, in document order
    pub fn element_children(&self, index: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.nodes
            .get(index)
            .map(|n| n.children.as_slice())
            .unwrap_or_default()
            .iter()
            .copied()
            .filter(move |&child| self.tag(child).is_some())
    }

    /// Element descendants of a node (excluding the node), in document order
    pub fn descendant_elements(&self, index: NodeIndex) -> Vec<NodeIndex> {
        let mut found = Vec::new();
        let mut stack: Vec<NodeIndex> = self.element_children(index).collect();
        stack.reverse();
        while let Some(next) = stack.pop() {
            found.push(next);
            let mut children: Vec<NodeIndex> = self.element_children(next).collect();
            children.reverse();
            stack.extend(children);
        }
        found
    }

    /// Nearest ancestor that is an element
    pub fn parent_element(&self, index: NodeIndex) -> Option<NodeIndex> {
        let parent = self.nodes.get(index)?.parent?;
        self.tag(parent).map(|_| parent)
    }

    /// The `<body>` element, if the document has one
    pub fn body(&self) -> Option<NodeIndex> {
        let html = self.element_children(self.root()).next()?;
        self.element_children(html)
            .find(|&child| self.tag(child) == Some("body"))
    }

    /// Tag and attributes of the node and each ancestor element up to `html`
    pub fn lineage(&self, index: NodeIndex) -> Vec<PathStep> {
        let mut steps = Vec::new();
        let mut current = self.tag(index).map(|_| index);
        while let Some(node) = current {
            if let Some(tag) = self.tag(node) {
                steps.push(PathStep {
                    tag: tag.to_string(),
                    attributes: self.attributes(node),
                });
            }
            current = self.parent_element(node);
        }
        steps
    }

    /// Re-serialized outer markup of an element or text node
    pub fn outer_html(&self, index: NodeIndex) -> String {
        let mut out = String::new();
        self.write_node(index, "", &mut out);
        out
    }

    /// Normalized text of the node's direct text children
    pub fn own_text(&self, index: NodeIndex) -> String {
        let Some(node) = self.nodes.get(index) else {
            return String::new();
        };
        text::join_fragments(node.children.iter().filter_map(|&child| {
            match &self.nodes[child].data {
                NodeData::Text(content) => Some(content.as_str()),
                _ => None,
            }
        }))
    }

    /// Normalized text of every text descendant, skipping script and style
    pub fn all_text(&self, index: NodeIndex) -> String {
        let mut fragments = Vec::new();
        self.collect_text(index, &mut fragments);
        text::join_fragments(fragments)
    }

    /// Everything the extraction engine needs to know about one element
    pub fn describe(&self, index: NodeIndex) -> Option<NodeDescription> {
        let tag = self.tag(index)?.to_string();
        Some(NodeDescription {
            tag,
            attributes: self.attributes(index),
            outer_html: self.outer_html(index),
            own_text: self.own_text(index),
            all_text: self.all_text(index),
            child_tags: self
                .element_children(index)
                .filter_map(|child| self.tag(child).map(|t| t.to_string()))
                .collect(),
            lineage: self.lineage(index),
        })
    }

    fn collect_text<'a>(&'a self, index: NodeIndex, fragments: &mut Vec<&'a str>) {
        let Some(node) = self.nodes.get(index) else {
            return;
        };
        match &node.data {
            NodeData::Text(content) => fragments.push(content),
            NodeData::Element { tag, .. } if markup::RAW_TEXT_ELEMENTS.contains(&tag.as_str()) => {}
            _ => {
                for &child in &node.children {
                    self.collect_text(child, fragments);
                }
            }
        }
    }

    fn write_node(&self, index: NodeIndex, parent_tag: &str, out: &mut String) {
        let Some(node) = self.nodes.get(index) else {
            return;
        };
        match &node.data {
            NodeData::Document => {
                for &child in &node.children {
                    self.write_node(child, "", out);
                }
            }
            NodeData::Text(content) => markup::write_text(out, parent_tag, content),
            NodeData::Element { tag, attributes } => {
                markup::write_start_tag(
                    out,
                    tag,
                    attributes.iter().map(|(k, v)| (k.as_str(), v.as_str())),
                );
                for &child in &node.children {
                    self.write_node(child, tag, out);
                }
                markup::write_end_tag(out, tag);
            }
        }
    }
}

fn push_element(nodes: &mut Vec<SnapshotNode>, element: ElementRef<'_>, parent: NodeIndex) {
    let index = nodes.len();
    let mut attributes = element
        .value()
        .attrs()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect::<Vec<_>>();
    attributes.sort();

    nodes.push(SnapshotNode {
        data: NodeData::Element {
            tag: element.value().name().to_ascii_lowercase(),
            attributes,
        },
        parent: Some(parent),
        children: Vec::new(),
    });
    nodes[parent].children.push(index);

    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            push_element(nodes, child_element, index);
        } else if let Some(content) = child.value().as_text() {
            let text_index = nodes.len();
            nodes.push(SnapshotNode {
                data: NodeData::Text(content.to_string()),
                parent: Some(index),
                children: Vec::new(),
            });
            nodes[index].children.push(text_index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html><head><title>T</title><script>var x = 1 < 2;</script></head>
<body>
  <div id="main" class="wrap">
    <p class="lead">Hello <b>bold</b> world</p>
    <img src="a.png" alt="A">
  </div>
</body></html>"#;

    #[test]
    fn test_parse_records_url_host_and_checksum() {
        let snapshot = DocumentSnapshot::parse("https://example.com/page", PAGE);
        assert_eq!(snapshot.url(), "https://example.com/page");
        assert_eq!(snapshot.host(), Some("example.com"));
        assert_eq!(snapshot.checksum(), &fingerprint::page_source_checksum(PAGE));
        assert!(!snapshot.is_empty());
    }

    #[test]
    fn test_body_and_lineage() {
        let snapshot = DocumentSnapshot::parse("https://example.com", PAGE);
        let body = snapshot.body().unwrap();
        assert_eq!(snapshot.tag(body), Some("body"));

        let p = snapshot
            .descendant_elements(body)
            .into_iter()
            .find(|&n| snapshot.tag(n) == Some("p"))
            .unwrap();
        let tags: Vec<_> = snapshot.lineage(p).into_iter().map(|s| s.tag).collect();
        assert_eq!(tags, vec!["p", "div", "body", "html"]);
        assert_eq!(snapshot.attribute(p, "class"), Some("lead"));
    }

    #[test]
    fn test_descendants_in_document_order() {
        let snapshot = DocumentSnapshot::parse("https://example.com", PAGE);
        let body = snapshot.body().unwrap();
        let tags: Vec<_> = snapshot
            .descendant_elements(body)
            .into_iter()
            .filter_map(|n| snapshot.tag(n).map(|t| t.to_string()))
            .collect();
        assert_eq!(tags, vec!["div", "p", "b", "img"]);
    }

    #[test]
    fn test_text_and_markup() {
        let snapshot = DocumentSnapshot::parse("https://example.com", PAGE);
        let body = snapshot.body().unwrap();
        let p = snapshot
            .descendant_elements(body)
            .into_iter()
            .find(|&n| snapshot.tag(n) == Some("p"))
            .unwrap();

        assert_eq!(snapshot.own_text(p), "Hello world");
        assert_eq!(snapshot.all_text(p), "Hello bold world");
        assert_eq!(
            snapshot.outer_html(p),
            r#"<p class="lead">Hello <b>bold</b> world</p>"#
        );

        let description = snapshot.describe(p).unwrap();
        assert_eq!(description.child_tags, vec!["b"]);
        assert_eq!(description.lineage.len(), 4);
    }

    #[test]
    fn test_void_and_raw_text_serialization() {
        let snapshot = DocumentSnapshot::parse("https://example.com", PAGE);
        let html = snapshot.element_children(snapshot.root()).next().unwrap();
        let markup = snapshot.outer_html(html);
        assert!(markup.contains(r#"<img alt="A" src="a.png">"#));
        assert!(!markup.contains("</img>"));
        assert!(markup.contains("var x = 1 < 2;"));
        assert!(!snapshot.all_text(html).contains("var x"));
    }
}
