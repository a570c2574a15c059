//! Template Clustering Engine and Template Type Classifier.
//!
//! Parent elements are normalized into template strings, clustered by
//! edit-distance similarity, filtered by size, reduced by subsumption, and
//! each surviving template is classified by its structural composition.

pub mod classify;
pub mod cluster;
pub mod similarity;


use crate::element::{Classification, Element};
use crate::fingerprint::Checksum;
use crate::markup::template::template_string;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use classify::classify_markup;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateType {
    Atom,
    Molecule,
    Organism,
    Template,
    Unknown,
}

/// A cluster of structurally similar elements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// Template string of the first member
    pub markup: String,
    /// Member element keys, in original element order
    pub members: Vec<Checksum>,
    pub template_type: TemplateType,
}

/// Registry of templates keyed by their template string
pub type TemplateRegistry = BTreeMap<String, Template>;

/// Builds the template registry for one page's elements
///
/// Only Parent elements take part. Templates with fewer than `min_members`
/// members are dropped before subsumption reduction.
pub fn build_registry(elements: &[Element], threshold: f64, min_members: usize) -> TemplateRegistry {
    let parents: Vec<&Element> = elements
        .iter()
        .filter(|element| element.classification == Classification::Parent)
        .collect();
    let markups: Vec<String> = parents
        .iter()
        .map(|element| template_string(&element.outer_html))
        .collect();

    let clusters = cluster::cluster(&markups, threshold);
    let before = clusters.len();
    let clusters: Vec<_> = clusters
        .into_iter()
        .filter(|c| c.members.len() >= min_members)
        .collect();
    let clusters = cluster::reduce(clusters);

    ::log::debug!(
        "{} parent elements formed {} clusters, {} templates kept",
        parents.len(),
        before,
        clusters.len()
    );

    clusters
        .into_iter()
        .map(|c| {
            let template_type = classify_markup(&c.markup);
            let members = c
                .members
                .iter()
                .map(|&i| parents[i].key.clone())
                .collect();
            (
                c.markup.clone(),
                Template {
                    markup: c.markup,
                    members,
                    template_type,
                },
            )
        })
        .collect()
}
