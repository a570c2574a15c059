//! Candidate locators for every extractable element in a snapshot.

use super::generator::generate;
use crate::config::ExtractorConfig;
use crate::snapshot::{DocumentSnapshot, NodeIndex};
use std::collections::HashMap;

/// Locators produced for one document, with per-locator use counts
///
/// The counts replace any shared disambiguation state: each discovery pass
/// owns its own tally.
#[derive(Debug, Default)]
pub struct LocatorTally {
    locators: Vec<String>,
    counts: HashMap<String, usize>,
}

impl LocatorTally {
    /// Records a locator; returns false if it was already produced
    pub fn record(&mut self, locator: String) -> bool {
        let count = self.counts.entry(locator.clone()).or_insert(0);
        *count += 1;
        if *count > 1 {
            return false;
        }
        self.locators.push(locator);
        true
    }

    /// Locators that were produced more than once
    pub fn collisions(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts
            .iter()
            .filter(|(_, count)| **count > 1)
            .map(|(locator, count)| (locator.as_str(), *count))
    }

    pub fn into_locators(self) -> Vec<String> {
        self.locators
    }
}

/// Generates one locator per extractable element under `<body>`
///
/// Elements with an excluded tag, or nested inside one, are skipped.
pub async fn candidate_locators(snapshot: &DocumentSnapshot, config: &ExtractorConfig) -> Vec<String> {
    let Some(body) = snapshot.body() else {
        ::log::warn!("No <body> in snapshot of {}", snapshot.url());
        return Vec::new();
    };

    let mut tally = LocatorTally::default();
    for node in snapshot.descendant_elements(body) {
        if !is_extractable(snapshot, node, config) {
            continue;
        }

        let lineage = snapshot.lineage(node);
        match generate(snapshot, &node, &lineage, &config.locator_attributes).await {
            Ok(generated) => {
                if !tally.record(generated.xpath) {
                    ::log::debug!("Skipping node {} with a repeated locator", node);
                }
            }
            Err(e) => ::log::warn!("No locator for node {}: {}", node, e),
        }
    }

    for (locator, count) in tally.collisions() {
        ::log::warn!("Locator {} was generated {} times", locator, count);
    }

    let locators = tally.into_locators();
    ::log::debug!(
        "Discovered {} candidate locators in {}",
        locators.len(),
        snapshot.url()
    );
    locators
}

fn is_extractable(snapshot: &DocumentSnapshot, node: NodeIndex, config: &ExtractorConfig) -> bool {
    let mut current = Some(node);
    while let Some(index) = current {
        match snapshot.tag(index) {
            Some("body") | Some("html") | None => return true,
            Some(tag) if config.is_excluded_tag(tag) => return false,
            Some(_) => current = snapshot.parent_element(index),
        }
    }
    true
}
