//! Structural locators: generation, evaluation and selector translation.
//!
//! A structural locator is an XPath-like path such as
//! `//div[contains(@class,"card")]/span` or `(//ul/li)[3]`. The generator
//! only ever emits the subset understood by [`eval`], so every generated
//! locator can be re-evaluated against a [`crate::snapshot::DocumentSnapshot`]
//! as well as against a live browser.

pub mod css;
pub mod discover;
pub mod eval;
pub mod generator;

use crate::error::LocatorError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use css::to_css_selector;
pub use generator::{GeneratedLocator, generate};

/// One element on the path from a node up to the document root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathStep {
    pub tag: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

/// Something a locator can be evaluated against: a snapshot or a live session
///
/// Only used by the generator to test uniqueness and to find the target's
/// position among several matches.
#[async_trait]
pub trait LocatorIndex: Send + Sync {
    type Node: Send + Sync;

    /// All nodes matched by `locator`, in document order
    async fn find_all(&self, locator: &str) -> Result<Vec<Self::Node>, LocatorError>;

    /// Whether two handles refer to the same node
    async fn same_node(&self, a: &Self::Node, b: &Self::Node) -> Result<bool, LocatorError>;
}

/// Splits a locator path on `/`, ignoring slashes inside brackets or quotes
///
/// Returns the segments and whether brackets and quotes were balanced.
/// Never fails; callers that need well-formed input check the flag.
pub(crate) fn split_steps(path: &str) -> (Vec<&str>, bool) {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut balanced = true;
    let mut start = 0;

    for (i, c) in path.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '[') | (None, '(') => depth += 1,
            (None, ']') | (None, ')') => {
                if depth == 0 {
                    balanced = false;
                } else {
                    depth -= 1;
                }
            }
            (None, '/') if depth == 0 => {
                segments.push(&path[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(&path[start..]);

    if depth != 0 || quote.is_some() {
        balanced = false;
    }
    (segments, balanced)
}

/// Splits `(inner)[k]` into `inner` and `k`
pub(crate) fn split_positional_wrapper(locator: &str) -> Option<(&str, usize)> {
    let rest = locator.strip_prefix('(')?;
    let close = rest.rfind(")[")?;
    let index = rest[close + 2..].strip_suffix(']')?;
    let position = index.trim().parse::<usize>().ok()?;
    Some((&rest[..close], position))
}
