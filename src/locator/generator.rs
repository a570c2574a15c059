//! Minimal unique structural locators.
//!
//! The generator starts from `/tag[predicate]` for the target node and walks
//! up its ancestors, prepending one `/ancestor` step at a time. After each
//! prepend it checks whether `//ancestor<suffix>` already matches exactly one
//! node and returns that shorter form if so. If the walk reaches `body` or
//! `html` without becoming unique, the full path is disambiguated by
//! position as `(path)[k]`.
//!
//! Evaluation failures never abort generation: they are logged and the best
//! locator built so far is returned with a warning attached.

use super::{LocatorIndex, PathStep};
use crate::error::LocatorError;
use std::collections::BTreeMap;

/// Values containing these are never used in predicates
const SCRIPT_MARKERS: &[&str] = &["javascript", "void()"];

/// Outcome of locator generation for one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedLocator {
    pub xpath: String,
    /// Set when uniqueness could not be confirmed
    pub warning: Option<String>,
}

impl GeneratedLocator {
    fn unique(xpath: String) -> Self {
        Self {
            xpath,
            warning: None,
        }
    }

    fn unconfirmed(xpath: String, warning: String) -> Self {
        ::log::warn!("{}", warning);
        Self {
            xpath,
            warning: Some(warning),
        }
    }

    pub fn is_unique(&self) -> bool {
        self.warning.is_none()
    }
}

/// Generates a locator for `target`, unique within `index`
///
/// `lineage` holds the target first, then each ancestor element up to
/// `html`. `attributes` lists the attribute names eligible for the target's
/// predicate, in priority order.
pub async fn generate<I>(
    index: &I,
    target: &I::Node,
    lineage: &[PathStep],
    attributes: &[String],
) -> Result<GeneratedLocator, LocatorError>
where
    I: LocatorIndex + ?Sized,
{
    let Some(node) = lineage.first() else {
        return Err(LocatorError::Evaluation(
            "cannot build a locator without the node's tag".to_string(),
        ));
    };

    let mut xpath = format!(
        "/{}{}",
        node.tag,
        attribute_predicate(&node.attributes, attributes).unwrap_or_default()
    );

    for ancestor in &lineage[1..] {
        let candidate = format!("//{}{}", ancestor.tag, xpath);
        match index.find_all(&candidate).await {
            Ok(matches) if matches.len() == 1 => {
                ::log::trace!("Unique locator found: {}", candidate);
                return Ok(GeneratedLocator::unique(candidate));
            }
            Ok(matches) => {
                ::log::trace!("{} matches {} nodes", candidate, matches.len());
            }
            Err(e) => {
                ::log::warn!("Failed to evaluate {}: {}", candidate, e);
                break;
            }
        }

        xpath = format!("/{}{}", ancestor.tag, xpath);
        if ancestor.tag == "body" || ancestor.tag == "html" {
            break;
        }
    }

    Ok(disambiguate(index, target, format!("/{xpath}")).await)
}

/// Wraps a possibly ambiguous locator as `(xpath)[k]` for the target's position
async fn disambiguate<I>(index: &I, target: &I::Node, xpath: String) -> GeneratedLocator
where
    I: LocatorIndex + ?Sized,
{
    let matches = match index.find_all(&xpath).await {
        Ok(matches) => matches,
        Err(e) => {
            return GeneratedLocator::unconfirmed(
                xpath.clone(),
                format!("Could not evaluate {xpath}: {e}"),
            );
        }
    };

    match matches.len() {
        0 => GeneratedLocator::unconfirmed(xpath.clone(), format!("{xpath} matches no nodes")),
        1 => GeneratedLocator::unique(xpath),
        count => {
            for (position, candidate) in matches.iter().enumerate() {
                match index.same_node(candidate, target).await {
                    Ok(true) => {
                        return GeneratedLocator::unique(format!("({xpath})[{}]", position + 1));
                    }
                    Ok(false) => {}
                    Err(e) => ::log::debug!("Could not compare candidate {}: {}", position + 1, e),
                }
            }
            GeneratedLocator::unconfirmed(
                format!("({xpath})[1]"),
                format!("{xpath} matches {count} nodes and none is the target; using the first"),
            )
        }
    }
}

/// Builds `[contains(@attr,"token")]` from the first eligible attribute
///
/// Only the first stable whitespace-delimited token is used, so multi-class
/// churn does not change the locator. Tokens ending in a digit look
/// generated and are skipped.
pub fn attribute_predicate(
    values: &BTreeMap<String, String>,
    eligible: &[String],
) -> Option<String> {
    eligible.iter().find_map(|attr| {
        let value = values.get(attr)?.trim();
        if value.is_empty() || SCRIPT_MARKERS.iter().any(|m| value.contains(m)) {
            return None;
        }
        let token = value.split_whitespace().find(|token| is_stable_token(token))?;
        Some(format!("[contains(@{attr},\"{token}\")]"))
    })
}

/// False for tokens that look auto-generated or cannot be quoted
pub fn is_stable_token(token: &str) -> bool {
    !token.is_empty()
        && !token.ends_with(|c: char| c.is_ascii_digit())
        && !token.contains('"')
}
