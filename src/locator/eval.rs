//! Parsing and evaluation of structural locators against a snapshot.
//!
//! Supported grammar, which is exactly what the generator emits plus a few
//! common forms:
//!
//! ```text
//! locator   := path | "(" path ")" "[" n "]"
//! path      := ("/" | "//") step (("/" | "//") step)*
//! step      := name predicate*
//! name      := tag | "*"
//! predicate := "[" n "]" | "[" condition (" and " condition)* "]"
//! condition := contains(@attr,"v") | @attr="v" | @attr
//! ```

use super::{LocatorIndex, split_positional_wrapper, split_steps};
use crate::error::LocatorError;
use crate::snapshot::{DocumentSnapshot, NodeIndex};
use async_trait::async_trait;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static CONTAINS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^contains\(\s*@([A-Za-z_][\w:.\-]*)\s*,\s*(?:"([^"]*)"|'([^']*)')\s*\)$"#)
        .expect("contains pattern is valid")
});

static EQUALS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^@([A-Za-z_][\w:.\-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')$"#)
        .expect("equals pattern is valid")
});

static HAS_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@([A-Za-z_][\w:.\-]*)$").expect("has-attr pattern is valid"));

static NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\*|[A-Za-z][\w:.\-]*)$").expect("name pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Contains { attr: String, value: String },
    Equals { attr: String, value: String },
    HasAttr(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// 1-based position among the nodes selected so far by the step
    Position(usize),
    /// All conditions must hold
    All(Vec<Condition>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub axis: Axis,
    /// `None` matches any element
    pub name: Option<String>,
    pub predicates: Vec<Predicate>,
}

/// A parsed structural locator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLocator {
    pub steps: Vec<Step>,
    /// Set for the `(path)[k]` form
    pub position: Option<usize>,
}

impl ParsedLocator {
    pub fn parse(locator: &str) -> Result<Self, LocatorError> {
        let trimmed = locator.trim();
        let invalid = |why: &str| LocatorError::InvalidSyntax(format!("{why}: {locator}"));

        let (path, position) = if trimmed.starts_with('(') {
            let (inner, k) =
                split_positional_wrapper(trimmed).ok_or_else(|| invalid("bad positional wrapper"))?;
            if k == 0 {
                return Err(invalid("positions are 1-based"));
            }
            (inner.trim(), Some(k))
        } else {
            (trimmed, None)
        };

        if !path.starts_with('/') {
            return Err(invalid("locator must start with '/'"));
        }

        let (segments, balanced) = split_steps(path);
        if !balanced {
            return Err(invalid("unbalanced brackets or quotes"));
        }

        let mut steps = Vec::new();
        let mut descendant = false;
        // segments[0] is the empty string before the leading '/'
        for segment in segments.iter().skip(1) {
            if segment.is_empty() {
                if descendant {
                    return Err(invalid("empty step"));
                }
                descendant = true;
                continue;
            }
            let axis = if descendant {
                Axis::Descendant
            } else {
                Axis::Child
            };
            steps.push(parse_step(segment, axis).map_err(|why| invalid(why.as_str()))?);
            descendant = false;
        }

        if descendant || steps.is_empty() {
            return Err(invalid("locator ends without a step"));
        }

        Ok(Self { steps, position })
    }

    /// Evaluates against a snapshot, returning matches in document order
    pub fn evaluate(&self, snapshot: &DocumentSnapshot) -> Vec<NodeIndex> {
        let mut context = vec![snapshot.root()];

        for step in &self.steps {
            let bases: BTreeSet<NodeIndex> = match step.axis {
                Axis::Child => context.iter().copied().collect(),
                Axis::Descendant => {
                    let mut all = BTreeSet::new();
                    for &node in &context {
                        if all.insert(node) {
                            all.extend(snapshot.descendant_elements(node));
                        }
                    }
                    all
                }
            };

            let mut next = BTreeSet::new();
            for base in bases {
                let candidates: Vec<NodeIndex> = snapshot
                    .element_children(base)
                    .filter(|&child| name_matches(snapshot, child, step.name.as_deref()))
                    .collect();
                next.extend(apply_predicates(snapshot, candidates, &step.predicates));
            }
            // BTreeSet keeps document order, since indices are pre-order positions
            context = next.into_iter().collect();
            if context.is_empty() {
                break;
            }
        }

        match self.position {
            Some(k) => context.into_iter().nth(k - 1).into_iter().collect(),
            None => context,
        }
    }
}

fn parse_step(segment: &str, axis: Axis) -> Result<Step, String> {
    let name_end = segment.find('[').unwrap_or(segment.len());
    let name = segment[..name_end].trim();
    if !NAME.is_match(name) {
        return Err(format!("bad node name '{name}'"));
    }

    let mut predicates = Vec::new();
    let mut rest = &segment[name_end..];
    while !rest.is_empty() {
        let body_end = matching_bracket(rest).ok_or_else(|| "unclosed predicate".to_string())?;
        predicates.push(parse_predicate(&rest[1..body_end])?);
        rest = &rest[body_end + 1..];
    }

    Ok(Step {
        axis,
        name: (name != "*").then(|| name.to_ascii_lowercase()),
        predicates,
    })
}

/// Byte offset of the `]` closing the `[` at the start of `s`
fn matching_bracket(s: &str) -> Option<usize> {
    if !s.starts_with('[') {
        return None;
    }
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_predicate(body: &str) -> Result<Predicate, String> {
    let body = body.trim();
    if !body.is_empty() && body.bytes().all(|b| b.is_ascii_digit()) {
        let n = body
            .parse::<usize>()
            .map_err(|e| format!("bad position '{body}': {e}"))?;
        if n == 0 {
            return Err("positions are 1-based".to_string());
        }
        return Ok(Predicate::Position(n));
    }

    split_conditions(body)
        .into_iter()
        .map(parse_condition)
        .collect::<Result<Vec<_>, _>>()
        .map(Predicate::All)
}

/// Splits on ` and ` outside of quotes
fn split_conditions(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;
    let bytes = body.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == ' ' && body[i..].starts_with(" and ") => {
                parts.push(body[start..i].trim());
                i += " and ".len();
                start = i;
                continue;
            }
            None => {}
        }
        i += 1;
    }
    parts.push(body[start..].trim());
    parts
}

fn parse_condition(condition: &str) -> Result<Condition, String> {
    if let Some(caps) = CONTAINS.captures(condition) {
        let value = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
        return Ok(Condition::Contains {
            attr: caps[1].to_string(),
            value: value.to_string(),
        });
    }
    if let Some(caps) = EQUALS.captures(condition) {
        let value = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
        return Ok(Condition::Equals {
            attr: caps[1].to_string(),
            value: value.to_string(),
        });
    }
    if let Some(caps) = HAS_ATTR.captures(condition) {
        return Ok(Condition::HasAttr(caps[1].to_string()));
    }
    Err(format!("unsupported predicate '{condition}'"))
}

fn name_matches(snapshot: &DocumentSnapshot, node: NodeIndex, name: Option<&str>) -> bool {
    match (snapshot.tag(node), name) {
        (Some(_), None) => true,
        (Some(tag), Some(name)) => tag.eq_ignore_ascii_case(name),
        (None, _) => false,
    }
}

fn apply_predicates(
    snapshot: &DocumentSnapshot,
    mut candidates: Vec<NodeIndex>,
    predicates: &[Predicate],
) -> Vec<NodeIndex> {
    for predicate in predicates {
        candidates = match predicate {
            Predicate::Position(n) => candidates.get(n - 1).copied().into_iter().collect(),
            Predicate::All(conditions) => candidates
                .into_iter()
                .filter(|&node| {
                    conditions
                        .iter()
                        .all(|condition| condition_holds(snapshot, node, condition))
                })
                .collect(),
        };
    }
    candidates
}

fn condition_holds(snapshot: &DocumentSnapshot, node: NodeIndex, condition: &Condition) -> bool {
    match condition {
        Condition::Contains { attr, value } => snapshot
            .attribute(node, attr)
            .unwrap_or_default()
            .contains(value.as_str()),
        Condition::Equals { attr, value } => snapshot.attribute(node, attr) == Some(value.as_str()),
        Condition::HasAttr(attr) => snapshot.attribute(node, attr).is_some(),
    }
}

#[async_trait]
impl LocatorIndex for DocumentSnapshot {
    type Node = NodeIndex;

    async fn find_all(&self, locator: &str) -> Result<Vec<NodeIndex>, LocatorError> {
        let parsed = ParsedLocator::parse(locator)?;
        Ok(parsed.evaluate(self))
    }

    async fn same_node(&self, a: &NodeIndex, b: &NodeIndex) -> Result<bool, LocatorError> {
        Ok(a == b)
    }
}
