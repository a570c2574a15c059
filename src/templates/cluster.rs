//! First-match-wins clustering of template strings and subsumption reduction.

use super::similarity::is_similar;

/// A group of input positions sharing one template string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    /// Template string of the first member; the cluster's key
    pub markup: String,
    /// Indices into the clustered input, ascending
    pub members: Vec<usize>,
}

/// Partitions template strings into clusters
///
/// Strings are visited in input order. Each unassigned string opens a new
/// cluster and absorbs every later unassigned string similar to it; once
/// assigned, a string is never compared again. Empty strings are skipped.
pub fn cluster(markups: &[String], threshold: f64) -> Vec<Cluster> {
    let mut assigned = vec![false; markups.len()];
    let mut clusters = Vec::new();

    for (i, markup) in markups.iter().enumerate() {
        if assigned[i] {
            continue;
        }
        if markup.is_empty() {
            ::log::debug!("Skipping empty template string at position {}", i);
            assigned[i] = true;
            continue;
        }
        assigned[i] = true;

        let mut members = vec![i];
        for (j, other) in markups.iter().enumerate().skip(i + 1) {
            if assigned[j] || other.is_empty() {
                continue;
            }
            if is_similar(markup, other, threshold) {
                ::log::trace!("Template string {} joins cluster of {}", j, i);
                assigned[j] = true;
                members.push(j);
            }
        }

        clusters.push(Cluster {
            markup: markup.clone(),
            members,
        });
    }

    clusters
}

/// Drops every cluster whose markup is a strict substring of another's
pub fn reduce(clusters: Vec<Cluster>) -> Vec<Cluster> {
    let subsumed: Vec<bool> = clusters
        .iter()
        .map(|candidate| {
            clusters.iter().any(|other| {
                other.markup.len() > candidate.markup.len()
                    && other.markup.contains(candidate.markup.as_str())
            })
        })
        .collect();

    clusters
        .into_iter()
        .zip(subsumed)
        .filter_map(|(cluster, subsumed)| {
            if subsumed {
                ::log::debug!("Template {} is part of a larger template", cluster.markup);
                None
            } else {
                Some(cluster)
            }
        })
        .collect()
}
