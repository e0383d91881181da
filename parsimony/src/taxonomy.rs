//! Lineage strings and majority-vote assignment of internal-node taxonomy (C6).

use crate::tree::{NodeId, Tree};
use std::collections::{BTreeMap, HashMap};

/// Source of per-leaf taxonomy lineages, keyed by leaf title.
pub trait TaxonomyStore {
    fn lineage(&self, leaf_title: &str) -> Option<&str>;
}

#[derive(Clone, Debug, Default)]
pub struct TaxonomyTable {
    by_title: HashMap<String, String>,
}

impl TaxonomyTable {
    pub fn new() -> Self {
        TaxonomyTable::default()
    }

    pub fn insert(&mut self, title: impl Into<String>, lineage: impl Into<String>) {
        self.by_title.insert(title.into(), lineage.into());
    }
}

impl TaxonomyStore for TaxonomyTable {
    fn lineage(&self, leaf_title: &str) -> Option<&str> {
        self.by_title.get(leaf_title).map(|s| s.as_str())
    }
}

/// Split a lineage string on `;` or `/`, dropping leading/trailing
/// whitespace on each token and any token beginning with "unclass"
/// (case-insensitive).
pub fn parse_lineage(lineage: &str) -> Vec<String> {
    lineage
        .split(|c| c == ';' || c == '/')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter(|s| !s.to_ascii_lowercase().starts_with("unclass"))
        .map(|s| s.to_string())
        .collect()
}

/// Majority-vote taxonomy for every node in `tree`, keyed by [`NodeId`].
/// Leaves take their taxonomy directly from `store`. An internal node's
/// taxonomy is the longest lineage prefix shared by at least 50% of its
/// taxonomy-bearing leaf descendants, provided no shorter competing prefix
/// holds more than 90% as many votes.
pub fn assign_internal_taxonomy(tree: &Tree, store: &dyn TaxonomyStore) -> HashMap<NodeId, String> {
    let mut assigned: HashMap<NodeId, String> = HashMap::new();

    for &id in tree.postorder() {
        let node = tree.node(id);
        if node.is_leaf() {
            if let Some(lineage) = store.lineage(&node.title) {
                assigned.insert(id, lineage.to_string());
            }
            continue;
        }

        let descendants = tree.leaf_descendants(id);
        let mut common_counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut n_described = 0usize;

        for leaf in &descendants {
            let lineage = match assigned.get(leaf) {
                Some(l) => l.clone(),
                None => continue,
            };
            if lineage.is_empty() {
                continue;
            }
            n_described += 1;

            *common_counts.entry(lineage.clone()).or_insert(0) += 1;
            for (i, c) in lineage.char_indices() {
                if c == ';' || c == '/' {
                    let prefix = lineage[..i].to_string();
                    *common_counts.entry(prefix).or_insert(0) += 1;
                }
            }
        }

        let thresh = 50 * n_described / 100;
        let mut best_count = 0usize;
        let mut best = String::new();
        for (key, &count) in &common_counts {
            if count >= thresh && count * 100 > best_count * 90 && key.len() > best.len() {
                best = key.clone();
                best_count = count;
            }
        }

        assigned.insert(id, best);
    }

    assigned
}
