//! Insertion point search: scores a query's parsimony set against every
//! candidate node in the reference tree, using the subtree-union bound to
//! prune whole branches when they cannot beat the current best (C5).

use crate::ancestor::AncestorStore;
use crate::collector::BestKCollector;
use crate::cost;
use crate::parsimony_set::ParsimonySet;
use crate::tree::{NodeId, Tree};
use crate::Mask;
use std::collections::HashMap;

/// Percentage (of `n_sites`) used as the fast-descent cutoff: a subtree is
/// only explored further if its union bound stays within this share of
/// sites from the current worst-kept score.
pub const DEFAULT_FAST_PERCENT: u64 = 20;

pub struct SearchParams<'a> {
    pub n_sites: u64,
    pub fast_percent: u64,
    pub mask: &'a Mask,
    pub taxonomy: &'a HashMap<NodeId, String>,
    pub rank_depth: &'a dyn Fn(&str) -> usize,
}

/// Exhaustive insertion search: scores every node in the tree, keeping the
/// best `k` via `collector`. Always correct, but O(n) per query.
pub fn full_scan(tree: &Tree, query: &ParsimonySet, store: &AncestorStore, params: &SearchParams, collector: &mut BestKCollector) {
    for &id in tree.preorder() {
        score_node(tree, id, query, store, params, collector);
    }
}

/// Pruned-descent insertion search: visits nodes top-down, skipping a
/// subtree once its union-set bound on the best achievable score exceeds
/// the fast-descent threshold derived from the collector's current worst
/// kept score.
pub fn pruned_descent(tree: &Tree, root: NodeId, query: &ParsimonySet, store: &AncestorStore, params: &SearchParams, collector: &mut BestKCollector) {
    score_node(tree, root, query, store, params, collector);

    let node = tree.node(root);
    if node.is_leaf() {
        return;
    }

    let threshold = params.n_sites * params.fast_percent / 100;
    let worst = collector.worst_score();
    let gate = threshold.min(worst);

    let recurse = match store.unions.get(&root) {
        Some(union_set) => {
            match cost::score(query, union_set, params.mask, gate) {
                Some(outcome) => outcome.diffs + outcome.indels <= gate,
                None => false,
            }
        }
        None => true,
    };

    if recurse {
        for &child in &node.children {
            pruned_descent(tree, child, query, store, params, collector);
        }
    }
}

fn score_node(tree: &Tree, id: NodeId, query: &ParsimonySet, store: &AncestorStore, params: &SearchParams, collector: &mut BestKCollector) {
    let Some(node_set) = store.sets.get(&id) else {
        return;
    };
    let threshold = collector.worst_score();
    if let Some(outcome) = cost::score(query, node_set, params.mask, threshold) {
        let score = outcome.score();
        if score < collector.worst_score() {
            let taxonomy = params.taxonomy.get(&id).cloned().unwrap_or_default();
            let depth = (params.rank_depth)(&taxonomy);
            let node = tree.node(id);
            collector.add(score, id, !node.is_leaf(), taxonomy, depth);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ancestor::infer;
    use crate::tree::Node;
    use std::collections::HashMap as Map;

    fn leaf(id: usize, title: &str, parent: usize) -> Node {
        Node {
            id: NodeId(id),
            title: title.to_string(),
            parent: Some(NodeId(parent)),
            children: vec![],
            attrs: Map::new(),
            branch_length: 0.1,
        }
    }

    fn small_tree() -> Tree {
        let nodes = vec![
            Node {
                id: NodeId(0),
                title: "root".into(),
                parent: None,
                children: vec![NodeId(1)],
                attrs: Map::new(),
                branch_length: 0.0,
            },
            Node {
                id: NodeId(1),
                title: "internal".into(),
                parent: Some(NodeId(0)),
                children: vec![NodeId(2), NodeId(3)],
                attrs: Map::new(),
                branch_length: 0.2,
            },
            leaf(2, "L1", 1),
            leaf(3, "L2", 1),
        ];
        Tree::new(nodes)
    }

    fn no_depth(_: &str) -> usize {
        0
    }

    #[test]
    fn full_scan_finds_exact_match() {
        let tree = small_tree();
        let mut leaves = HashMap::new();
        leaves.insert(NodeId(2), ParsimonySet::from_sequence("ACGT"));
        leaves.insert(NodeId(3), ParsimonySet::from_sequence("ACGA"));
        let store = infer(&tree, &leaves);

        let query = ParsimonySet::from_sequence("ACGT");
        let mask = vec![1; 4];
        let taxonomy = HashMap::new();
        let params = SearchParams {
            n_sites: 4,
            fast_percent: DEFAULT_FAST_PERCENT,
            mask: &mask,
            taxonomy: &taxonomy,
            rank_depth: &no_depth,
        };
        let mut collector = BestKCollector::new(5);
        full_scan(&tree, &query, &store, &params, &mut collector);
        assert_eq!(collector.entries()[0].node, NodeId(2));
        assert_eq!(collector.entries()[0].score, 0);
    }

    #[test]
    fn pruned_descent_agrees_with_full_scan_on_best_hit() {
        let tree = small_tree();
        let mut leaves = HashMap::new();
        leaves.insert(NodeId(2), ParsimonySet::from_sequence("ACGT"));
        leaves.insert(NodeId(3), ParsimonySet::from_sequence("ACGA"));
        let store = infer(&tree, &leaves);

        let query = ParsimonySet::from_sequence("ACGT");
        let mask = vec![1; 4];
        let taxonomy = HashMap::new();
        let params = SearchParams {
            n_sites: 4,
            fast_percent: DEFAULT_FAST_PERCENT,
            mask: &mask,
            taxonomy: &taxonomy,
            rank_depth: &no_depth,
        };

        let mut full = BestKCollector::new(5);
        full_scan(&tree, &query, &store, &params, &mut full);

        let mut pruned = BestKCollector::new(5);
        pruned_descent(&tree, tree.root(), &query, &store, &params, &mut pruned);

        assert_eq!(full.entries()[0].node, pruned.entries()[0].node);
        assert_eq!(full.entries()[0].score, pruned.entries()[0].score);
    }
}
