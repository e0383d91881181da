//! Bottom-up and top-down ancestral parsimony-set inference (C2).

use crate::parsimony_set::ParsimonySet;
use crate::tree::{NodeId, Tree};
use std::collections::HashMap;

/// Per-node parsimony sets produced by [`infer`], plus the per-node subtree
/// union sets used by the pruned insertion search as a cheap upper bound.
pub struct AncestorStore {
    pub sets: HashMap<NodeId, ParsimonySet>,
    pub unions: HashMap<NodeId, ParsimonySet>,
    pub steps: u64,
}

/// Bottom-up Fitch pass: leaves take their sets from `leaf_sets`; every
/// interior node's set is built from the union and intersection of its
/// children via [`ParsimonySet::set_from`], accumulating the total
/// parsimony step count. Also records, per node, the union of its subtree's
/// leaf sets for use as a pruning bound during insertion search.
pub fn infer(tree: &Tree, leaf_sets: &HashMap<NodeId, ParsimonySet>) -> AncestorStore {
    let mut sets: HashMap<NodeId, ParsimonySet> = HashMap::new();
    let mut unions: HashMap<NodeId, ParsimonySet> = HashMap::new();
    let mut steps = 0u64;

    for &id in tree.postorder() {
        let node = tree.node(id);
        if node.is_leaf() {
            if let Some(set) = leaf_sets.get(&id) {
                sets.insert(id, set.clone());
                unions.insert(id, set.clone());
            }
            continue;
        }

        let mut union = ParsimonySet::empty(0);
        let mut intersect = ParsimonySet::empty(0);
        let mut subtree_union = ParsimonySet::empty(0);

        for &child in &node.children {
            let Some(child_set) = sets.get(&child) else {
                continue;
            };
            union.union_with(child_set);
            intersect.intersect_with(child_set);
            if let Some(child_union) = unions.get(&child) {
                subtree_union.union_with(child_union);
            }
        }

        let mut node_set = ParsimonySet::empty(union.len());
        steps += node_set.set_from(&union, &intersect);
        sets.insert(id, node_set);
        unions.insert(id, subtree_union);
    }

    AncestorStore { sets, unions, steps }
}

/// Top-down refinement pass: after the bottom-up pass, walk the tree root
/// to leaves and tighten each interior node's set by intersecting with its
/// parent's resolved set wherever that intersection is non-empty.
pub fn refine(tree: &Tree, store: &mut AncestorStore) {
    for &id in tree.preorder() {
        let node = tree.node(id);
        let Some(parent_id) = node.parent else {
            continue;
        };
        let parent_set = match store.sets.get(&parent_id) {
            Some(s) => s.clone(),
            None => continue,
        };
        if let Some(set) = store.sets.get_mut(&id) {
            set.force(&parent_set);
        }
    }
}
