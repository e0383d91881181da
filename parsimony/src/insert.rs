//! Grafts query placements onto the reference tree (C8).

use crate::tree::{NodeId, Tree};

/// A resolved insertion: the node a query attaches under, its branch
/// length, the fraction of differing sites, and the taxonomy it should
/// inherit.
#[derive(Clone, Debug)]
pub struct Placement {
    pub title: String,
    pub attach_to: NodeId,
    pub diffs: u64,
    pub indels: u64,
    pub n_sites: u64,
    pub taxonomy: String,
}

/// Jukes-Cantor corrected distance: `-3/4 * ln(1 - 4p/3)` where `p` is the
/// proportion of differing sites. Falls back to the raw proportion when `p`
/// is at or past the point where the correction diverges.
pub fn jukes_cantor_distance(diffs: u64, indels: u64, n_sites: u64) -> f64 {
    if n_sites == 0 {
        return 0.1;
    }
    let p = (diffs + indels) as f64 / n_sites as f64;
    if p >= 0.75 {
        return p;
    }
    -3.0 / 4.0 * (1.0 - 4.0 / 3.0 * p).ln()
}

/// Raw proportion of differing sites, used as the branch length when
/// Jukes-Cantor correction is disabled.
pub fn raw_distance(diffs: u64, indels: u64, n_sites: u64) -> f64 {
    if n_sites == 0 {
        return 0.1;
    }
    (diffs + indels) as f64 / n_sites as f64
}

/// Walk up from `start` until a non-empty taxonomy is found in `taxonomy`,
/// or the root is reached.
pub fn inherited_taxonomy(tree: &Tree, start: NodeId, taxonomy: &std::collections::HashMap<NodeId, String>) -> String {
    let mut current = Some(start);
    while let Some(id) = current {
        if let Some(tax) = taxonomy.get(&id) {
            if !tax.is_empty() {
                return tax.clone();
            }
        }
        current = tree.node(id).parent;
    }
    String::new()
}

/// Grafts one or more placements that all attach under the same reference
/// node. A single placement becomes a direct child; multiple placements are
/// gathered under a new interior node, whose branch length is half the
/// shortest child distance, subtracted back out of each child so the total
/// path length to `attach_to` is preserved.
pub fn graft(tree: &mut Tree, attach_to: NodeId, placements: &[Placement], branch_length: impl Fn(&Placement) -> f64) {
    if placements.is_empty() {
        return;
    }

    if placements.len() == 1 {
        let p = &placements[0];
        tree.add_child(attach_to, p.title.clone(), branch_length(p));
        return;
    }

    let mut distances: Vec<f64> = placements.iter().map(&branch_length).collect();
    let shortest = distances.iter().cloned().fold(f64::INFINITY, f64::min).max(0.0);
    let branch_bl = shortest / 2.0;

    let branch = tree.add_child(attach_to, format!("{}_branch", tree.node(attach_to).title), branch_bl);
    for (p, dist) in placements.iter().zip(distances.drain(..)) {
        let adjusted = (dist - branch_bl).max(0.0);
        tree.add_child(branch, p.title.clone(), adjusted);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Node;
    use std::collections::HashMap;

    fn small_tree() -> Tree {
        let nodes = vec![Node {
            id: NodeId(0),
            title: "root".into(),
            parent: None,
            children: vec![],
            attrs: HashMap::new(),
            branch_length: 0.0,
        }];
        Tree::new(nodes)
    }

    #[test]
    fn jukes_cantor_matches_raw_at_zero_divergence() {
        assert_eq!(jukes_cantor_distance(0, 0, 100), 0.0);
    }

    #[test]
    fn jukes_cantor_exceeds_raw_proportion_for_moderate_divergence() {
        let jc = jukes_cantor_distance(10, 0, 100);
        let raw = raw_distance(10, 0, 100);
        assert!(jc > raw);
    }

    #[test]
    fn single_placement_grafts_as_direct_child() {
        let mut tree = small_tree();
        let placements = vec![Placement {
            title: "Query1".into(),
            attach_to: NodeId(0),
            diffs: 2,
            indels: 0,
            n_sites: 100,
            taxonomy: "Bacteria".into(),
        }];
        graft(&mut tree, NodeId(0), &placements, |p| raw_distance(p.diffs, p.indels, p.n_sites));
        tree.rebuild_orders();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.node(NodeId(1)).title, "Query1");
    }

    #[test]
    fn multiple_placements_share_a_new_interior_node() {
        let mut tree = small_tree();
        let placements = vec![
            Placement {
                title: "Query1".into(),
                attach_to: NodeId(0),
                diffs: 2,
                indels: 0,
                n_sites: 100,
                taxonomy: "Bacteria".into(),
            },
            Placement {
                title: "Query2".into(),
                attach_to: NodeId(0),
                diffs: 5,
                indels: 0,
                n_sites: 100,
                taxonomy: "Bacteria".into(),
            },
        ];
        graft(&mut tree, NodeId(0), &placements, |p| raw_distance(p.diffs, p.indels, p.n_sites));
        tree.rebuild_orders();
        assert_eq!(tree.len(), 4); // root, branch, Query1, Query2
        let branch_id = NodeId(1);
        assert_eq!(tree.node(branch_id).children.len(), 2);
    }

    #[test]
    fn inherited_taxonomy_walks_up_to_first_nonempty_ancestor() {
        let mut tree = small_tree();
        let child = tree.add_child(NodeId(0), "Child".into(), 0.1);
        tree.rebuild_orders();
        let mut taxonomy = HashMap::new();
        taxonomy.insert(NodeId(0), "Bacteria".to_string());
        taxonomy.insert(child, "".to_string());
        assert_eq!(inherited_taxonomy(&tree, child, &taxonomy), "Bacteria");
    }
}
