//! Lineage-prefix vote trie used to reconcile the taxonomies of several
//! best-scoring candidates into one consensus call (C7).

use std::collections::HashMap;

#[derive(Clone, Debug, Default)]
struct VoteNode {
    count: u32,
    children: HashMap<String, VoteNode>,
}

impl VoteNode {
    fn add(&mut self, rest: &[&str], votes: u32) {
        self.count += votes;
        if let Some((head, tail)) = rest.split_first() {
            self.children.entry((*head).to_string()).or_default().add(tail, votes);
        }
    }

    fn find_best(&self, thresh: u32, lineage: &str, out: &mut Vec<String>) {
        let mut n_qualifying = 0;
        for (name, child) in &self.children {
            if child.count < thresh {
                continue;
            }
            n_qualifying += 1;
            let my_lineage = if lineage.is_empty() {
                name.clone()
            } else {
                format!("{};{}", lineage, name)
            };
            child.find_best(thresh, &my_lineage, out);
        }
        if n_qualifying == 0 && !lineage.is_empty() {
            out.push(lineage.to_string());
        }
    }
}

/// Accumulates weighted votes over lineage strings, then descends the
/// resulting trie to find the longest lineages supported by at least a
/// given percentage of the votes cast at each rank.
#[derive(Clone, Debug, Default)]
pub struct VoteTrie {
    root: VoteNode,
}

impl VoteTrie {
    pub fn new() -> Self {
        VoteTrie::default()
    }

    pub fn add(&mut self, lineage: &str, votes: u32) {
        if lineage.is_empty() {
            return;
        }
        let parts: Vec<&str> = lineage.split(';').filter(|s| !s.is_empty()).collect();
        self.root.add(&parts, votes);
    }

    /// Longest lineage prefixes supported by at least `thresh_percent` of
    /// the total votes seen at each branch point in the trie.
    pub fn find_best(&self, thresh_percent: u32) -> Vec<String> {
        let thresh = self.root.count * thresh_percent / 100;
        let mut out = Vec::new();
        self.root.find_best(thresh, "", &mut out);
        out
    }
}

/// Converts a raw parsimony score into a vote weight: scores at or below
/// `threshold` get a share of 100 proportional to how far below threshold
/// they land; scores above threshold get none.
pub fn votes_for_score(score: u64, threshold: u64) -> u32 {
    if threshold == 0 || score > threshold {
        return 0;
    }
    (((threshold - score) * 100) / threshold) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn votes_for_score_scales_down_to_threshold() {
        assert_eq!(votes_for_score(0, 10), 100);
        assert_eq!(votes_for_score(10, 10), 0);
        assert_eq!(votes_for_score(5, 10), 50);
        assert_eq!(votes_for_score(11, 10), 0);
    }

    #[test]
    fn unanimous_votes_find_full_lineage() {
        let mut trie = VoteTrie::new();
        trie.add("Bacteria;Proteobacteria;Gammaproteobacteria", 100);
        trie.add("Bacteria;Proteobacteria;Gammaproteobacteria", 100);
        let best = trie.find_best(60);
        assert_eq!(best, vec!["Bacteria;Proteobacteria;Gammaproteobacteria".to_string()]);
    }

    #[test]
    fn disagreement_below_threshold_truncates_to_shared_prefix() {
        let mut trie = VoteTrie::new();
        trie.add("Bacteria;Proteobacteria", 80);
        trie.add("Bacteria;Firmicutes", 20);
        let best = trie.find_best(60);
        assert_eq!(best, vec!["Bacteria".to_string()]);
    }

    #[test]
    fn empty_trie_returns_no_candidates() {
        let trie = VoteTrie::new();
        assert!(trie.find_best(60).is_empty());
    }
}
