pub mod ancestor;
pub mod collector;
pub mod cost;
pub mod eval;
pub mod insert;
pub mod parsimony_set;
pub mod search;
pub mod taxonomy;
pub mod tree;
pub mod vote;

pub use ancestor::{infer, refine, AncestorStore};
pub use collector::{BestEntry, BestKCollector};
pub use cost::{score, score_gated, CostOutcome};
pub use eval::{Evaluation, RankCounts};
pub use insert::{graft, inherited_taxonomy, jukes_cantor_distance, raw_distance, Placement};
pub use parsimony_set::ParsimonySet;
pub use search::{full_scan, pruned_descent, SearchParams};
pub use taxonomy::{assign_internal_taxonomy, parse_lineage, TaxonomyStore, TaxonomyTable};
pub use tree::{Node, NodeId, Tree};
pub use vote::{votes_for_score, VoteTrie};

/// A per-position active/inactive mask (non-zero selects an active column);
/// `cost::score` and `ParsimonySet::build_segment_counts` both key off it.
pub type Mask = Vec<u8>;
