//! Weighted comparison of two parsimony sets (C3 of the design).

use crate::parsimony_set::ParsimonySet;
use crate::Mask;
use itertools::izip;

/// `diffs + indels + partials/4`, rounded down per the spec's integer
/// division, at a sentinel "exceeded threshold" represented as `None`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CostOutcome {
    pub diffs: u64,
    pub partials: u64,
    pub indels: u64,
}

impl CostOutcome {
    pub fn score(&self) -> u64 {
        self.diffs + self.indels + self.partials / 4
    }
}

/// Per-position reference cost form. `query` supplies the `[start, end]`
/// window that gates whether a gap-on-one-side position counts as an indel.
/// Returns `None` once the running score exceeds `threshold`.
pub fn score(query: &ParsimonySet, node: &ParsimonySet, mask: &Mask, threshold: u64) -> Option<CostOutcome> {
    let qdata = query.data();
    let ndata = node.data();

    let mut diffs = 0u64;
    let mut partials = 0u64;
    let mut indels = 0u64;

    for (i, (&q, &n, &m)) in izip!(qdata, ndata, mask).enumerate() {
        if m == 0 {
            continue;
        }
        if q == n {
            continue;
        }
        if (q & n) != 0 {
            partials += 1;
        } else if q != 0 && n != 0 {
            diffs += 1;
        } else if (i as i64) >= query.start && (i as i64) <= query.end {
            indels += 1;
        }

        if diffs + indels + partials / 4 > threshold {
            return None;
        }
    }

    Some(CostOutcome {
        diffs,
        partials,
        indels,
    })
}

/// Segment-count-gated cost form: first checks [`ParsimonySet::compare_segments`]
/// as a cheap lower bound on the indel component; if that bound already
/// exceeds `threshold`, short-circuits without scanning positions. Otherwise
/// behaviourally identical to [`score`].
pub fn score_gated(query: &ParsimonySet, node: &ParsimonySet, mask: &Mask, threshold: u64) -> Option<CostOutcome> {
    if !query.segment_counts().is_empty() && !node.segment_counts().is_empty() {
        let bound = query.compare_segments(node);
        if bound > threshold {
            return None;
        }
    }
    score(query, node, mask, threshold)
}
