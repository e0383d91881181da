//! Per-position nucleotide-ambiguity bit sets (C1 of the design).

/// Segment size for [`ParsimonySet::build_segment_counts`]; must stay small
/// enough that a per-segment count saturates at a `u8`.
pub const SEGMENT_SIZE: usize = 16;

pub const BASE_A: u8 = 0x01;
pub const BASE_C: u8 = 0x02;
pub const BASE_G: u8 = 0x04;
pub const BASE_T: u8 = 0x08;

/// A fixed-length, bit-encoded ambiguity set: one nibble per alignment column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsimonySet {
    data: Vec<u8>,
    /// Index of the first non-zero position, or -1 if the set is empty.
    pub start: i64,
    /// Index of the last non-zero position, or `len` if the set is empty.
    pub end: i64,
    segment_counts: Vec<u8>,
}

impl ParsimonySet {
    pub fn empty(len: usize) -> Self {
        ParsimonySet {
            data: vec![0; len],
            start: -1,
            end: len as i64,
            segment_counts: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn segment_counts(&self) -> &[u8] {
        &self.segment_counts
    }

    /// Decode a sequence string into a parsimony set. Auto-detects a "bits"
    /// encoding (each character a hex nibble) when more than half of the
    /// characters are hex digits; otherwise decodes IUPAC nucleotide codes.
    pub fn from_sequence(seq: &str) -> Self {
        let chars: Vec<char> = seq.chars().collect();
        let hex_count = chars.iter().filter(|c| c.is_ascii_hexdigit()).count();
        let bits_encoding = hex_count > chars.len() / 2;

        let data: Vec<u8> = chars
            .iter()
            .map(|&c| {
                if bits_encoding {
                    decode_hex_nibble(c)
                } else {
                    decode_iupac(c)
                }
            })
            .collect();

        let mut set = ParsimonySet {
            data,
            start: -1,
            end: chars.len() as i64,
            segment_counts: Vec::new(),
        };
        set.set_ends();
        set
    }

    fn set_ends(&mut self) {
        self.start = -1;
        self.end = self.data.len() as i64;
        for (i, &v) in self.data.iter().enumerate() {
            if v != 0 {
                if self.start < 0 {
                    self.start = i as i64;
                }
                self.end = i as i64;
            }
        }
    }

    /// Bitwise OR with `other`, over the overlapping prefix; lazily allocates
    /// if this set is currently empty.
    pub fn union_with(&mut self, other: &ParsimonySet) {
        if other.is_empty() {
            return;
        }
        if self.is_empty() {
            self.data = vec![0; other.len()];
        }
        let n = self.len().min(other.len());
        for i in 0..n {
            self.data[i] |= other.data[i];
        }
        self.set_ends();
    }

    /// Bitwise AND with `other`; if this set is empty, adopts a copy of `other`.
    pub fn intersect_with(&mut self, other: &ParsimonySet) {
        if self.is_empty() {
            self.data = other.data.clone();
        } else {
            let n = self.len().min(other.len());
            for i in 0..n {
                self.data[i] &= other.data[i];
            }
        }
        self.set_ends();
    }

    /// Fitch `set`: for each position, take the intersection; where the
    /// intersection is empty but the union is not, adopt the union and count
    /// the position as a cost (this node required an extra parsimony step).
    /// Returns the number of such positions.
    pub fn set_from(&mut self, union_set: &ParsimonySet, intersect_set: &ParsimonySet) -> u64 {
        let len = union_set.len().min(intersect_set.len());
        if self.is_empty() {
            self.data = vec![0; union_set.len()];
        }
        let mut cost = 0;
        for i in 0..len.min(self.len()) {
            self.data[i] = intersect_set.data[i];
            if self.data[i] == 0 && union_set.data[i] != 0 {
                cost += 1;
                self.data[i] = union_set.data[i];
            }
        }
        self.set_ends();
        cost
    }

    /// Top-down refinement: replace each position with `parent & self` when
    /// that intersection is non-empty. Returns the number of positions
    /// changed.
    pub fn force(&mut self, parent: &ParsimonySet) -> u64 {
        let mut count = 0;
        let n = self.len().min(parent.len());
        for i in 0..n {
            let orig = self.data[i];
            let d = parent.data[i] & self.data[i];
            if d != 0 {
                self.data[i] = d;
            }
            if self.data[i] != orig {
                count += 1;
            }
        }
        count
    }

    /// Build the per-segment active-position counts under `mask` (a slice of
    /// the same length, non-zero selecting an active position).
    pub fn build_segment_counts(&mut self, mask: Option<&[u8]>) {
        let n_segments = (self.len() + SEGMENT_SIZE - 1) / SEGMENT_SIZE;
        let mut counts = vec![0u8; n_segments];
        for (seg, chunk) in self.data.chunks(SEGMENT_SIZE).enumerate() {
            let base = seg * SEGMENT_SIZE;
            let mut n = 0u32;
            for (k, &v) in chunk.iter().enumerate() {
                let active = match mask {
                    Some(m) => m.get(base + k).copied().unwrap_or(0) != 0,
                    None => true,
                };
                if active && v != 0 {
                    n += 1;
                }
            }
            counts[seg] = n.min(255) as u8;
        }
        self.segment_counts = counts;
    }

    /// Sum of absolute per-segment count differences over the active range
    /// `[ceil(start/S), ceil((end+1)/S))` of `self`. A conservative lower
    /// bound on the indel component of the cost between `self` and `other`.
    pub fn compare_segments(&self, other: &ParsimonySet) -> u64 {
        if self.start < 0 {
            return 0;
        }
        let s = (self.start as usize + SEGMENT_SIZE - 1) / SEGMENT_SIZE;
        let e = (self.end as usize + 1) / SEGMENT_SIZE;
        let n_seg = self.segment_counts.len().min(other.segment_counts.len());
        let mut indel = 0u64;
        for k in s..n_seg.min(e) {
            let a = self.segment_counts[k] as i64;
            let b = other.segment_counts[k] as i64;
            indel += (a - b).unsigned_abs();
        }
        indel
    }
}

fn decode_hex_nibble(c: char) -> u8 {
    c.to_digit(16).map(|v| v as u8).unwrap_or(0)
}

fn decode_iupac(c: char) -> u8 {
    match c.to_ascii_uppercase() {
        'A' => BASE_A,
        'C' => BASE_C,
        'G' => BASE_G,
        'T' | 'U' => BASE_T,
        'R' => BASE_A | BASE_G,
        'Y' => BASE_C | BASE_T,
        'K' => BASE_G | BASE_T,
        'M' => BASE_A | BASE_C,
        'S' => BASE_G | BASE_C,
        'W' => BASE_A | BASE_T,
        'B' => BASE_G | BASE_C | BASE_T,
        'D' => BASE_A | BASE_G | BASE_T,
        'H' => BASE_A | BASE_C | BASE_T,
        'V' => BASE_A | BASE_C | BASE_G,
        'N' => BASE_A | BASE_C | BASE_G | BASE_T,
        _ => 0, // X, '.', '-', and anything unrecognized decode to a gap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_plain_nucleotides() {
        let set = ParsimonySet::from_sequence("ACGT");
        assert_eq!(set.data(), &[BASE_A, BASE_C, BASE_G, BASE_T]);
        assert_eq!(set.start, 0);
        assert_eq!(set.end, 3);
    }

    #[test]
    fn decodes_ambiguity_codes() {
        let set = ParsimonySet::from_sequence("RYKMSWBDHVN");
        assert_eq!(
            set.data(),
            &[
                BASE_A | BASE_G,
                BASE_C | BASE_T,
                BASE_G | BASE_T,
                BASE_A | BASE_C,
                BASE_G | BASE_C,
                BASE_A | BASE_T,
                BASE_G | BASE_C | BASE_T,
                BASE_A | BASE_G | BASE_T,
                BASE_A | BASE_C | BASE_T,
                BASE_A | BASE_C | BASE_G,
                BASE_A | BASE_C | BASE_G | BASE_T,
            ]
        );
    }

    #[test]
    fn gap_characters_decode_to_zero_and_narrow_start_end() {
        let set = ParsimonySet::from_sequence("--AC--");
        assert_eq!(set.start, 2);
        assert_eq!(set.end, 3);
    }

    #[test]
    fn empty_sequence_has_start_minus_one_end_len() {
        let set = ParsimonySet::from_sequence("----");
        assert_eq!(set.start, -1);
        assert_eq!(set.end, 4);
    }

    #[test]
    fn bits_encoding_autodetected_when_majority_hex() {
        // "1248" are all hex digits -> more than half -> bits mode, nibble values taken directly
        let set = ParsimonySet::from_sequence("1248");
        assert_eq!(set.data(), &[1, 2, 4, 8]);
    }

    #[test]
    fn union_and_intersect() {
        let a = ParsimonySet::from_sequence("ACGT");
        let b = ParsimonySet::from_sequence("AGGT");
        let mut u = ParsimonySet::empty(0);
        u.union_with(&a);
        u.union_with(&b);
        assert_eq!(u.data(), &[BASE_A, BASE_C | BASE_G, BASE_G, BASE_T]);

        let mut i = ParsimonySet::empty(0);
        i.intersect_with(&a);
        i.intersect_with(&b);
        assert_eq!(i.data(), &[BASE_A, 0, BASE_G, BASE_T]);
    }

    #[test]
    fn set_from_adopts_union_when_intersection_empty_and_counts_cost() {
        let a = ParsimonySet::from_sequence("AC");
        let b = ParsimonySet::from_sequence("AG");
        let mut union = ParsimonySet::empty(0);
        union.union_with(&a);
        union.union_with(&b);
        let mut intersect = ParsimonySet::empty(0);
        intersect.intersect_with(&a);
        intersect.intersect_with(&b);

        let mut node = ParsimonySet::empty(2);
        let cost = node.set_from(&union, &intersect);
        assert_eq!(cost, 1); // position 1: C vs G disagree, union adopted
        assert_eq!(node.data()[0], BASE_A);
        assert_eq!(node.data()[1], BASE_C | BASE_G);
    }

    #[test]
    fn force_collapses_toward_parent_when_intersection_nonempty() {
        let parent = ParsimonySet::from_sequence("A");
        let mut child = ParsimonySet::from_sequence("R"); // A|G
        let changed = child.force(&parent);
        assert_eq!(changed, 1);
        assert_eq!(child.data()[0], BASE_A);
    }

    #[test]
    fn force_keeps_ambiguity_when_intersection_empty() {
        let parent = ParsimonySet::from_sequence("C");
        let mut child = ParsimonySet::from_sequence("R"); // A|G, disjoint from C
        let changed = child.force(&parent);
        assert_eq!(changed, 0);
        assert_eq!(child.data()[0], BASE_A | BASE_G);
    }

    #[test]
    fn segment_counts_respect_mask_and_saturate() {
        let mut set = ParsimonySet::from_sequence(&"A".repeat(300));
        set.build_segment_counts(None);
        assert_eq!(set.segment_counts().len(), (300 + SEGMENT_SIZE - 1) / SEGMENT_SIZE);
        assert_eq!(set.segment_counts()[0], 255.min(SEGMENT_SIZE) as u8);

        let mask = vec![0u8; 300];
        let mut masked = ParsimonySet::from_sequence(&"A".repeat(300));
        masked.build_segment_counts(Some(&mask));
        assert!(masked.segment_counts().iter().all(|&c| c == 0));
    }

    #[test]
    fn compare_segments_bounds_indel_component() {
        let mut a = ParsimonySet::from_sequence(&("A".repeat(32) + &"-".repeat(32)));
        let mut b = ParsimonySet::from_sequence(&"A".repeat(64));
        a.build_segment_counts(None);
        b.build_segment_counts(None);
        let bound = a.compare_segments(&b);
        assert!(bound > 0);
    }
}
