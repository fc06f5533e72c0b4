// Weak-sum lookup index over signature records.
//
// Groups block indices by weak sum, preserving block order within each
// bucket so candidates are probed in the order the base recorded them.
// Every record is indexed, including the short tail block; a full-length
// window can never confirm against the tail's strong sum, which is what
// restricts matching to full blocks.

use std::collections::HashMap;

use super::Signature;

/// Maps a weak sum to the block indices that produced it.
#[derive(Debug, Default)]
pub struct WeakSumIndex {
    buckets: HashMap<u32, Vec<usize>>,
}

impl WeakSumIndex {
    /// Build the index from a signature's records.
    pub fn build(sig: &Signature) -> Self {
        let mut buckets: HashMap<u32, Vec<usize>> = HashMap::with_capacity(sig.block_count());
        for (index, &weak) in sig.weak_sums().iter().enumerate() {
            buckets.entry(weak).or_default().push(index);
        }
        Self { buckets }
    }

    /// Block indices recorded under `weak`, in insertion order.
    pub fn candidates(&self, weak: u32) -> &[usize] {
        self.buckets.get(&weak).map_or(&[], Vec::as_slice)
    }

    /// Number of distinct weak sums.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::SignatureOptions;

    fn sig_for(base: &[u8], block_len: u32) -> Signature {
        Signature::generate(
            base,
            &SignatureOptions {
                block_len,
                strong_len: 8,
            },
        )
        .unwrap()
    }

    #[test]
    fn missing_weak_sum_has_no_candidates() {
        let sig = sig_for(b"abcdefgh", 4);
        let index = WeakSumIndex::build(&sig);
        assert!(index.candidates(0xDEAD_BEEF).is_empty());
    }

    #[test]
    fn duplicate_blocks_share_a_bucket_in_order() {
        // Blocks: "aaaa", "bbbb", "aaaa", "aa" — first and third collide.
        let sig = sig_for(b"aaaabbbbaaaaaa", 4);
        let index = WeakSumIndex::build(&sig);
        assert_eq!(index.candidates(sig.weak_sum(0)), &[0, 2]);
        assert_eq!(index.candidates(sig.weak_sum(1)), &[1]);
    }

    #[test]
    fn tail_block_is_indexed() {
        let sig = sig_for(b"aaaabbbbcc", 4);
        let index = WeakSumIndex::build(&sig);
        assert_eq!(index.candidates(sig.weak_sum(2)), &[2]);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn empty_signature_builds_empty_index() {
        let sig = sig_for(b"", 4);
        let index = WeakSumIndex::build(&sig);
        assert!(index.is_empty());
    }
}
