//! Mixed-radix mapping between linear work indices and coordinate tuples.

/// Row-major indexer over a fixed list of extents; the last extent varies
/// fastest.
///
/// Linear index `i` and coordinate tuple `t` are related by the usual
/// mixed-radix expansion, so `decode` runs in O(K) while `step` advances to
/// the tuple of `i + 1` in O(1) amortized by carrying overflow from the
/// fastest dimension leftward.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NdIndexer<const K: usize> {
    extents: [usize; K],
}

impl<const K: usize> NdIndexer<K> {
    pub fn new(extents: [usize; K]) -> Self {
        Self { extents }
    }

    /// Total number of coordinate tuples.
    #[inline]
    pub fn len(&self) -> usize {
        self.extents.iter().product()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decodes a linear index into its coordinate tuple.
    #[inline]
    pub fn decode(&self, mut linear: usize) -> [usize; K] {
        debug_assert!(linear < self.len());
        let mut coords = [0; K];
        for i in (0..K).rev() {
            coords[i] = linear % self.extents[i];
            linear /= self.extents[i];
        }
        coords
    }

    /// Inverse of [`decode`](Self::decode).
    #[inline]
    pub fn linearize(&self, coords: &[usize; K]) -> usize {
        let mut linear = 0;
        for i in 0..K {
            debug_assert!(coords[i] < self.extents[i]);
            linear = linear * self.extents[i] + coords[i];
        }
        linear
    }

    /// Advances `coords` to the immediately following tuple; the tuple after
    /// the last one wraps back to all zeros.
    #[inline]
    pub fn step(&self, coords: &mut [usize; K]) {
        for i in (0..K).rev() {
            coords[i] += 1;
            if coords[i] < self.extents[i] {
                return;
            }
            coords[i] = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;

    #[test]
    fn round_trips_every_index() {
        let indexer = NdIndexer::new([2, 3, 4]);
        for linear in 0..indexer.len() {
            assert_eq!(indexer.linearize(&indexer.decode(linear)), linear);
        }
    }

    #[test]
    fn decode_matches_row_major_order() {
        let indexer = NdIndexer::new([2, 3]);
        assert_eq!(indexer.decode(0), [0, 0]);
        assert_eq!(indexer.decode(1), [0, 1]);
        assert_eq!(indexer.decode(2), [0, 2]);
        assert_eq!(indexer.decode(3), [1, 0]);
        assert_eq!(indexer.decode(5), [1, 2]);
    }

    #[test]
    fn step_agrees_with_decode() {
        let indexer = NdIndexer::new([3, 1, 5, 2]);
        let mut coords = indexer.decode(0);
        for linear in 0..indexer.len() {
            assert_eq!(coords, indexer.decode(linear), "at linear={linear}");
            indexer.step(&mut coords);
        }
        // Wrapped around after the last tuple.
        assert_eq!(coords, [0, 0, 0, 0]);
    }

    #[test]
    fn random_extents_round_trip() {
        let mut rng = StdRng::seed_from_u64(0x7e55e4a);
        for _ in 0..50 {
            let extents = [
                rng.gen_range(1..6),
                rng.gen_range(1..6),
                rng.gen_range(1..6),
            ];
            let indexer = NdIndexer::new(extents);
            let mut coords = indexer.decode(0);
            for linear in 0..indexer.len() {
                assert_eq!(indexer.linearize(&coords), linear);
                indexer.step(&mut coords);
            }
        }
    }

    #[test]
    fn unit_extent_dimensions_are_transparent() {
        let indexer = NdIndexer::new([1, 4, 1]);
        assert_eq!(indexer.len(), 4);
        assert_eq!(indexer.decode(3), [0, 3, 0]);
    }
}
