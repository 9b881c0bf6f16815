//! Precomputed channel-permutation offsets.
//!
//! A shuffle with `G` groups over `C` channels is a transpose of the
//! `G x (C / G)` channel matrix. The table folds that transpose into the
//! blocked layout: entry `c` is the source byte offset of output channel `c`
//! relative to the batch-and-spatial base the dispatch loop hands the
//! kernel. Within one channel block the entries land in consecutive output
//! lanes, so a kernel walks them linearly.

use crate::config::ShuffleConfig;
use crate::problem::ShuffleDirection;

/// Per-channel source offsets, built once at init and read concurrently.
pub struct OffsetTable {
    offsets: Vec<u32>,
}

impl OffsetTable {
    pub fn build(cfg: &ShuffleConfig, direction: ShuffleDirection) -> Self {
        let c = cfg.c;
        let per_group = c / cfg.group_size;
        let (row, col) = match direction {
            ShuffleDirection::Forward => (cfg.group_size, per_group),
            ShuffleDirection::Backward => (per_group, cfg.group_size),
        };

        let mut transposed = vec![0usize; c];
        for i in 0..col {
            for j in 0..row {
                transposed[j * col + i] = i * row + j;
            }
        }

        let blk = cfg.blk_size;
        let dt = cfg.dtype.size();
        let offsets = transposed
            .into_iter()
            .map(|src_c| ((src_c / blk * cfg.sp * blk + src_c % blk) * dt) as u32)
            .collect();
        Self { offsets }
    }

    /// Sub-table starting at channel `c_curr`.
    #[inline]
    pub fn at(&self, c_curr: usize) -> *const u32 {
        self.offsets[c_curr..].as_ptr()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    #[cfg(test)]
    fn entries(&self) -> &[u32] {
        &self.offsets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tessera_core::DataType;

    fn config(c: usize, blk_size: usize, sp: usize, group_size: usize) -> ShuffleConfig {
        ShuffleConfig {
            mb: 1,
            c,
            sp,
            blk_size,
            simd_w: 1,
            simd_tail: 0,
            c_split: blk_size,
            sp_split: sp,
            group_size,
            stride_mb: c.div_ceil(blk_size) * blk_size * sp,
            dtype: DataType::F32,
            nthr: 1,
        }
    }

    /// Recovers the source channel a table entry points at.
    fn source_channel(entry: u32, cfg: &ShuffleConfig) -> usize {
        let elems = entry as usize / cfg.dtype.size();
        let span = cfg.sp * cfg.blk_size;
        (elems / span) * cfg.blk_size + elems % span
    }

    #[test]
    fn eight_channels_in_two_groups_interleave() {
        let cfg = config(8, 8, 1, 2);
        let table = OffsetTable::build(&cfg, ShuffleDirection::Forward);
        // With one spatial point and one block, entries are channel * dt.
        let channels: Vec<u32> = table.entries().iter().map(|&e| e / 4).collect();
        assert_eq!(channels, vec![0, 2, 4, 6, 1, 3, 5, 7]);
    }

    #[test]
    fn the_permutation_is_a_bijection() {
        for (c, blk, group) in [(16, 8, 4), (12, 4, 3), (32, 16, 2), (24, 8, 24)] {
            let cfg = config(c, blk, 6, group);
            let table = OffsetTable::build(&cfg, ShuffleDirection::Forward);
            let mut sources: Vec<usize> = table
                .entries()
                .iter()
                .map(|&e| source_channel(e, &cfg))
                .collect();
            sources.sort_unstable();
            let identity: Vec<usize> = (0..c).collect();
            assert_eq!(sources, identity, "c={c} blk={blk} group={group}");
        }
    }

    #[test]
    fn backward_inverts_forward() {
        let cfg = config(24, 8, 3, 4);
        let fwd = OffsetTable::build(&cfg, ShuffleDirection::Forward);
        let bwd = OffsetTable::build(&cfg, ShuffleDirection::Backward);
        let fwd_map: Vec<usize> = fwd
            .entries()
            .iter()
            .map(|&e| source_channel(e, &cfg))
            .collect();
        let bwd_map: Vec<usize> = bwd
            .entries()
            .iter()
            .map(|&e| source_channel(e, &cfg))
            .collect();
        for channel in 0..cfg.c {
            assert_eq!(fwd_map[bwd_map[channel]], channel);
        }
    }

    #[test]
    fn entries_stay_inside_one_batch() {
        let cfg = config(20, 8, 9, 5);
        let table = OffsetTable::build(&cfg, ShuffleDirection::Forward);
        assert_eq!(table.len(), 20);
        let batch_bytes = (cfg.stride_mb * cfg.dtype.size()) as u32;
        assert!(table.entries().iter().all(|&e| e < batch_bytes));
    }
}
