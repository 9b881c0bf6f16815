//! Portable scalar kernel; the fallback when no vectorized one applies.

use crate::config::ShuffleConfig;
use crate::kernel::{ShuffleKernel, ShuffleKernelArgs};

/// Scalar kernel correct for every configuration the setup accepts.
///
/// Element-type agnostic: table entries are byte offsets and every move
/// copies one element's bytes.
pub struct ReferenceShuffleKernel {
    cfg: ShuffleConfig,
}

impl ReferenceShuffleKernel {
    pub fn new(cfg: ShuffleConfig) -> Self {
        Self { cfg }
    }
}

impl ShuffleKernel for ReferenceShuffleKernel {
    unsafe fn invoke(&self, args: &ShuffleKernelArgs) {
        let cfg = &self.cfg;
        let dt = cfg.dtype.size();
        for sp in 0..cfg.sp_split {
            let row = sp * cfg.blk_size;
            for cc in 0..args.channel_count {
                let src = args.src.add(*args.input_off.add(cc) as usize + row * dt);
                let dst = args.dst.add((row + cc) * dt);
                core::ptr::copy_nonoverlapping(src, dst, dt);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::DataType;

    fn config() -> ShuffleConfig {
        ShuffleConfig {
            mb: 1,
            c: 4,
            sp: 2,
            blk_size: 4,
            simd_w: 1,
            simd_tail: 0,
            c_split: 4,
            sp_split: 2,
            group_size: 2,
            stride_mb: 8,
            dtype: DataType::F32,
            nthr: 1,
        }
    }

    #[test]
    fn moves_lanes_through_the_offset_table() {
        // One block, so a channel's offset at spatial point 0 is channel * dt.
        let table: Vec<u32> = [2u32, 3, 0, 1].iter().map(|&c| c * 4).collect();
        let src: Vec<f32> = (0..8).map(|v| v as f32).collect();
        let mut dst = vec![0.0f32; 8];

        let kernel = ReferenceShuffleKernel::new(config());
        let args = ShuffleKernelArgs {
            src: src.as_ptr() as *const u8,
            dst: dst.as_mut_ptr() as *mut u8,
            input_off: table.as_ptr(),
            channel_count: 4,
            is_tail_block: false,
        };
        unsafe { kernel.invoke(&args) };

        assert_eq!(dst, vec![2.0, 3.0, 0.0, 1.0, 6.0, 7.0, 4.0, 5.0]);
    }

    #[test]
    fn a_short_block_leaves_trailing_lanes_alone() {
        let table: Vec<u32> = vec![4, 0];
        let src: Vec<f32> = (0..8).map(|v| v as f32).collect();
        let mut dst = vec![-1.0f32; 8];

        let kernel = ReferenceShuffleKernel::new(config());
        let args = ShuffleKernelArgs {
            src: src.as_ptr() as *const u8,
            dst: dst.as_mut_ptr() as *mut u8,
            input_off: table.as_ptr(),
            channel_count: 2,
            is_tail_block: true,
        };
        unsafe { kernel.invoke(&args) };

        assert_eq!(dst, vec![1.0, 0.0, -1.0, -1.0, 5.0, 4.0, -1.0, -1.0]);
    }
}
