//! Problem validation and split configuration for channel shuffle.

use serde::{Deserialize, Serialize};
use tessera_common::math::gcd;
use tessera_core::{
    ArgId, DataType, Engine, FormattedSetupError, IsaLevel, LayoutKind, SetupError,
    UnsupportedError,
};

use crate::problem::ShuffleProblem;

/// Vector widths are counted in 4-byte lanes, whatever the element type.
const LANE_BYTES: usize = core::mem::size_of::<f32>();

/// Resolved shape and tiling of one shuffle primitive, fixed at init and
/// shared read-only with the kernel and the dispatch loop.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShuffleConfig {
    pub mb: usize,
    pub c: usize,
    /// Spatial product `d * h * w`.
    pub sp: usize,
    pub blk_size: usize,
    /// Kernel vector width in 4-byte lanes.
    pub simd_w: usize,
    pub simd_tail: usize,
    /// Channels per tile; one channel block.
    pub c_split: usize,
    /// Spatial points per tile.
    pub sp_split: usize,
    pub group_size: usize,
    /// Batch stride in elements, over the padded channel extent.
    pub stride_mb: usize,
    pub dtype: DataType,
    pub nthr: usize,
}

impl ShuffleConfig {
    /// Validates `problem` and resolves the tiling. The source and
    /// destination must share one blocked descriptor; the spatial split
    /// widens with the thread count when channels alone cannot feed it.
    pub fn setup(engine: &Engine, problem: &ShuffleProblem) -> Result<Self, SetupError> {
        let src = &problem.src;
        let dst = &problem.dst;
        let params = &problem.params;
        let dtype = src.dtype;

        if !matches!(dtype, DataType::F32 | DataType::S32 | DataType::Bf16) {
            return Err(UnsupportedError::DataType {
                dtype,
                op: "channel shuffle",
            }
            .into());
        }
        if src.dtype != dst.dtype {
            let (sd, dd) = (src.dtype, dst.dtype);
            return Err(FormattedSetupError::new(move || {
                format!("source and destination types differ: {sd:?} vs {dd:?}")
            })
            .into());
        }
        if dtype == DataType::Bf16 && engine.isa() < IsaLevel::Avx512 {
            return Err(UnsupportedError::Isa {
                isa: engine.isa(),
                dtype,
            }
            .into());
        }
        if params.axis != 1 {
            return Err(UnsupportedError::ShuffleAxis { axis: params.axis }.into());
        }
        if src != dst {
            return Err(FormattedSetupError::new(|| {
                "source and destination descriptors must match".to_string()
            })
            .into());
        }

        let blk_size = match src.layout {
            LayoutKind::Blocked { block } if matches!(block, 4 | 8 | 16) => block,
            layout => {
                return Err(UnsupportedError::Layout {
                    layout,
                    arg: ArgId::Src,
                }
                .into())
            }
        };

        let group_size = params.group_size;
        if group_size == 0 || src.c % group_size != 0 {
            let c = src.c;
            return Err(FormattedSetupError::new(move || {
                format!("group size {group_size} does not divide {c} channels")
            })
            .into());
        }
        if src.n == 0 || src.c == 0 || src.spatial_size() == 0 {
            return Err(
                FormattedSetupError::new(|| "every extent must be at least 1".to_string()).into(),
            );
        }

        let simd_w = if dtype == DataType::Bf16 {
            // bf16 kernels run on the 16-lane level only.
            IsaLevel::Avx512.vlen() / LANE_BYTES
        } else {
            [IsaLevel::Avx512, IsaLevel::Avx2, IsaLevel::Sse41]
                .into_iter()
                .filter(|level| *level <= engine.isa())
                .map(|level| level.vlen() / LANE_BYTES)
                .find(|w| *w <= blk_size)
                .unwrap_or(1)
        };
        if simd_w > blk_size {
            return Err(UnsupportedError::VectorWidth {
                simd_w,
                block: blk_size,
            }
            .into());
        }

        let sp = src.spatial_size();
        let nthr = engine.nthr();
        let sp_split = if (src.c as f64) < (sp as f64).sqrt() {
            sp / gcd(sp, nthr)
        } else {
            sp
        };

        let cfg = Self {
            mb: src.n,
            c: src.c,
            sp,
            blk_size,
            simd_w,
            simd_tail: src.c % simd_w,
            c_split: blk_size,
            sp_split,
            group_size,
            stride_mb: src.padded_c() * sp,
            dtype,
            nthr,
        };
        log::debug!(
            "shuffle config: mb={} c={} sp={} block={} simd_w={} splits c={} sp={}",
            cfg.mb,
            cfg.c,
            cfg.sp,
            cfg.blk_size,
            cfg.simd_w,
            cfg.c_split,
            cfg.sp_split,
        );
        Ok(cfg)
    }

    /// Channel-block tiles; the last may be under-full.
    #[inline]
    pub fn cb_count(&self) -> usize {
        self.c.div_ceil(self.c_split)
    }

    /// Spatial tiles; `sp_split` divides `sp` by construction.
    #[inline]
    pub fn spb_count(&self) -> usize {
        self.sp / self.sp_split
    }
}
