//! Channel-shuffle primitive: init-time validation, offset-table precompute
//! and kernel selection, then the per-tile dispatch loop.
//!
//! The work space is `(batch, spatial split, channel block)`, walked by
//! `parallel_nd`. Tiles write pairwise disjoint destination ranges; the
//! offset table is immutable after init and shared read-only with every
//! worker. All fallible checks complete before the fork.

use tessera_common::parallel_nd;
use tessera_core::{ArgId, Engine, ExecContext, ExecError, IsaLevel, SetupError, TensorDesc};

use crate::config::ShuffleConfig;
use crate::kernel::{ShuffleKernel, ShuffleKernelArgs};
use crate::problem::ShuffleProblem;
use crate::reference::ReferenceShuffleKernel;
use crate::table::OffsetTable;

fn select_kernel(isa: IsaLevel, cfg: &ShuffleConfig) -> Box<dyn ShuffleKernel> {
    log::trace!(
        "shuffle kernel: portable scalar, {} lanes (engine isa {isa:?})",
        cfg.simd_w
    );
    Box::new(ReferenceShuffleKernel::new(cfg.clone()))
}

/// Channel shuffle over blocked activations.
pub struct ChannelShuffle {
    cfg: ShuffleConfig,
    desc: TensorDesc,
    table: OffsetTable,
    kernel: Box<dyn ShuffleKernel>,
}

impl ChannelShuffle {
    pub fn init(engine: &Engine, problem: &ShuffleProblem) -> Result<Self, SetupError> {
        let cfg = ShuffleConfig::setup(engine, problem)?;
        let table = OffsetTable::build(&cfg, problem.params.direction);
        let kernel = select_kernel(engine.isa(), &cfg);
        Ok(Self {
            cfg,
            desc: problem.src,
            table,
            kernel,
        })
    }

    pub fn execute(&self, ctx: &ExecContext<'_>) -> Result<(), ExecError> {
        let cfg = &self.cfg;
        let dt = cfg.dtype.size();
        let src = ctx.input(ArgId::Src, self.desc.size_bytes())?;
        let dst = ctx.output(ArgId::Dst, self.desc.size_bytes())?;

        let cb_count = cfg.cb_count();
        let spb_count = cfg.spb_count();
        log::trace!(
            "shuffle dispatch: tiles={}x{}x{} threads={}",
            cfg.mb,
            spb_count,
            cb_count,
            cfg.nthr
        );

        parallel_nd(cfg.nthr, [cfg.mb, spb_count, cb_count], |[mb, spb, cb]| {
            let c_curr = cb * cfg.c_split;
            let c_work = cfg.c_split.min(cfg.c - c_curr);
            let sp_curr = spb * cfg.sp_split;
            let off = mb * cfg.stride_mb + sp_curr * cfg.blk_size;

            let args = ShuffleKernelArgs {
                src: src[off * dt..].as_ptr(),
                dst: unsafe { dst.as_mut_ptr().add((off + cfg.sp * c_curr) * dt) },
                input_off: self.table.at(c_curr),
                channel_count: c_work,
                is_tail_block: cb + 1 == cb_count,
            };
            unsafe { self.kernel.invoke(&args) };
        });

        // Kernels leave the padded channel tail untouched.
        if self.desc.padded_c() != self.desc.c {
            let out = unsafe {
                std::slice::from_raw_parts_mut(dst.as_mut_ptr(), self.desc.size_bytes())
            };
            self.desc.zero_pad_tail(out);
        }
        Ok(())
    }
}
