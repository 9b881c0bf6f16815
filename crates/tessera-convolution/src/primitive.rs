//! Forward-convolution primitive: init-time validation and kernel selection,
//! then the per-tile dispatch loop.
//!
//! The work space is `(batch, group, oc-tile, output row)`, flattened and
//! split across workers in balanced contiguous ranges. The input-channel
//! loop runs outermost within each worker, in stepped chunks, so a chunk's
//! weights stay hot across the worker's whole tile range. Kernel argument
//! records carry pre-shifted pointers, clipped tap counts and the
//! first/last-pass flags; all fallible checks complete before the fork.

use tessera_common::{balance, parallel, NdIndexer};
use tessera_core::{
    ArgId, Engine, ExecContext, ExecError, FormattedSetupError, IsaLevel, SetupError, TensorDesc,
    WeightsDesc,
};

use crate::config::ConvConfig;
use crate::halo::{width_is_uniform, SpatialHalo};
use crate::kernel::{BinaryOperands, ConvKernel, ConvKernelArgs, FLAG_FIRST_IC, FLAG_LAST_IC};
use crate::problem::ConvProblem;
use crate::reference::ReferenceConvKernel;

fn select_kernel(isa: IsaLevel, cfg: &ConvConfig) -> Box<dyn ConvKernel> {
    log::trace!("conv kernel: portable scalar (engine isa {isa:?})");
    Box::new(ReferenceConvKernel::new(cfg.clone()))
}

fn check_width_capability(kernel: &dyn ConvKernel, cfg: &ConvConfig) -> Result<(), SetupError> {
    if !kernel.handles_w_padding()
        && !width_is_uniform(cfg.ow, cfg.stride_w, cfg.l_pad, cfg.dilate_w, cfg.kw, cfg.iw)
    {
        return Err(FormattedSetupError::new(|| {
            "width windows need clipping but the kernel cannot mask the boundary".to_string()
        })
        .into());
    }
    Ok(())
}

/// Forward convolution over blocked or channel-last activations.
pub struct ConvolutionFwd {
    cfg: ConvConfig,
    src_d: TensorDesc,
    wei_d: WeightsDesc,
    dst_d: TensorDesc,
    kernel: Box<dyn ConvKernel>,
}

impl ConvolutionFwd {
    pub fn init(engine: &Engine, problem: &ConvProblem) -> Result<Self, SetupError> {
        let cfg = ConvConfig::setup(engine, problem)?;
        let kernel = select_kernel(engine.isa(), &cfg);
        check_width_capability(kernel.as_ref(), &cfg)?;
        Ok(Self {
            cfg,
            src_d: problem.src,
            wei_d: problem.weights,
            dst_d: problem.dst,
            kernel,
        })
    }

    pub fn execute_forward(&self, ctx: &ExecContext<'_>) -> Result<(), ExecError> {
        let cfg = &self.cfg;
        let dt = self.dst_d.dtype.size();

        let src = ctx.input(ArgId::Src, self.src_d.size_bytes())?;
        let weights = ctx.input(ArgId::Weights, self.wei_d.size_bytes())?;
        let bias = if cfg.with_bias {
            Some(ctx.input(ArgId::Bias, cfg.ngroups * cfg.oc * dt)?)
        } else {
            None
        };
        let dst = ctx.output(ArgId::Dst, self.dst_d.size_bytes())?;

        let mut operand_slices = Vec::with_capacity(cfg.binary_operands as usize);
        for op in 0..cfg.binary_operands {
            operand_slices.push(ctx.input(ArgId::BinaryOperand(op), self.dst_d.c * dt)?);
        }
        let operands = BinaryOperands::new(&operand_slices);

        let ocb_work = cfg.ocb_work();
        let work_amount = cfg.mb * cfg.ngroups * ocb_work * cfg.oh;
        let nthr = cfg.nthr.min(work_amount);
        log::trace!("conv dispatch: work={work_amount} threads={nthr}");

        let kw_padding = if self.kernel.handles_w_padding() {
            0
        } else {
            cfg.kw
        };

        parallel(nthr, |ithr, nthr| {
            let range = balance(work_amount, nthr, ithr);
            if range.is_empty() {
                return;
            }
            let indexer = NdIndexer::new([cfg.mb, cfg.ngroups, ocb_work, cfg.oh]);

            let mut icbb = 0;
            while icbb < cfg.nb_ic {
                let rem = cfg.nb_ic - icbb;
                let icb_step = if rem < cfg.nb_ic_blocking_max {
                    rem
                } else {
                    cfg.nb_ic_blocking
                };

                let mut coords = indexer.decode(range.start);
                for _ in range.clone() {
                    let [n, g, ocbb, oh] = coords;
                    let ocb = ocbb * cfg.nb_oc_blocking;
                    let oc_blocks = (ocb + cfg.nb_oc_blocking).min(cfg.nb_oc) - ocb;
                    let oc_work = (oc_blocks * cfg.oc_block).min(cfg.oc - ocb * cfg.oc_block);

                    let halo = SpatialHalo::resolve(
                        oh,
                        cfg.stride_h,
                        cfg.t_pad,
                        cfg.dilate_h,
                        cfg.kh,
                        cfg.ih,
                    );
                    let oc_chan = g * cfg.oc + ocb * cfg.oc_block;
                    let dst_off = self.dst_d.offset_bytes(n, oc_chan, 0, oh, 0);

                    // A row whose window is entirely implied trailing padding
                    // has no valid taps; clamp so its addresses stay in range.
                    let ih_start = halo.input_start.min(cfg.ih - 1);
                    let kh_start = halo.first_valid_tap.min(cfg.kh - 1);

                    for icb in icbb..icbb + icb_step {
                        let ic_chan = g * cfg.ic + icb * cfg.ic_block;
                        let src_off = self.src_d.offset_bytes(n, ic_chan, 0, ih_start, 0);
                        let wei_g = if self.wei_d.with_groups { g } else { 0 };
                        let wei_off = self.wei_d.offset(wei_g, ocb, icb, 0, kh_start, 0)
                            * self.wei_d.dtype.size();

                        let mut flags = 0;
                        let mut bias_ptr = core::ptr::null();
                        if icb == 0 {
                            flags |= FLAG_FIRST_IC;
                            if let Some(bias) = bias {
                                bias_ptr = bias[oc_chan * dt..].as_ptr();
                            }
                        }
                        if (cfg.with_eltwise || cfg.binary_operands > 0) && icb + 1 == cfg.nb_ic
                        {
                            flags |= FLAG_LAST_IC;
                        }

                        let args = ConvKernelArgs {
                            src: src[src_off..].as_ptr(),
                            dst: unsafe { dst.as_mut_ptr().add(dst_off) },
                            weights: weights[wei_off..].as_ptr(),
                            bias: bias_ptr,
                            post_op_operands: operands.as_ptr(),
                            dst_orig: dst.as_mut_ptr(),
                            kh_padding: halo.valid_taps,
                            kw_padding,
                            oc_blocks,
                            oc_work,
                            flags,
                        };
                        unsafe { self.kernel.invoke(&args) };
                    }
                    indexer.step(&mut coords);
                }
                icbb += icb_step;
            }
        });

        // Kernels leave the padded channel tail untouched.
        if self.dst_d.padded_c() != self.dst_d.c {
            let out =
                unsafe { std::slice::from_raw_parts_mut(dst.as_mut_ptr(), self.dst_d.size_bytes()) };
            self.dst_d.zero_pad_tail(out);
        }
        Ok(())
    }
}
