//! Portable scalar kernel; the fallback when no vectorized one applies.

use tessera_core::LayoutKind;

use crate::config::ConvConfig;
use crate::kernel::{ConvKernel, ConvKernelArgs, FLAG_FIRST_IC, FLAG_LAST_IC};

/// Scalar f32 kernel correct for every configuration the setup accepts.
pub struct ReferenceConvKernel {
    cfg: ConvConfig,
}

impl ReferenceConvKernel {
    pub fn new(cfg: ConvConfig) -> Self {
        Self { cfg }
    }

    /// Logical channel of the tile's first output lane, recovered from the
    /// destination offset.
    fn logical_oc_base(&self, dst_off_elems: usize) -> usize {
        let cfg = &self.cfg;
        match cfg.dst_layout {
            LayoutKind::Blocked { block } => {
                let total_c = cfg.ngroups * cfg.oc;
                let nb_c = total_c.div_ceil(block);
                let sp = cfg.oh * cfg.ow;
                (dst_off_elems / block / sp % nb_c) * block
            }
            LayoutKind::ChannelLast => dst_off_elems % (cfg.ngroups * cfg.oc),
        }
    }
}

impl ConvKernel for ReferenceConvKernel {
    fn handles_w_padding(&self) -> bool {
        true
    }

    unsafe fn invoke(&self, args: &ConvKernelArgs) {
        let cfg = &self.cfg;
        let src = args.src as *const f32;
        let dst = args.dst as *mut f32;
        let wei = args.weights as *const f32;

        let (src_h_str, src_w_str) = match cfg.src_layout {
            LayoutKind::Blocked { block } => (cfg.iw * block, block),
            LayoutKind::ChannelLast => {
                let c = cfg.ngroups * cfg.ic;
                (cfg.iw * c, c)
            }
        };
        let (dst_w_str, dst_blk_str) = match cfg.dst_layout {
            LayoutKind::Blocked { block } => (block, cfg.oh * cfg.ow * block),
            LayoutKind::ChannelLast => (cfg.ngroups * cfg.oc, cfg.oc_block),
        };
        let wei_blk_str = cfg.nb_ic * cfg.kh * cfg.kw * cfg.ic_block * cfg.oc_block;
        let wei_h_str = cfg.kw * cfg.ic_block * cfg.oc_block;
        let wei_w_str = cfg.ic_block * cfg.oc_block;

        let first = args.flags & FLAG_FIRST_IC != 0;
        let last = args.flags & FLAG_LAST_IC != 0;
        let oc_base = self.logical_oc_base(
            (args.dst as usize - args.dst_orig as usize) / core::mem::size_of::<f32>(),
        );

        for b in 0..args.oc_blocks {
            let lanes = cfg.oc_block.min(args.oc_work - b * cfg.oc_block);
            for ow in 0..cfg.ow {
                for lane in 0..lanes {
                    let dst_at = dst.add(b * dst_blk_str + ow * dst_w_str + lane);
                    let mut acc = if first {
                        if args.bias.is_null() {
                            0.0
                        } else {
                            *(args.bias as *const f32).add(b * cfg.oc_block + lane)
                        }
                    } else {
                        *dst_at
                    };

                    for kh in 0..args.kh_padding {
                        let src_row = src.add(kh * cfg.dstep_h() * src_h_str);
                        for kw in 0..cfg.kw {
                            let iw = (ow * cfg.stride_w + kw * cfg.dstep_w()) as isize
                                - cfg.l_pad as isize;
                            if iw < 0 || iw >= cfg.iw as isize {
                                continue;
                            }
                            let src_col = src_row.add(iw as usize * src_w_str);
                            let wei_tap =
                                wei.add(b * wei_blk_str + kh * wei_h_str + kw * wei_w_str + lane);
                            for ic in 0..cfg.ic_block {
                                acc += *src_col.add(ic) * *wei_tap.add(ic * cfg.oc_block);
                            }
                        }
                    }

                    if last {
                        if cfg.with_eltwise {
                            acc = acc.max(0.0);
                        }
                        for op in 0..cfg.binary_operands as usize {
                            let operand = *args.post_op_operands.add(op) as *const f32;
                            acc += *operand.add(oc_base + b * cfg.oc_block + lane);
                        }
                    }
                    *dst_at = acc;
                }
            }
        }
    }
}
