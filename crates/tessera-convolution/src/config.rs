//! Problem validation and blocking configuration for forward convolution.

use serde::{Deserialize, Serialize};
use tessera_core::{
    ArgId, DataType, Engine, FormattedSetupError, LayoutKind, SetupError, UnsupportedError,
};

use crate::problem::ConvProblem;

/// Resolved shape, blocking and threading of one convolution primitive,
/// fixed at init and shared read-only with the kernel and the dispatch loop.
///
/// Extents are per group where a group axis exists. 1D problems carry height
/// extent 1; depth is rejected at setup.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConvConfig {
    pub mb: usize,
    pub ngroups: usize,
    pub oc: usize,
    pub ic: usize,
    pub ih: usize,
    pub iw: usize,
    pub oh: usize,
    pub ow: usize,
    pub kh: usize,
    pub kw: usize,
    pub stride_h: usize,
    pub stride_w: usize,
    pub t_pad: usize,
    pub l_pad: usize,
    pub dilate_h: usize,
    pub dilate_w: usize,
    pub oc_block: usize,
    pub ic_block: usize,
    pub nb_oc: usize,
    pub nb_ic: usize,
    /// Output-channel blocks handled by one kernel invocation.
    pub nb_oc_blocking: usize,
    /// Input-channel blocks per chunk of the outer accumulation loop.
    pub nb_ic_blocking: usize,
    /// A chunk swallows the remainder when fewer than this many blocks are
    /// left, so the tail never runs as a tiny extra pass.
    pub nb_ic_blocking_max: usize,
    pub with_bias: bool,
    pub with_eltwise: bool,
    pub binary_operands: u32,
    pub src_layout: LayoutKind,
    pub dst_layout: LayoutKind,
    pub nthr: usize,
}

impl ConvConfig {
    /// Validates `problem` and resolves the blocking the dispatch loop and
    /// kernel agree on. Channel blocking comes from the weights descriptor;
    /// activation layouts must be compatible with it.
    pub fn setup(engine: &Engine, problem: &ConvProblem) -> Result<Self, SetupError> {
        let src = &problem.src;
        let wei = &problem.weights;
        let dst = &problem.dst;
        let params = &problem.params;

        for dtype in [src.dtype, wei.dtype, dst.dtype] {
            if dtype != DataType::F32 {
                return Err(UnsupportedError::DataType {
                    dtype,
                    op: "forward convolution",
                }
                .into());
            }
        }

        if src.d != 1
            || dst.d != 1
            || wei.kd != 1
            || params.stride[0] != 1
            || params.padding[0] != 0
            || params.dilation[0] != 0
        {
            return Err(FormattedSetupError::new(|| {
                "convolution dispatch covers 1D and 2D spatial shapes only".to_string()
            })
            .into());
        }

        let groups = params.groups;
        if groups == 0 {
            return Err(
                FormattedSetupError::new(|| "group count must be at least 1".to_string()).into(),
            );
        }
        if wei.groups != groups || wei.with_groups != (groups > 1) {
            let (wg, wwg) = (wei.groups, wei.with_groups);
            return Err(FormattedSetupError::new(move || {
                format!(
                    "weights carry groups={wg} with_groups={wwg}, params ask for groups={groups}"
                )
            })
            .into());
        }
        if src.c != groups * wei.ic || dst.c != groups * wei.oc {
            let (sc, dc, ic, oc) = (src.c, dst.c, wei.ic, wei.oc);
            return Err(FormattedSetupError::new(move || {
                format!(
                    "channel extents src={sc} dst={dc} do not match {groups} groups of {ic}->{oc}"
                )
            })
            .into());
        }
        if src.n != dst.n {
            let (sn, dn) = (src.n, dst.n);
            return Err(FormattedSetupError::new(move || {
                format!("batch extents differ: src={sn} dst={dn}")
            })
            .into());
        }

        let [_, stride_h, stride_w] = params.stride;
        if stride_h == 0 || stride_w == 0 {
            return Err(
                FormattedSetupError::new(|| "strides must be at least 1".to_string()).into(),
            );
        }
        let zero_extent = [
            src.n, src.c, src.h, src.w, dst.c, dst.h, dst.w, wei.kh, wei.kw,
        ]
        .into_iter()
        .any(|e| e == 0);
        if zero_extent {
            return Err(
                FormattedSetupError::new(|| "every extent must be at least 1".to_string()).into(),
            );
        }

        // The weights buffer fixes the channel blocking; activations must
        // tile by the same blocks.
        let ic_block = wei.ic_block;
        let oc_block = wei.oc_block;
        if let LayoutKind::Blocked { block } = src.layout {
            if block != ic_block {
                return Err(UnsupportedError::Layout {
                    layout: src.layout,
                    arg: ArgId::Src,
                }
                .into());
            }
        }
        if let LayoutKind::Blocked { block } = dst.layout {
            if block != oc_block {
                return Err(UnsupportedError::Layout {
                    layout: dst.layout,
                    arg: ArgId::Dst,
                }
                .into());
            }
        }
        if wei.ic % ic_block != 0 {
            let ic = wei.ic;
            return Err(FormattedSetupError::new(move || {
                format!("input channels {ic} per group must divide into blocks of {ic_block}")
            })
            .into());
        }
        if groups > 1 && matches!(dst.layout, LayoutKind::Blocked { .. }) && wei.oc % oc_block != 0
        {
            let oc = wei.oc;
            return Err(FormattedSetupError::new(move || {
                format!("grouped blocked output needs {oc} channels per group to fill {oc_block}-blocks")
            })
            .into());
        }

        let nb_oc = wei.oc.div_ceil(oc_block);
        let nb_ic = wei.ic / ic_block;

        let cfg = Self {
            mb: src.n,
            ngroups: groups,
            oc: wei.oc,
            ic: wei.ic,
            ih: src.h,
            iw: src.w,
            oh: dst.h,
            ow: dst.w,
            kh: wei.kh,
            kw: wei.kw,
            stride_h,
            stride_w,
            t_pad: params.padding[1],
            l_pad: params.padding[2],
            dilate_h: params.dilation[1],
            dilate_w: params.dilation[2],
            oc_block,
            ic_block,
            nb_oc,
            nb_ic,
            nb_oc_blocking: nb_oc.min(4),
            nb_ic_blocking: 8,
            nb_ic_blocking_max: 12,
            with_bias: params.with_bias,
            with_eltwise: params.with_eltwise,
            binary_operands: params.binary_operands,
            src_layout: src.layout,
            dst_layout: dst.layout,
            nthr: engine.nthr(),
        };
        log::debug!(
            "conv config: mb={} g={} ic={}x{} oc={}x{} out={}x{} blocking oc={} ic={}",
            cfg.mb,
            cfg.ngroups,
            cfg.nb_ic,
            cfg.ic_block,
            cfg.nb_oc,
            cfg.oc_block,
            cfg.oh,
            cfg.ow,
            cfg.nb_oc_blocking,
            cfg.nb_ic_blocking,
        );
        Ok(cfg)
    }

    /// Output-channel tiles per `(batch, group, row)` slice of the work space.
    #[inline]
    pub fn ocb_work(&self) -> usize {
        self.nb_oc.div_ceil(self.nb_oc_blocking)
    }

    /// Effective vertical tap step.
    #[inline]
    pub fn dstep_h(&self) -> usize {
        self.dilate_h + 1
    }

    /// Effective horizontal tap step.
    #[inline]
    pub fn dstep_w(&self) -> usize {
        self.dilate_w + 1
    }
}
