//! Description of one forward-convolution request.

use serde::{Deserialize, Serialize};
use tessera_core::{TensorDesc, WeightsDesc};

/// Strides, padding, dilation and post-op selection of a convolution.
///
/// Spatial vectors are `[d, h, w]`, matching the descriptor normalization;
/// absent axes take stride 1, padding 0 and dilation 0. Dilation counts the
/// extra gap between taps, so the effective step is `dilation + 1`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvParams {
    pub stride: [usize; 3],
    /// Leading (front/top/left) padding. Trailing padding is implied by the
    /// destination extent; out-of-range taps are clipped per tile.
    pub padding: [usize; 3],
    pub dilation: [usize; 3],
    pub groups: usize,
    pub with_bias: bool,
    /// Applies ReLU to each output element after the last input-channel pass.
    pub with_eltwise: bool,
    /// Number of per-channel operands added after the last input-channel
    /// pass, bound as `ArgId::BinaryOperand(0..n)`.
    pub binary_operands: u32,
}

impl ConvParams {
    /// Plain unit-stride parameters for a 2D convolution.
    pub fn unit_2d(padding_h: usize, padding_w: usize) -> Self {
        Self {
            stride: [1, 1, 1],
            padding: [0, padding_h, padding_w],
            dilation: [0, 0, 0],
            groups: 1,
            with_bias: false,
            with_eltwise: false,
            binary_operands: 0,
        }
    }

    #[inline]
    pub fn with_binary(&self) -> bool {
        self.binary_operands > 0
    }

    #[inline]
    pub fn with_post_ops(&self) -> bool {
        self.with_eltwise || self.with_binary()
    }
}

/// Everything a convolution primitive needs to know at init time.
#[derive(Clone, Debug)]
pub struct ConvProblem {
    pub src: TensorDesc,
    pub weights: WeightsDesc,
    pub dst: TensorDesc,
    pub params: ConvParams,
}
