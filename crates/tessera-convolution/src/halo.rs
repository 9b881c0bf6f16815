//! Clipping of a convolution window against the input boundary.

/// Valid-tap window of one output position along one spatial axis.
///
/// For an output position whose window reaches into the leading padding or
/// past the input end, the resolver reports how many kernel taps survive and
/// where the first surviving tap lands in the input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpatialHalo {
    /// Index of the first in-bounds kernel tap.
    pub first_valid_tap: usize,
    /// Number of in-bounds taps, `0..=k`.
    pub valid_taps: usize,
    /// Input coordinate read by the first valid tap.
    pub input_start: usize,
}

impl SpatialHalo {
    /// Clips the window of output position `out_idx` along an axis with
    /// `input_extent` points, kernel size `k`, leading padding `pad` and
    /// `dilation` extra points between taps.
    ///
    /// Tap `t` of output `o` reads padded coordinate
    /// `o * stride + t * (dilation + 1)`, which is in bounds iff it lies in
    /// `[pad, pad + input_extent)`.
    #[inline]
    pub fn resolve(
        out_idx: usize,
        stride: usize,
        pad: usize,
        dilation: usize,
        k: usize,
        input_extent: usize,
    ) -> Self {
        let dstep = dilation + 1;
        let ij = out_idx * stride;
        let top_overflow = pad.saturating_sub(ij);
        let bottom_overflow =
            (ij + (k - 1) * dstep + 1).saturating_sub(pad).saturating_sub(input_extent);

        let first_valid_tap = top_overflow.div_ceil(dstep);
        let clipped = first_valid_tap + bottom_overflow.div_ceil(dstep);
        let valid_taps = k.saturating_sub(clipped);
        let input_start = (ij + first_valid_tap * dstep).saturating_sub(pad);

        Self {
            first_valid_tap,
            valid_taps,
            input_start,
        }
    }
}

/// Whether every output column keeps all `k` taps in bounds, so a kernel
/// that cannot mask the width boundary may still run.
#[inline]
pub fn width_is_uniform(
    out_extent: usize,
    stride: usize,
    pad: usize,
    dilation: usize,
    k: usize,
    input_extent: usize,
) -> bool {
    if out_extent == 0 {
        return true;
    }
    let first = SpatialHalo::resolve(0, stride, pad, dilation, k, input_extent);
    let last = SpatialHalo::resolve(out_extent - 1, stride, pad, dilation, k, input_extent);
    first.valid_taps == k && last.valid_taps == k
}
