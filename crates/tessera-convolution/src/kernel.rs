//! Per-tile argument record and the contract of pre-built compute kernels.

/// Tile runs the first input-channel block: seed the accumulator from bias
/// (or zero) instead of loading the destination.
pub const FLAG_FIRST_IC: u32 = 1 << 0;
/// Tile runs the last input-channel block of a problem with post ops: apply
/// them after accumulating.
pub const FLAG_LAST_IC: u32 = 1 << 1;

/// Arguments of one kernel invocation, fully resolved by the dispatch loop.
///
/// One invocation covers a run of `oc_blocks` output-channel blocks over one
/// full output row. Pointers are pre-shifted to the tile: `src` to the first
/// input row the clipped window reads, `weights` to the first valid vertical
/// tap, `dst` to the row start.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct ConvKernelArgs {
    pub src: *const u8,
    pub dst: *mut u8,
    pub weights: *const u8,
    /// Bias of the tile's first output channel; null unless `FLAG_FIRST_IC`
    /// is set and the problem carries bias.
    pub bias: *const u8,
    /// Base of the prepared binary-operand pointer vector.
    pub post_op_operands: *const *const u8,
    /// Unshifted destination base. Kernels recover the tile's logical
    /// channel position from the distance to it when addressing per-channel
    /// operands.
    pub dst_orig: *mut u8,
    /// Valid vertical taps after clipping.
    pub kh_padding: usize,
    /// Valid horizontal taps, or 0 for kernels that mask the width boundary
    /// themselves.
    pub kw_padding: usize,
    /// Output-channel blocks covered by this invocation.
    pub oc_blocks: usize,
    /// Real output channels across those blocks; the trailing block may be
    /// partial and its padded lanes are not written.
    pub oc_work: usize,
    pub flags: u32,
}

/// A pre-built compute routine invoked once per `(tile, input-channel
/// block)` pair.
///
/// Implementations are selected once at init and shared read-only by every
/// worker of the dispatch loop.
pub trait ConvKernel: Send + Sync {
    /// Whether the kernel masks the width boundary itself. If so the
    /// dispatch passes `kw_padding = 0`; otherwise init rejects problems
    /// whose width windows need clipping and `kw_padding` carries the full
    /// tap count.
    fn handles_w_padding(&self) -> bool;

    /// Runs the tile described by `args`.
    ///
    /// # Safety
    /// Every pointer must be valid for the access pattern the primitive's
    /// descriptors define: `src`, `weights`, `bias` and the operand vector
    /// for reads, `dst` for writes within the tile's disjoint destination
    /// range.
    unsafe fn invoke(&self, args: &ConvKernelArgs);
}

/// Binary-operand pointer vector, prepared once before the parallel region
/// and read by every tile that applies post ops.
pub struct BinaryOperands<'a> {
    ptrs: Vec<*const u8>,
    _marker: core::marker::PhantomData<&'a [u8]>,
}

// Entries point into caller-bound input buffers that outlive the dispatch;
// workers only read them.
unsafe impl Send for BinaryOperands<'_> {}
unsafe impl Sync for BinaryOperands<'_> {}

impl<'a> BinaryOperands<'a> {
    pub fn new(operands: &[&'a [u8]]) -> Self {
        Self {
            ptrs: operands.iter().map(|op| op.as_ptr()).collect(),
            _marker: core::marker::PhantomData,
        }
    }

    #[inline]
    pub fn as_ptr(&self) -> *const *const u8 {
        self.ptrs.as_ptr()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ptrs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ptrs.is_empty()
    }
}
