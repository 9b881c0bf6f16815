//! Kernel-facing argument record and the kernel contract.

/// Arguments for one `(batch, spatial-split, channel-block)` tile.
///
/// `src` points at the tile's batch-and-spatial base, `dst` at the first
/// output lane of the tile's channel block. `input_off` holds one byte
/// offset per output channel, relative to `src`; the kernel adds
/// `spatial_point * block * dt` on top while it walks the split.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct ShuffleKernelArgs {
    pub src: *const u8,
    pub dst: *mut u8,
    pub input_off: *const u32,
    /// Channels to move; below the block size on the last block.
    pub channel_count: usize,
    /// Set on the last channel block, which may not fill a full vector.
    pub is_tail_block: bool,
}

/// One pre-specialized shuffle routine.
///
/// Implementations are selected once at init and invoked per tile from
/// worker threads, so they must be stateless over `&self`.
pub trait ShuffleKernel: Send + Sync {
    /// # Safety
    ///
    /// Every pointer in `args` must be valid for the tile the dispatch loop
    /// derived: `src` and `dst` must cover the tile's split and must not
    /// alias, and `input_off` must hold at least `channel_count` entries.
    unsafe fn invoke(&self, args: &ShuffleKernelArgs);
}
