//! Tensor and weights descriptors with blocked-layout addressing.
//!
//! A descriptor normalizes the tensor rank to a fixed `[n, c, d, h, w]`
//! quintuple (absent spatial axes get extent 1) so a single offset function
//! serves 1D, 2D and 3D operations. The channel coordinate passed to
//! [`TensorDesc::offset`] is always the logical channel; splitting it into a
//! block index and an intra-block lane is resolved inside, per layout.

use serde::{Deserialize, Serialize};

use crate::dtype::DataType;

/// Physical placement of the channel axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayoutKind {
    /// Channels split into fixed-size blocks, lanes of one block contiguous
    /// at each spatial point (`nCw8c`, `nChw8c`, `nCdhw16c`, ...). The
    /// channel extent is padded up to a block multiple.
    Blocked { block: usize },
    /// All channels interleaved at each spatial point (`nwc`, `nhwc`,
    /// `ndhwc`). No channel padding.
    ChannelLast,
}

impl LayoutKind {
    /// Block size under `Blocked`, 1 otherwise.
    #[inline]
    pub fn block(&self) -> usize {
        match self {
            LayoutKind::Blocked { block } => *block,
            LayoutKind::ChannelLast => 1,
        }
    }
}

/// Shape, layout and element type of one activation tensor.
///
/// Extents are in elements. The struct is plain data; primitives validate it
/// against their own constraints at init time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TensorDesc {
    pub n: usize,
    pub c: usize,
    pub d: usize,
    pub h: usize,
    pub w: usize,
    pub layout: LayoutKind,
    pub dtype: DataType,
}

impl TensorDesc {
    /// Builds a descriptor from a batch extent, a channel extent and one to
    /// three spatial extents, slowest first.
    ///
    /// `&[w]`, `&[h, w]` and `&[d, h, w]` describe 1D, 2D and 3D tensors;
    /// missing axes are fixed at extent 1 so every offset formula below
    /// applies unchanged.
    pub fn new(n: usize, c: usize, spatial: &[usize], layout: LayoutKind, dtype: DataType) -> Self {
        assert!(
            (1..=3).contains(&spatial.len()),
            "expected 1 to 3 spatial extents, got {}",
            spatial.len()
        );
        let mut dhw = [1usize; 3];
        dhw[3 - spatial.len()..].copy_from_slice(spatial);
        Self {
            n,
            c,
            d: dhw[0],
            h: dhw[1],
            w: dhw[2],
            layout,
            dtype,
        }
    }

    /// Channel extent including layout padding.
    ///
    /// Equals `c` rounded up to the block under [`LayoutKind::Blocked`] and
    /// plain `c` under [`LayoutKind::ChannelLast`].
    #[inline]
    pub fn padded_c(&self) -> usize {
        match self.layout {
            LayoutKind::Blocked { block } => self.c.next_multiple_of(block),
            LayoutKind::ChannelLast => self.c,
        }
    }

    /// Number of spatial points, `d * h * w`.
    #[inline]
    pub fn spatial_size(&self) -> usize {
        self.d * self.h * self.w
    }

    /// Total element count of the backing buffer, padding included.
    #[inline]
    pub fn size(&self) -> usize {
        self.n * self.padded_c() * self.spatial_size()
    }

    /// Total byte count of the backing buffer.
    #[inline]
    pub fn size_bytes(&self) -> usize {
        self.size() * self.dtype.size()
    }

    /// Element offset of logical coordinate `(n, c, d, h, w)`.
    ///
    /// `c` may reach into the padded channel tail (`c < padded_c()`); the
    /// result is always below [`size`](Self::size). For `Blocked { block: 8 }`
    /// over `1x5x1x2x2` the lanes of the single channel block are contiguous
    /// at each spatial point:
    ///
    /// ```
    /// use tessera_core::{DataType, LayoutKind, TensorDesc};
    ///
    /// let desc = TensorDesc::new(1, 5, &[2, 2], LayoutKind::Blocked { block: 8 }, DataType::F32);
    /// assert_eq!(desc.offset(0, 0, 0, 0, 0), 0);
    /// assert_eq!(desc.offset(0, 4, 0, 0, 0), 4);
    /// assert_eq!(desc.offset(0, 0, 0, 0, 1), 8);
    /// assert_eq!(desc.offset(0, 0, 0, 1, 0), 16);
    /// ```
    #[inline]
    pub fn offset(&self, n: usize, c: usize, d: usize, h: usize, w: usize) -> usize {
        debug_assert!(n < self.n && c < self.padded_c());
        debug_assert!(d < self.d && h < self.h && w < self.w);
        let sp = (d * self.h + h) * self.w + w;
        match self.layout {
            LayoutKind::Blocked { block } => {
                let nb_c = self.c.div_ceil(block);
                ((n * nb_c + c / block) * self.spatial_size() + sp) * block + c % block
            }
            LayoutKind::ChannelLast => (n * self.spatial_size() + sp) * self.c + c,
        }
    }

    /// Byte offset of logical coordinate `(n, c, d, h, w)`.
    #[inline]
    pub fn offset_bytes(&self, n: usize, c: usize, d: usize, h: usize, w: usize) -> usize {
        self.offset(n, c, d, h, w) * self.dtype.size()
    }

    /// Zero-fills the padded channel lanes of `buf`.
    ///
    /// Kernels only write logical channels; when the channel extent is not a
    /// block multiple the last block keeps `block - c % block` lanes per
    /// spatial point that nothing wrote. A no-op for block-aligned extents
    /// and for [`LayoutKind::ChannelLast`].
    pub fn zero_pad_tail(&self, buf: &mut [u8]) {
        let LayoutKind::Blocked { block } = self.layout else {
            return;
        };
        let tail = self.c % block;
        if tail == 0 {
            return;
        }
        let dt = self.dtype.size();
        let pad_bytes = (block - tail) * dt;
        for n in 0..self.n {
            for d in 0..self.d {
                for h in 0..self.h {
                    for w in 0..self.w {
                        // self.c is the first padded lane of the last block.
                        let at = self.offset(n, self.c, d, h, w) * dt;
                        buf[at..at + pad_bytes].fill(0);
                    }
                }
            }
        }
    }
}

/// Shape and blocking of a convolution weights tensor.
///
/// Weights are always blocked on both channel axes:
/// `[g][OCb][ICb][kd][kh][kw][ic_block][oc_block]`, with the group axis
/// present only under `with_groups`. `oc` and `ic` are per-group extents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WeightsDesc {
    pub with_groups: bool,
    pub groups: usize,
    pub oc: usize,
    pub ic: usize,
    pub kd: usize,
    pub kh: usize,
    pub kw: usize,
    pub oc_block: usize,
    pub ic_block: usize,
    pub dtype: DataType,
}

impl WeightsDesc {
    #[inline]
    pub fn nb_oc(&self) -> usize {
        self.oc.div_ceil(self.oc_block)
    }

    #[inline]
    pub fn nb_ic(&self) -> usize {
        self.ic.div_ceil(self.ic_block)
    }

    /// Total element count, channel padding included.
    #[inline]
    pub fn size(&self) -> usize {
        self.groups
            * self.nb_oc()
            * self.nb_ic()
            * self.kd
            * self.kh
            * self.kw
            * self.ic_block
            * self.oc_block
    }

    #[inline]
    pub fn size_bytes(&self) -> usize {
        self.size() * self.dtype.size()
    }

    /// Element offset of the `ic_block x oc_block` tile at
    /// `(g, ocb, icb, kd, kh, kw)`.
    #[inline]
    pub fn offset(&self, g: usize, ocb: usize, icb: usize, kd: usize, kh: usize, kw: usize) -> usize {
        debug_assert!(self.with_groups || g == 0);
        debug_assert!(g < self.groups && ocb < self.nb_oc() && icb < self.nb_ic());
        debug_assert!(kd < self.kd && kh < self.kh && kw < self.kw);
        let tile = ((((g * self.nb_oc() + ocb) * self.nb_ic() + icb) * self.kd + kd) * self.kh + kh)
            * self.kw
            + kw;
        tile * self.ic_block * self.oc_block
    }
}
