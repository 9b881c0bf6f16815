//! Forward-convolution tile dispatch over pre-built CPU kernels.
//!
//! The primitive decomposes a convolution into `(batch, group, oc-tile,
//! output row)` tiles, resolves blocked-layout addresses and boundary
//! clipping per tile, and invokes an opaque kernel once per tile and
//! input-channel block with a fully populated argument record.

pub mod config;
pub mod halo;
pub mod kernel;
pub mod primitive;
pub mod problem;
pub mod reference;

pub use config::ConvConfig;
pub use halo::SpatialHalo;
pub use kernel::{BinaryOperands, ConvKernel, ConvKernelArgs, FLAG_FIRST_IC, FLAG_LAST_IC};
pub use primitive::ConvolutionFwd;
pub use problem::{ConvParams, ConvProblem};
pub use reference::ReferenceConvKernel;
