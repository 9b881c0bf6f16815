//! Channel-shuffle tile dispatch over pre-built CPU kernels.
//!
//! The primitive folds the group transpose into a per-channel offset table
//! at init, decomposes the tensor into `(batch, spatial split, channel
//! block)` tiles, and invokes an opaque kernel once per tile with a fully
//! populated argument record.

pub mod config;
pub mod kernel;
pub mod primitive;
pub mod problem;
pub mod reference;
pub mod table;

pub use config::ShuffleConfig;
pub use kernel::{ShuffleKernel, ShuffleKernelArgs};
pub use primitive::ChannelShuffle;
pub use problem::{ShuffleDirection, ShuffleParams, ShuffleProblem};
pub use reference::ReferenceShuffleKernel;
pub use table::OffsetTable;
