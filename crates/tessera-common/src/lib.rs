//! Shared building blocks for the tessera dispatch crates: balanced work
//! splitting, mixed-radix index arithmetic and fork-join parallel regions.

pub mod math;
pub mod nd;
pub mod parallel;
pub mod work;

pub use nd::NdIndexer;
pub use parallel::{parallel, parallel_nd};
pub use work::balance;
