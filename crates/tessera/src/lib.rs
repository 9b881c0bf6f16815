pub use tessera_core::*;

#[cfg(feature = "convolution")]
pub use tessera_convolution as convolution;

#[cfg(feature = "shuffle")]
pub use tessera_shuffle as shuffle;
