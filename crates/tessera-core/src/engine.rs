//! Execution engine: resolved thread count and detected ISA level.

use serde::{Deserialize, Serialize};

/// Vector instruction set the kernels may rely on.
///
/// Ordered weakest to strongest; a level implies every weaker one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IsaLevel {
    Portable,
    Sse41,
    Avx2,
    Avx512,
}

impl IsaLevel {
    /// Probes the running CPU. Non-x86 targets always report `Portable`.
    pub fn detect() -> Self {
        #[cfg(target_arch = "x86_64")]
        {
            if is_x86_feature_detected!("avx512f") {
                return IsaLevel::Avx512;
            }
            if is_x86_feature_detected!("avx2") {
                return IsaLevel::Avx2;
            }
            if is_x86_feature_detected!("sse4.1") {
                return IsaLevel::Sse41;
            }
        }
        IsaLevel::Portable
    }

    /// Vector register width in bytes, 0 for `Portable`.
    #[inline]
    pub fn vlen(&self) -> usize {
        match self {
            IsaLevel::Portable => 0,
            IsaLevel::Sse41 => 16,
            IsaLevel::Avx2 => 32,
            IsaLevel::Avx512 => 64,
        }
    }
}

/// Capability carrier built once and shared by every primitive.
///
/// Holds the worker count the dispatch loops fork and the ISA level the
/// kernel selection consults. Both are fixed for the engine's lifetime.
#[derive(Clone, Copy, Debug)]
pub struct Engine {
    nthr: usize,
    isa: IsaLevel,
}

impl Engine {
    /// Engine with a detected ISA and one worker per available core.
    pub fn detect() -> Self {
        let nthr = std::thread::available_parallelism().map_or(1, |n| n.get());
        Self::with_threads(nthr)
    }

    /// Engine with a detected ISA and an explicit worker count.
    pub fn with_threads(nthr: usize) -> Self {
        Self::with_isa(nthr, IsaLevel::detect())
    }

    /// Engine pinned to an explicit ISA level, for capping kernel selection
    /// below what the CPU reports.
    pub fn with_isa(nthr: usize, isa: IsaLevel) -> Self {
        let engine = Self {
            nthr: nthr.max(1),
            isa,
        };
        log::debug!("engine: {} workers, isa {:?}", engine.nthr, engine.isa);
        engine
    }

    #[inline]
    pub fn nthr(&self) -> usize {
        self.nthr
    }

    #[inline]
    pub fn isa(&self) -> IsaLevel {
        self.isa
    }
}
