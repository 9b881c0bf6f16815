//! Core building blocks shared by the Tessera primitives: element types,
//! tensor descriptors with blocked-layout addressing, the execution engine
//! and the argument-binding context.

pub mod context;
pub mod desc;
pub mod dtype;
pub mod engine;
pub mod error;

pub use context::{ArgId, DstPtr, ExecContext};
pub use desc::{LayoutKind, TensorDesc, WeightsDesc};
pub use dtype::{DataType, Element};
pub use engine::{Engine, IsaLevel};
pub use error::{ExecError, FormattedSetupError, SetupError, UnsupportedError};
