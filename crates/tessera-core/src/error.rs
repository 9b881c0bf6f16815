//! Setup- and execute-time errors shared by all primitives.

use std::fmt::{Debug, Display};

use crate::context::ArgId;
use crate::desc::LayoutKind;
use crate::dtype::DataType;
use crate::engine::IsaLevel;

/// Errors raised while a primitive validates its problem description.
///
/// Only `init` raises these; once a primitive is built, per-tile work is pure
/// address and flag computation and cannot fail.
pub enum SetupError {
    /// The problem asks for something this primitive cannot dispatch.
    Unsupported(UnsupportedError),

    /// The problem is internally inconsistent.
    InvalidConfig(InvalidConfigError),
}

/// A specific feature of the problem falls outside what the primitive and
/// its kernels support.
pub enum UnsupportedError {
    /// Shuffling along anything but the channel axis.
    ShuffleAxis { axis: usize },

    /// The element type is outside the kernel's accepted set.
    DataType { dtype: DataType, op: &'static str },

    /// The tensor layout is outside the kernel's accepted set.
    Layout { layout: LayoutKind, arg: ArgId },

    /// The kernel's vector width does not fit the channel block.
    VectorWidth { simd_w: usize, block: usize },

    /// The detected instruction set cannot process this data type.
    Isa { isa: IsaLevel, dtype: DataType },
}

impl From<UnsupportedError> for SetupError {
    fn from(value: UnsupportedError) -> Self {
        Self::Unsupported(value)
    }
}

impl From<InvalidConfigError> for SetupError {
    fn from(value: InvalidConfigError) -> Self {
        Self::InvalidConfig(value)
    }
}

impl Display for SetupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Debug for SetupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SetupError::Unsupported(err) => {
                writeln!(
                    f,
                    "Unable to build the primitive because a feature is unsupported: {err:?}"
                )
            }
            SetupError::InvalidConfig(err) => {
                writeln!(
                    f,
                    "Unable to build the primitive because the problem is invalid: {:?}",
                    err.to_string()
                )
            }
        }
    }
}

impl Debug for UnsupportedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnsupportedError::ShuffleAxis { axis } => {
                writeln!(f, "Shuffle axis {axis} unsupported. Only the channel axis (1) is.")
            }
            UnsupportedError::DataType { dtype, op } => {
                writeln!(f, "Data type {dtype:?} not supported by {op}.")
            }
            UnsupportedError::Layout { layout, arg } => {
                writeln!(f, "Layout {layout:?} not supported for {arg:?}.")
            }
            UnsupportedError::VectorWidth { simd_w, block } => {
                writeln!(
                    f,
                    "Kernel vector width {simd_w} does not fit channel block {block}."
                )
            }
            UnsupportedError::Isa { isa, dtype } => {
                writeln!(f, "Instruction set {isa:?} cannot process {dtype:?}.")
            }
        }
    }
}

/// Error built from a formatted message at the rejecting check.
pub type InvalidConfigError = Box<dyn Display>;

/// Lazily formatted [`InvalidConfigError`].
pub struct FormattedSetupError {
    func: Box<dyn Fn() -> String>,
}

impl FormattedSetupError {
    #[allow(clippy::new_ret_no_self)]
    pub fn new<F: Fn() -> String + 'static>(func: F) -> Box<dyn Display> {
        Box::new(Self {
            func: Box::new(func),
        })
    }
}

impl Display for FormattedSetupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let string = (self.func)();
        write!(f, "{string}")
    }
}

/// Errors raised while an execution context is checked against a primitive's
/// argument list, before any parallel region starts.
pub enum ExecError {
    /// A required argument was never bound.
    MissingArg(ArgId),

    /// A bound buffer is smaller than the descriptor requires.
    BufferTooSmall {
        arg: ArgId,
        needed: usize,
        got: usize,
    },
}

impl Display for ExecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Debug for ExecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecError::MissingArg(arg) => writeln!(f, "Argument {arg:?} is not bound."),
            ExecError::BufferTooSmall { arg, needed, got } => {
                writeln!(
                    f,
                    "Buffer for {arg:?} holds {got} bytes, descriptor needs {needed}."
                )
            }
        }
    }
}
