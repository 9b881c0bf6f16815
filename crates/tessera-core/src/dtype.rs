//! Element data types carried by tensor buffers.

use half::{bf16, f16};
use serde::{Deserialize, Serialize};

/// Element type of a tensor buffer.
///
/// The dispatch layer never interprets element values; it only needs the
/// element size to scale offsets into byte addresses. Kernels decide which
/// types they accept.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    F32,
    F16,
    Bf16,
    S32,
    S8,
    U8,
}

impl DataType {
    /// Size of one element in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        match self {
            DataType::F32 | DataType::S32 => 4,
            DataType::F16 | DataType::Bf16 => 2,
            DataType::S8 | DataType::U8 => 1,
        }
    }
}

/// Rust element types that can back a [`DataType`].
///
/// The [`bytemuck::Pod`] bound is what lets the execution context cast typed
/// slices to the byte buffers the kernels receive.
pub trait Element: bytemuck::Pod {
    const DTYPE: DataType;
}

impl Element for f32 {
    const DTYPE: DataType = DataType::F32;
}

impl Element for f16 {
    const DTYPE: DataType = DataType::F16;
}

impl Element for bf16 {
    const DTYPE: DataType = DataType::Bf16;
}

impl Element for i32 {
    const DTYPE: DataType = DataType::S32;
}

impl Element for i8 {
    const DTYPE: DataType = DataType::S8;
}

impl Element for u8 {
    const DTYPE: DataType = DataType::U8;
}
