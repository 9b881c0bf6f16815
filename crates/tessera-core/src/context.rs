//! Argument binding between caller-owned buffers and primitive dispatch.
//!
//! A primitive never owns tensor memory. The caller binds every buffer by
//! argument id before `execute`; the primitive checks presence and size
//! against its descriptors up front, then the dispatch loop reads the
//! resolved pointers without further lookups.

use core::marker::PhantomData;

use crate::dtype::Element;
use crate::error::ExecError;

/// Names one tensor slot of a primitive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArgId {
    Src,
    Weights,
    Bias,
    Dst,
    /// Right-hand side of the n-th binary post operation.
    BinaryOperand(u32),
}

/// Destination buffer handed across the fork-join region.
///
/// Carries the raw parts of an exclusively borrowed byte slice. Tiles of one
/// dispatch write pairwise disjoint ranges of it, so workers may hold copies
/// concurrently.
#[derive(Clone, Copy, Debug)]
pub struct DstPtr {
    ptr: *mut u8,
    len: usize,
}

unsafe impl Send for DstPtr {}
unsafe impl Sync for DstPtr {}

impl DstPtr {
    #[inline]
    pub fn as_mut_ptr(&self) -> *mut u8 {
        self.ptr
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

enum Binding<'a> {
    Input(&'a [u8]),
    Output {
        ptr: *mut u8,
        len: usize,
        _marker: PhantomData<&'a mut [u8]>,
    },
}

/// Buffer bindings for one `execute` call.
///
/// A handful of arguments at most, so bindings live in a flat list.
#[derive(Default)]
pub struct ExecContext<'a> {
    args: Vec<(ArgId, Binding<'a>)>,
}

impl<'a> ExecContext<'a> {
    pub fn new() -> Self {
        Self { args: Vec::new() }
    }

    fn insert(&mut self, arg: ArgId, binding: Binding<'a>) {
        match self.args.iter_mut().find(|(id, _)| *id == arg) {
            Some(slot) => slot.1 = binding,
            None => self.args.push((arg, binding)),
        }
    }

    fn get(&self, arg: ArgId) -> Option<&Binding<'a>> {
        self.args
            .iter()
            .find_map(|(id, binding)| (*id == arg).then_some(binding))
    }

    /// Binds a read-only buffer. Re-binding an id replaces the old binding.
    pub fn bind_input(&mut self, arg: ArgId, data: &'a [u8]) -> &mut Self {
        self.insert(arg, Binding::Input(data));
        self
    }

    /// Binds a read-only buffer of typed elements.
    pub fn bind_input_typed<E: Element>(&mut self, arg: ArgId, data: &'a [E]) -> &mut Self {
        self.bind_input(arg, bytemuck::cast_slice(data))
    }

    /// Binds a writable buffer. Re-binding an id replaces the old binding.
    pub fn bind_output(&mut self, arg: ArgId, data: &'a mut [u8]) -> &mut Self {
        let binding = Binding::Output {
            ptr: data.as_mut_ptr(),
            len: data.len(),
            _marker: PhantomData,
        };
        self.insert(arg, binding);
        self
    }

    /// Binds a writable buffer of typed elements.
    pub fn bind_output_typed<E: Element>(&mut self, arg: ArgId, data: &'a mut [E]) -> &mut Self {
        self.bind_output(arg, bytemuck::cast_slice_mut(data))
    }

    /// Resolves an input binding and checks it holds at least `needed` bytes.
    pub fn input(&self, arg: ArgId, needed: usize) -> Result<&'a [u8], ExecError> {
        match self.get(arg) {
            Some(Binding::Input(data)) if data.len() >= needed => Ok(data),
            Some(Binding::Input(data)) => Err(ExecError::BufferTooSmall {
                arg,
                needed,
                got: data.len(),
            }),
            _ => Err(ExecError::MissingArg(arg)),
        }
    }

    /// Resolves an output binding and checks it holds at least `needed` bytes.
    pub fn output(&self, arg: ArgId, needed: usize) -> Result<DstPtr, ExecError> {
        match self.get(arg) {
            Some(&Binding::Output { ptr, len, .. }) if len >= needed => Ok(DstPtr { ptr, len }),
            Some(&Binding::Output { len, .. }) => Err(ExecError::BufferTooSmall {
                arg,
                needed,
                got: len,
            }),
            _ => Err(ExecError::MissingArg(arg)),
        }
    }
}
