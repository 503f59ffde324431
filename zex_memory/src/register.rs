//! The machine word of the virtual machine.

use crate::heap::ObjectId;
use crate::object::Handle;
use crate::object::ListHandle;
use crate::object::StringHandle;

/// Size of a register in bytes.
///
/// This is also the width of flat memory cells, stack slots and list slots.
pub const REGISTER_SIZE: u32 = 8;

/// Untagged 64-bit machine word.
///
/// A register may hold an integer, a float, a string or list handle,
/// or a function descriptor.
/// Nothing in the register says which;
/// the instruction that reads it picks an interpretation
/// through one of the `as_*` methods.
/// Handles and function descriptors are two 32-bit halves,
/// with the object id (or environment id) in the high half.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Register(pub u64);

/// Code position and environment of a function value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Function
{
    /// Position of the first instruction of the function.
    pub position: u32,

    /// Id of the list holding the function's environment.
    pub env: ObjectId,
}

impl Register
{
    /// The all-zero register.
    pub const ZERO: Self = Self(0);

    #[allow(missing_docs)]
    #[inline]
    pub fn from_int(value: i64) -> Self
    {
        Self(value as u64)
    }

    #[allow(missing_docs)]
    #[inline]
    pub fn as_int(self) -> i64
    {
        self.0 as i64
    }

    /// Store the bits of a float.
    #[inline]
    pub fn from_float(value: f64) -> Self
    {
        Self(value.to_bits())
    }

    #[allow(missing_docs)]
    #[inline]
    pub fn as_float(self) -> f64
    {
        f64::from_bits(self.0)
    }

    /// Pack a string or list handle.
    #[inline]
    pub fn from_handle<K>(handle: Handle<K>) -> Self
    {
        Self::from_halves(handle.reserved, handle.id.0)
    }

    /// Interpret the register as a string handle.
    #[inline]
    pub fn as_string(self) -> StringHandle
    {
        self.as_handle()
    }

    /// Interpret the register as a list handle.
    ///
    /// A function descriptor read this way yields its environment list.
    #[inline]
    pub fn as_list(self) -> ListHandle
    {
        self.as_handle()
    }

    #[allow(missing_docs)]
    #[inline]
    pub fn from_function(function: Function) -> Self
    {
        Self::from_halves(function.position, function.env.0)
    }

    #[allow(missing_docs)]
    #[inline]
    pub fn as_function(self) -> Function
    {
        let (position, env) = self.halves();
        Function{position, env: ObjectId(env)}
    }

    /// Little-endian encoding, as stored in memory.
    #[inline]
    pub fn to_bytes(self) -> [u8; REGISTER_SIZE as usize]
    {
        self.0.to_le_bytes()
    }

    #[allow(missing_docs)]
    #[inline]
    pub fn from_bytes(bytes: [u8; REGISTER_SIZE as usize]) -> Self
    {
        Self(u64::from_le_bytes(bytes))
    }

    /// Decode a register from the first [`REGISTER_SIZE`] bytes of a slice.
    ///
    /// # Panics
    ///
    /// Panics if the slice is shorter than a register.
    #[inline]
    pub fn read_from(bytes: &[u8]) -> Self
    {
        let mut buffer = [0; REGISTER_SIZE as usize];
        buffer.copy_from_slice(&bytes[.. REGISTER_SIZE as usize]);
        Self::from_bytes(buffer)
    }

    fn as_handle<K>(self) -> Handle<K>
    {
        let (reserved, id) = self.halves();
        Handle::new(ObjectId(id), reserved)
    }

    fn from_halves(low: u32, high: u32) -> Self
    {
        Self(u64::from(low) | u64::from(high) << 32)
    }

    fn halves(self) -> (u32, u32)
    {
        (self.0 as u32, (self.0 >> 32) as u32)
    }
}
