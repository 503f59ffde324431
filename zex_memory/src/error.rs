//! Errors raised by the heap and the memory manager.
//!
//! Every fallible operation returns one of these through a [`Result`].
//! Nothing is latched here; the execution engine decides what to do
//! with an error once it has been returned.

use crate::heap::ObjectId;

use thiserror::Error;

/// Raised by operations on the garbage collected heap.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum HeapError
{
    /// The request does not fit even after all unreachable objects
    /// have been collected.
    #[error("heap pool exhausted: {requested} more bytes requested, capacity is {capacity}")]
    PoolExhausted
    {
        /// Number of bytes that were requested.
        requested: usize,
        /// Capacity of the heap pool.
        capacity: u32,
    },

    /// Every object id is in use.
    #[error("object ids exhausted")]
    IdExhausted,

    /// No object with this id exists.
    #[error("unknown object {0}")]
    UnknownId(ObjectId),

    /// A byte range reaches past the end of an object.
    #[error("range {offset}+{size} is outside object {id} of length {length}")]
    OutOfBounds
    {
        /// The object that was addressed.
        id: ObjectId,
        /// Start of the range within the object.
        offset: u32,
        /// Size of the range.
        size: u32,
        /// Current length of the object.
        length: u32,
    },

    /// An expansion asked to overwrite more bytes than the object has.
    #[error("cannot overlay {overlay} bytes of object {id} of length {length}")]
    OverlayTooLarge
    {
        /// The object being expanded.
        id: ObjectId,
        /// Number of trailing bytes to overwrite.
        overlay: u32,
        /// Current length of the object.
        length: u32,
    },
}

impl HeapError
{
    /// Whether the error means the heap can no longer serve allocations.
    ///
    /// Out-of-memory conditions are never retried;
    /// the current program cannot continue after one.
    pub fn is_fatal(self) -> bool
    {
        matches!(self, Self::PoolExhausted{..} | Self::IdExhausted)
    }
}

/// Raised by operations of the memory manager.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum MemoryError
{
    /// See [`HeapError`].
    #[error(transparent)]
    Heap(#[from] HeapError),

    /// An access reaches past the end of flat memory.
    #[error("flat memory access {address}+{size} out of bounds")]
    OutOfBounds
    {
        /// First byte of the access.
        address: u32,
        /// Size of the access in bytes.
        size: u32,
    },

    /// No terminator was found between an address and the end of memory.
    #[error("no string terminator after address {address}")]
    MissingTerminator
    {
        /// Where the string was supposed to start.
        address: u32,
    },

    /// An element index is not smaller than the length of the value.
    #[error("index {index} out of bounds for length {length}")]
    IndexOutOfBounds
    {
        /// The offending index.
        index: u32,
        /// Length of the string or list.
        length: u32,
    },

    /// Pushing would grow the stack past its size.
    #[error("stack overflow")]
    StackOverflow,

    /// Popping or peeking below the bottom of the stack.
    #[error("stack underflow")]
    StackUnderflow,
}

impl MemoryError
{
    /// Whether the error is an out-of-memory condition of the heap.
    pub fn is_fatal(self) -> bool
    {
        match self {
            Self::Heap(error) => error.is_fatal(),
            _ => false,
        }
    }

    /// Whether the error concerns the operand stack.
    pub fn is_stack_error(self) -> bool
    {
        matches!(self, Self::StackOverflow | Self::StackUnderflow)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn fatal_errors()
    {
        let exhausted = HeapError::PoolExhausted{requested: 4, capacity: 64};
        assert!(exhausted.is_fatal());
        assert!(HeapError::IdExhausted.is_fatal());
        assert!(!HeapError::UnknownId(ObjectId(3)).is_fatal());
        assert!(MemoryError::from(exhausted).is_fatal());
        assert!(!MemoryError::StackOverflow.is_fatal());
        assert!(MemoryError::StackUnderflow.is_stack_error());
    }

    #[test]
    fn messages()
    {
        let error = MemoryError::from(HeapError::UnknownId(ObjectId(7)));
        assert_eq!(error.to_string(), "unknown object #7");
    }
}
