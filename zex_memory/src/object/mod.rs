//! String and list values on the garbage collected heap.
//!
//! Both kinds of value are plain heap objects;
//! the heap does not know which kind an object is.
//! The [`Handle`] type parameter keeps them apart at compile time.
//!
//! A string object holds its bytes followed by a zero terminator.
//! A list object holds [`Register`]-sized slots.
//! Lists record the heap values they contain as references,
//! so that the garbage collector can find them.
//!
//! [`Register`]: `crate::register::Register`

use crate::error::MemoryError;
use crate::heap::ObjectId;
use crate::memory::MemoryManager;

use core::fmt;
use core::marker::PhantomData;

mod list;
mod string;

/// Reference to a string or list on the heap.
///
/// The handle stays valid when the garbage collector moves the object,
/// but not after the object has been deleted or collected.
/// The `reserved` word caches the length the value had
/// when the handle was last updated.
/// Lengths are always recomputed from the heap,
/// so a stale `reserved` word is harmless.
pub struct Handle<K>
{
    /// The object holding the value.
    pub id: ObjectId,

    /// Cached length, see above.
    pub reserved: u32,

    kind: PhantomData<fn() -> K>,
}

/// Marks handles to strings.
#[derive(Debug)]
pub enum StringKind { }

/// Marks handles to lists.
#[derive(Debug)]
pub enum ListKind { }

#[allow(missing_docs)]
pub type StringHandle = Handle<StringKind>;

#[allow(missing_docs)]
pub type ListHandle = Handle<ListKind>;

impl<K> Handle<K>
{
    #[allow(missing_docs)]
    #[inline]
    pub fn new(id: ObjectId, reserved: u32) -> Self
    {
        Self{id, reserved, kind: PhantomData}
    }
}

impl<K> Clone for Handle<K>
{
    fn clone(&self) -> Self
    {
        *self
    }
}

impl<K> Copy for Handle<K>
{
}

impl<K> PartialEq for Handle<K>
{
    fn eq(&self, other: &Self) -> bool
    {
        self.id == other.id && self.reserved == other.reserved
    }
}

impl<K> Eq for Handle<K>
{
}

impl<K> fmt::Debug for Handle<K>
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        f.debug_struct("Handle")
            .field("id", &self.id)
            .field("reserved", &self.reserved)
            .finish()
    }
}

impl MemoryManager
{
    /// Append the payload of `from` to `into` and delete `from`.
    ///
    /// The last `overlay` bytes of `into` are overwritten.
    /// References recorded on `from` are carried over to `into`.
    /// Appending an object to itself doubles it and deletes nothing.
    fn concatenate_objects(&mut self, into: ObjectId, from: ObjectId, overlay: u32)
        -> Result<(), MemoryError>
    {
        let tail = self.heap.payload(from)?.to_vec();

        // Keep `from` alive in case `into` has to grow through a collection.
        self.heap.with_pin(from, |heap| heap.expand(into, &tail, overlay))?;

        if into != from {
            self.heap.merge_refs(into, from)?;
            self.heap.delete(from)?;
        }
        Ok(())
    }
}
