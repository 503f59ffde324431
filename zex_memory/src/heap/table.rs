use crate::error::HeapError;

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use bitflags::bitflags;
use core::fmt;

/// Stable handle of an object on the heap.
///
/// The id of an object never changes, even when the garbage collector
/// moves the object within the pool.
/// Ids of deleted objects are recycled by later allocations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(pub u32);

impl ObjectId
{
    /// The root used until another one is registered.
    pub const DEFAULT_ROOT: Self = Self(0);
}

impl fmt::Display for ObjectId
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        write!(f, "#{}", self.0)
    }
}

bitflags!
{
    /// Various flags that an object may have.
    pub struct Flags: u8
    {
        /// Used during a garbage collection cycle.
        ///
        /// Specifically, set on objects that are reachable from the root
        /// or from a pinned object.
        /// Does not persist outside of garbage collection cycles.
        const REACHABLE = 1 << 0;

        /// As long as an object has this flag,
        /// the garbage collector will not destroy it.
        /// The object may still be relocated.
        const PINNED = 1 << 1;
    }
}

/// Metadata of an object on the heap.
#[derive(Clone, Debug)]
pub struct HeapObject
{
    /// Offset of the first payload byte in the pool.
    pub position: u32,

    /// Number of payload bytes.
    pub length: u32,

    /// See [`Flags`].
    pub flags: Flags,

    /// Objects referenced by this object.
    ///
    /// These are the edges followed by the mark phase.
    /// They are not reference counts; each target appears at most once.
    elements: Vec<ObjectId>,
}

impl HeapObject
{
    fn new(position: u32, length: u32) -> Self
    {
        Self{position, length, flags: Flags::empty(), elements: Vec::new()}
    }

    /// One past the last payload byte.
    #[inline]
    pub fn end(&self) -> u32
    {
        self.position + self.length
    }

    #[allow(missing_docs)]
    #[inline]
    pub fn is_reachable(&self) -> bool
    {
        self.flags.contains(Flags::REACHABLE)
    }

    #[allow(missing_docs)]
    #[inline]
    pub fn is_pinned(&self) -> bool
    {
        self.flags.contains(Flags::PINNED)
    }

    /// Objects referenced by this object, in insertion order.
    pub fn elements(&self) -> &[ObjectId]
    {
        &self.elements
    }

    /// Record a reference to another object.
    ///
    /// Adding a reference that is already present does nothing.
    pub fn add_element(&mut self, id: ObjectId)
    {
        if !self.elements.contains(&id) {
            self.elements.push(id);
        }
    }

    /// Forget a reference to another object.
    ///
    /// Returns whether the reference was present.
    pub fn remove_element(&mut self, id: ObjectId) -> bool
    {
        let index = self.elements.iter().position(|&e| e == id);
        match index {
            Some(index) => { self.elements.remove(index); true },
            None => false,
        }
    }
}

/// Mapping from object ids to object metadata.
///
/// The table also owns id allocation.
/// Freed ids are reused last-in, first-out;
/// fresh ids come from a counter that starts at zero.
pub struct ObjectTable
{
    objects: BTreeMap<ObjectId, HeapObject>,
    free_ids: Vec<ObjectId>,
    next_id: u32,
    max_objects: u32,
}

impl ObjectTable
{
    /// Create an empty table that hands out at most `max_objects` ids.
    pub fn new(max_objects: u32) -> Self
    {
        Self{
            objects: BTreeMap::new(),
            free_ids: Vec::new(),
            next_id: 0,
            max_objects,
        }
    }

    /// Remove all objects and forget all ids.
    pub fn clear(&mut self)
    {
        self.objects.clear();
        self.free_ids.clear();
        self.next_id = 0;
    }

    #[allow(missing_docs)]
    pub fn len(&self) -> usize
    {
        self.objects.len()
    }

    #[allow(missing_docs)]
    pub fn is_empty(&self) -> bool
    {
        self.objects.is_empty()
    }

    #[allow(missing_docs)]
    pub fn contains(&self, id: ObjectId) -> bool
    {
        self.objects.contains_key(&id)
    }

    #[allow(missing_docs)]
    pub fn get(&self, id: ObjectId) -> Option<&HeapObject>
    {
        self.objects.get(&id)
    }

    #[allow(missing_docs)]
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut HeapObject>
    {
        self.objects.get_mut(&id)
    }

    /// Like [`get`][`Self::get`], but a missing object is an error.
    pub fn lookup(&self, id: ObjectId) -> Result<&HeapObject, HeapError>
    {
        self.get(id).ok_or(HeapError::UnknownId(id))
    }

    /// Like [`get_mut`][`Self::get_mut`], but a missing object is an error.
    pub fn lookup_mut(&mut self, id: ObjectId)
        -> Result<&mut HeapObject, HeapError>
    {
        self.get_mut(id).ok_or(HeapError::UnknownId(id))
    }

    /// Objects in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item=(ObjectId, &HeapObject)>
    {
        self.objects.iter().map(|(&id, object)| (id, object))
    }

    /// Ids waiting to be reused, the next one last.
    pub fn free_ids(&self) -> &[ObjectId]
    {
        &self.free_ids
    }

    /// Record a new object and assign it an id.
    ///
    /// A recycled id is preferred over a fresh one.
    pub fn insert(&mut self, position: u32, length: u32)
        -> Result<ObjectId, HeapError>
    {
        let id = match self.free_ids.pop() {
            Some(id) => id,
            None if self.next_id < self.max_objects => {
                self.next_id += 1;
                ObjectId(self.next_id - 1)
            },
            None => return Err(HeapError::IdExhausted),
        };
        self.objects.insert(id, HeapObject::new(position, length));
        Ok(id)
    }

    /// Remove an object and make its id available for reuse.
    ///
    /// References to the object are dropped from every other object,
    /// so that whichever object reuses the id is not kept alive by them.
    pub fn remove(&mut self, id: ObjectId) -> Option<HeapObject>
    {
        let object = self.objects.remove(&id)?;
        for other in self.objects.values_mut() {
            other.remove_element(id);
        }
        self.free_ids.push(id);
        Some(object)
    }

    /// Clear the [`REACHABLE`][`Flags::REACHABLE`] flag of every object.
    pub fn clear_marks(&mut self)
    {
        for object in self.objects.values_mut() {
            object.flags.remove(Flags::REACHABLE);
        }
    }

    /// Remove every object that is not marked reachable.
    ///
    /// Ids are recycled in ascending order.
    /// Returns the number of removed objects.
    pub fn sweep(&mut self) -> usize
    {
        let free_ids = &mut self.free_ids;
        let before = self.objects.len();
        self.objects.retain(|&id, object| {
            let keep = object.is_reachable();
            if !keep {
                free_ids.push(id);
            }
            keep
        });
        before - self.objects.len()
    }
}
