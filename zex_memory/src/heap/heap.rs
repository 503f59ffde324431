use crate::config::HeapConfig;
use crate::error::HeapError;
use super::HeapObject;
use super::ObjectId;
use super::ObjectTable;
use super::Pool;

use alloc::vec::Vec;

/// Garbage collected heap of strings and lists.
///
/// The heap owns the pool, the object table and the bump cursor.
/// Objects are allocated at the cursor;
/// space is reclaimed only by compaction,
/// which runs when an allocation would reach the end of the pool.
pub struct Heap
{
    pub (super) pool: Pool,

    /// Everything at or above the cursor is free.
    pub (super) cursor: u32,

    pub (super) table: ObjectTable,

    /// Anchor of the mark phase.
    pub (super) root: ObjectId,

    config: HeapConfig,
}

impl Heap
{
    // Looking for allocation and garbage collection?
    // Those can be found in the `alloc` and `collect` modules.

    /// Create an empty heap.
    pub fn new(config: HeapConfig) -> Self
    {
        Self{
            pool: Pool::new(config.pool_size),
            cursor: 0,
            table: ObjectTable::new(config.max_objects),
            root: ObjectId::DEFAULT_ROOT,
            config,
        }
    }

    /// Destroy all objects and start over with a fresh pool.
    pub fn reset(&mut self)
    {
        *self = Self::new(self.config);
    }

    #[allow(missing_docs)]
    pub fn config(&self) -> HeapConfig
    {
        self.config
    }

    /// Capacity of the pool in bytes.
    pub fn capacity(&self) -> u32
    {
        self.pool.capacity()
    }

    /// Offset of the next allocation.
    pub fn cursor(&self) -> u32
    {
        self.cursor
    }

    /// Object from which the mark phase starts.
    pub fn root(&self) -> ObjectId
    {
        self.root
    }

    /// Designate the object from which the next mark phase starts.
    ///
    /// The object need not exist yet.
    /// If it does not exist when a collection runs,
    /// only pinned objects survive.
    pub fn set_root(&mut self, id: ObjectId)
    {
        self.root = id;
    }

    /// Number of objects on the heap.
    pub fn len(&self) -> usize
    {
        self.table.len()
    }

    #[allow(missing_docs)]
    pub fn is_empty(&self) -> bool
    {
        self.table.is_empty()
    }

    #[allow(missing_docs)]
    pub fn contains(&self, id: ObjectId) -> bool
    {
        self.table.contains(id)
    }

    /// Look up the metadata of an object.
    pub fn object(&self, id: ObjectId) -> Result<&HeapObject, HeapError>
    {
        self.table.lookup(id)
    }

    /// All objects in ascending id order.
    pub fn objects(&self) -> impl Iterator<Item=(ObjectId, &HeapObject)>
    {
        self.table.iter()
    }

    /// Ids that the next allocations will reuse, the next one last.
    pub fn free_ids(&self) -> &[ObjectId]
    {
        self.table.free_ids()
    }

    /// Borrow the payload of an object.
    ///
    /// The slice reflects the object's current position and length.
    /// It cannot outlive an operation that moves objects,
    /// so look it up again after any allocation.
    pub fn payload(&self, id: ObjectId) -> Result<&[u8], HeapError>
    {
        let object = self.table.lookup(id)?;
        let (position, length) = (object.position, object.length);
        self.pool.get(position, length).ok_or(Self::outside_pool(id, length))
    }

    /// Mutably borrow the payload of an object.
    pub fn payload_mut(&mut self, id: ObjectId) -> Result<&mut [u8], HeapError>
    {
        let object = self.table.lookup(id)?;
        let (position, length) = (object.position, object.length);
        self.pool.get_mut(position, length).ok_or(Self::outside_pool(id, length))
    }

    /// Borrow `size` bytes of an object starting at `offset`.
    pub fn read(&self, id: ObjectId, offset: u32, size: u32)
        -> Result<&[u8], HeapError>
    {
        let payload = self.payload(id)?;
        let length = payload.len() as u32;
        let range = Self::range(id, offset, size, length)?;
        Ok(&payload[range])
    }

    /// Overwrite bytes of an object starting at `offset`.
    pub fn write(&mut self, id: ObjectId, offset: u32, data: &[u8])
        -> Result<(), HeapError>
    {
        let payload = self.payload_mut(id)?;
        let length = payload.len() as u32;
        let size = u32::try_from(data.len()).unwrap_or(u32::MAX);
        let range = Self::range(id, offset, size, length)?;
        payload[range].copy_from_slice(data);
        Ok(())
    }

    fn outside_pool(id: ObjectId, length: u32) -> HeapError
    {
        HeapError::OutOfBounds{id, offset: 0, size: length, length}
    }

    fn range(id: ObjectId, offset: u32, size: u32, length: u32)
        -> Result<core::ops::Range<usize>, HeapError>
    {
        match offset.checked_add(size) {
            Some(end) if end <= length => Ok(offset as usize .. end as usize),
            _ => Err(HeapError::OutOfBounds{id, offset, size, length}),
        }
    }

    /// Delete an object.
    ///
    /// Its bytes become free at the next compaction,
    /// unless the object sits at the top of the pool,
    /// in which case the cursor retracts right away.
    pub fn delete(&mut self, id: ObjectId) -> Result<(), HeapError>
    {
        let object = self.table.remove(id).ok_or(HeapError::UnknownId(id))?;
        if object.end() == self.cursor {
            self.cursor = object.position;
        }
        Ok(())
    }

    /// Record that `owner` references `target`.
    ///
    /// Both objects must exist.
    pub fn add_ref(&mut self, owner: ObjectId, target: ObjectId)
        -> Result<(), HeapError>
    {
        if !self.table.contains(target) {
            return Err(HeapError::UnknownId(target));
        }
        self.table.lookup_mut(owner)?.add_element(target);
        Ok(())
    }

    /// Forget that `owner` references `target`.
    ///
    /// The target need not exist any more,
    /// and removing a reference that was never added does nothing.
    pub fn remove_ref(&mut self, owner: ObjectId, target: ObjectId)
        -> Result<(), HeapError>
    {
        self.table.lookup_mut(owner)?.remove_element(target);
        Ok(())
    }

    /// Copy the references of `from` into `into`.
    pub fn merge_refs(&mut self, into: ObjectId, from: ObjectId)
        -> Result<(), HeapError>
    {
        let elements = self.table.lookup(from)?.elements().to_vec();
        let into = self.table.lookup_mut(into)?;
        for element in elements {
            into.add_element(element);
        }
        Ok(())
    }

    /// Check the layout invariants of the heap.
    ///
    /// Every object must lie below the cursor,
    /// and no two objects may share a byte.
    pub fn is_consistent(&self) -> bool
    {
        if self.cursor > self.capacity() {
            return false;
        }

        let mut ranges: Vec<(u32, u32)> = self.table.iter()
            .map(|(_, o)| (o.position, o.end()))
            .filter(|&(start, end)| start != end)
            .collect();
        ranges.sort_unstable();

        let in_bounds = ranges.iter().all(|&(_, end)| end <= self.cursor);
        let disjoint = ranges.windows(2).all(|w| w[0].1 <= w[1].0);
        in_bounds && disjoint
    }
}
