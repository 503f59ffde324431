use crate::error::HeapError;
use super::Heap;
use super::ObjectId;

impl Heap
{
    /// Reserve `length` bytes at the cursor and advance the cursor.
    ///
    /// If the reservation would reach the end of the pool,
    /// the heap is compacted first.
    /// Returns the position of the reserved bytes.
    pub (super) fn reserve(&mut self, length: u32) -> Result<u32, HeapError>
    {
        let fits = self.cursor.checked_add(length)
            .map_or(false, |end| end < self.capacity());
        if !fits {
            self.compact(length)?;
        }
        let position = self.cursor;
        self.cursor += length;
        Ok(position)
    }

    /// Allocate a zeroed object of the given length.
    ///
    /// Allocation may trigger a collection,
    /// which destroys every object that is neither reachable from the root
    /// nor pinned, and moves every other object.
    pub fn allocate(&mut self, length: u32) -> Result<ObjectId, HeapError>
    {
        let position = self.reserve(length)?;
        let id = match self.table.insert(position, length) {
            Ok(id) => id,
            Err(error) => {
                self.cursor = position;
                return Err(error);
            },
        };
        self.payload_mut(id)?.fill(0);
        Ok(id)
    }

    /// Allocate an object holding a copy of the given bytes.
    pub fn allocate_from(&mut self, data: &[u8]) -> Result<ObjectId, HeapError>
    {
        let length = self.request_size(data.len())?;
        let id = self.allocate(length)?;
        self.payload_mut(id)?.copy_from_slice(data);
        Ok(id)
    }

    /// Allocate a copy of an existing object, including its references.
    ///
    /// The original is pinned while the copy is allocated.
    pub fn duplicate(&mut self, id: ObjectId) -> Result<ObjectId, HeapError>
    {
        let length = self.table.lookup(id)?.length;
        let copy = self.with_pin(id, |heap| heap.allocate(length))?;
        let from = self.table.lookup(id)?.position;
        let to = self.table.lookup(copy)?.position;
        self.pool.copy_within(from, length, to);
        self.merge_refs(copy, id)?;
        Ok(copy)
    }

    /// Append bytes to an object, keeping its id.
    ///
    /// The last `overlay` bytes of the object are dropped
    /// before `data` is appended;
    /// strings use this to overwrite their terminator.
    ///
    /// An object at the top of the pool grows in place.
    /// Any other object is moved to a new region at the top of the pool,
    /// after which it will grow in place on the next expansion.
    pub fn expand(&mut self, id: ObjectId, data: &[u8], overlay: u32)
        -> Result<(), HeapError>
    {
        let object = self.table.lookup(id)?;
        let (end, length) = (object.end(), object.length);

        let retained = length.checked_sub(overlay)
            .ok_or(HeapError::OverlayTooLarge{id, overlay, length})?;
        let extra = self.request_size(data.len())?;
        let new_length = retained.checked_add(extra)
            .ok_or_else(|| self.exhausted(data.len()))?;

        if end == self.cursor {
            self.grow_in_place(id, new_length)?;
        } else {
            self.relocate(id, retained, new_length)?;
        }

        self.write(id, retained, data)
    }

    /// Change the length of the topmost object by moving the cursor.
    fn grow_in_place(&mut self, id: ObjectId, new_length: u32)
        -> Result<(), HeapError>
    {
        let length = self.table.lookup(id)?.length;
        if new_length > length {
            let growth = new_length - length;
            let fits = self.cursor.checked_add(growth)
                .map_or(false, |end| end < self.capacity());
            if !fits {
                // Compaction keeps relative order,
                // so the object is still on top afterwards.
                self.with_pin(id, |heap| heap.compact(growth))?;
            }
        }

        let object = self.table.lookup_mut(id)?;
        object.length = new_length;
        self.cursor = object.end();
        Ok(())
    }

    /// Move an object to the top of the pool with a new length,
    /// carrying over its first `retained` bytes.
    fn relocate(&mut self, id: ObjectId, retained: u32, new_length: u32)
        -> Result<(), HeapError>
    {
        let to = self.with_pin(id, |heap| heap.reserve(new_length))?;

        let object = self.table.lookup_mut(id)?;
        let from = object.position;
        object.position = to;
        object.length = new_length;

        self.pool.copy_within(from, retained, to);
        Ok(())
    }

    fn request_size(&self, size: usize) -> Result<u32, HeapError>
    {
        u32::try_from(size).map_err(|_| self.exhausted(size))
    }

    fn exhausted(&self, requested: usize) -> HeapError
    {
        HeapError::PoolExhausted{requested, capacity: self.capacity()}
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::config::HeapConfig;

    use proptest::collection::vec as pvec;
    use proptest::prop_assume;
    use proptest::proptest;

    fn heap(pool_size: u32) -> Heap
    {
        Heap::new(HeapConfig::with_pool_size(pool_size))
    }

    #[test]
    fn bump_allocation_with_recycled_ids()
    {
        let mut heap = heap(64);

        let hi = heap.allocate_from(b"hi\0").unwrap();
        assert_eq!(hi, ObjectId(0));
        assert_eq!(heap.object(hi).unwrap().position, 0);
        assert_eq!(heap.cursor(), 3);

        let bye = heap.allocate_from(b"bye\0").unwrap();
        assert_eq!(bye, ObjectId(1));
        assert_eq!(heap.object(bye).unwrap().position, 3);
        assert_eq!(heap.cursor(), 7);

        heap.delete(hi).unwrap();
        let yo = heap.allocate_from(b"yo\0").unwrap();
        assert_eq!(yo, ObjectId(0));
        assert_eq!(heap.object(yo).unwrap().position, 7);
        assert_eq!(heap.cursor(), 10);

        heap.set_root(bye);
        heap.collect().unwrap();
        assert_eq!(heap.object(bye).unwrap().position, 0);
        assert_eq!(heap.payload(bye), Ok(&b"bye\0"[..]));
        assert_eq!(heap.cursor(), 4);
        assert!(!heap.contains(yo));
        assert_eq!(heap.free_ids(), &[yo]);
    }

    #[test]
    fn allocation_compacts_when_full()
    {
        let mut heap = heap(16);
        let root = heap.allocate_from(&[1; 4]).unwrap();
        let garbage = heap.allocate_from(&[2; 8]).unwrap();
        assert_eq!(heap.cursor(), 12);

        let fresh = heap.allocate_from(&[3; 8]).unwrap();
        assert_eq!(fresh, garbage);
        assert_eq!(heap.object(fresh).unwrap().position, 4);
        assert_eq!(heap.payload(root), Ok(&[1; 4][..]));
        assert_eq!(heap.payload(fresh), Ok(&[3; 8][..]));
        assert_eq!(heap.cursor(), 12);
    }

    #[test]
    fn allocation_fails_when_live_data_does_not_fit()
    {
        let mut heap = heap(16);
        let root = heap.allocate_from(&[1; 10]).unwrap();
        assert_eq!(
            heap.allocate(7),
            Err(HeapError::PoolExhausted{requested: 7, capacity: 16}),
        );
        assert_eq!(heap.payload(root), Ok(&[1; 10][..]));
        assert_eq!(heap.cursor(), 10);
        assert_eq!(heap.len(), 1);

        // Filling the pool to the last byte is allowed.
        assert!(heap.allocate(6).is_ok());
        assert_eq!(heap.cursor(), 16);
    }

    #[test]
    fn id_exhaustion_releases_reservation()
    {
        let mut heap = Heap::new(HeapConfig{pool_size: 64, max_objects: 1});
        heap.allocate(4).unwrap();
        assert_eq!(heap.allocate(4), Err(HeapError::IdExhausted));
        assert_eq!(heap.cursor(), 4);
    }

    #[test]
    fn expand_topmost_in_place()
    {
        let mut heap = heap(64);
        let a = heap.allocate_from(b"ab\0").unwrap();
        heap.expand(a, b"cd\0", 1).unwrap();
        assert_eq!(heap.object(a).unwrap().position, 0);
        assert_eq!(heap.payload(a), Ok(&b"abcd\0"[..]));
        assert_eq!(heap.cursor(), 5);
    }

    #[test]
    fn expand_buried_object_moves_it_to_the_top()
    {
        let mut heap = heap(64);
        let a = heap.allocate_from(b"ab\0").unwrap();
        let b = heap.allocate_from(b"xyz\0").unwrap();
        heap.add_ref(a, b).unwrap();

        heap.expand(a, b"cd\0", 1).unwrap();
        let object = heap.object(a).unwrap();
        assert_eq!(object.position, 7);
        assert_eq!(object.elements(), &[b]);
        assert_eq!(heap.payload(a), Ok(&b"abcd\0"[..]));
        assert_eq!(heap.payload(b), Ok(&b"xyz\0"[..]));
        assert_eq!(heap.cursor(), 12);
        assert!(heap.is_consistent());

        // Now on top, the next expansion happens in place.
        heap.expand(a, b"e\0", 1).unwrap();
        assert_eq!(heap.object(a).unwrap().position, 7);
        assert_eq!(heap.payload(a), Ok(&b"abcde\0"[..]));
    }

    #[test]
    fn expand_can_shrink()
    {
        let mut heap = heap(64);
        let a = heap.allocate_from(b"hello\0").unwrap();
        heap.expand(a, b"x\0", 6).unwrap();
        assert_eq!(heap.payload(a), Ok(&b"x\0"[..]));
        assert_eq!(heap.cursor(), 2);
    }

    #[test]
    fn expand_rejects_large_overlay()
    {
        let mut heap = heap(64);
        let a = heap.allocate_from(b"ab").unwrap();
        assert_eq!(
            heap.expand(a, b"c", 3),
            Err(HeapError::OverlayTooLarge{id: a, overlay: 3, length: 2}),
        );
        assert_eq!(heap.payload(a), Ok(&b"ab"[..]));
    }

    #[test]
    fn expand_unreachable_topmost_object_survives_compaction()
    {
        let mut heap = heap(16);
        heap.set_root(ObjectId(99));
        let a = heap.allocate_from(&[1; 4]).unwrap();
        let b = heap.allocate_from(&[2; 8]).unwrap();

        heap.expand(b, &[3; 4], 0).unwrap();
        assert!(!heap.contains(a));
        assert_eq!(heap.object(b).unwrap().position, 0);
        assert_eq!(heap.payload(b), Ok(&[2, 2, 2, 2, 2, 2, 2, 2, 3, 3, 3, 3][..]));
        assert!(!heap.object(b).unwrap().is_pinned());
    }

    #[test]
    fn duplicate_copies_bytes_and_references()
    {
        let mut heap = heap(64);
        let a = heap.allocate_from(b"abc").unwrap();
        let b = heap.allocate_from(b"d").unwrap();
        heap.add_ref(a, b).unwrap();

        let c = heap.duplicate(a).unwrap();
        assert_ne!(c, a);
        assert_eq!(heap.payload(c), Ok(&b"abc"[..]));
        assert_eq!(heap.object(c).unwrap().elements(), &[b]);

        heap.write(c, 0, b"x").unwrap();
        assert_eq!(heap.payload(a), Ok(&b"abc"[..]));
    }

    proptest!
    {
        #[test]
        fn expand_matches_fresh_allocation(
            head in pvec(0u8 .. 255, 1 .. 32),
            tail in pvec(0u8 .. 255, 0 .. 32),
            overlay in 0usize .. 4,
        )
        {
            prop_assume!(overlay <= head.len());

            let mut expected = head[.. head.len() - overlay].to_vec();
            expected.extend_from_slice(&tail);

            let mut grown = heap(128);
            let a = grown.allocate_from(&head).unwrap();
            grown.expand(a, &tail, overlay as u32).unwrap();

            let mut fresh = heap(128);
            let b = fresh.allocate_from(&expected).unwrap();

            assert_eq!(grown.payload(a).unwrap(), fresh.payload(b).unwrap());
            assert_eq!(grown.cursor(), fresh.cursor());
            assert!(grown.is_consistent());
        }
    }
}
