use crate::error::HeapError;
use super::Flags;
use super::Heap;
use super::ObjectId;
use super::Pool;

use alloc::vec::Vec;
use scopeguard::guard;

impl Heap
{
    /// Collect all garbage now.
    ///
    /// Collections normally run only when an allocation does not fit.
    pub fn collect(&mut self) -> Result<(), HeapError>
    {
        self.compact(0)
    }

    /// Mark every object that is reachable from the root
    /// or from a pinned object.
    ///
    /// References to objects that no longer exist are skipped.
    /// The traversal uses an explicit worklist,
    /// so deep reference chains cannot overflow the call stack,
    /// and an object that is already marked is not visited again,
    /// so cycles terminate.
    pub (super) fn trace(&mut self)
    {
        self.table.clear_marks();

        let mut worklist: Vec<ObjectId> = self.table.iter()
            .filter(|(_, object)| object.is_pinned())
            .map(|(id, _)| id)
            .collect();
        worklist.push(self.root);

        while let Some(id) = worklist.pop() {
            let object = match self.table.get_mut(id) {
                Some(object) if !object.is_reachable() => object,
                _ => continue,
            };
            object.flags.insert(Flags::REACHABLE);
            worklist.extend_from_slice(object.elements());
        }
    }

    /// Mark, then move all marked objects into a fresh pool
    /// and destroy all unmarked objects.
    ///
    /// Survivors keep their relative order in the pool.
    /// If the survivors and `request` more bytes would not fit,
    /// nothing is destroyed or moved and the heap is left as it was.
    pub (super) fn compact(&mut self, request: u32) -> Result<(), HeapError>
    {
        log::trace!(
            "collecting: {} objects, cursor {}, {} bytes requested",
            self.table.len(), self.cursor, request,
        );

        self.trace();

        // Marks do not outlive the cycle, whatever its outcome.
        let mut this = guard(self, |heap: &mut Heap| heap.table.clear_marks());
        let heap = &mut **this;

        let mut survivors: Vec<(u32, ObjectId, u32)> = heap.table.iter()
            .filter(|(_, object)| object.is_reachable())
            .map(|(id, object)| (object.position, id, object.length))
            .collect();
        survivors.sort_unstable();

        let live: u64 = survivors.iter().map(|s| u64::from(s.2)).sum();
        let capacity = heap.capacity();
        if live + u64::from(request) > u64::from(capacity) {
            log::warn!(
                "heap exhausted: {} live bytes, {} requested, capacity {}",
                live, request, capacity,
            );
            return Err(HeapError::PoolExhausted{
                requested: request as usize,
                capacity,
            });
        }

        let mut fresh = Pool::new(capacity);
        let mut cursor = 0;
        for &(from, id, length) in &survivors {
            fresh.copy_from(&heap.pool, from, length, cursor);
            if let Some(object) = heap.table.get_mut(id) {
                object.position = cursor;
            }
            cursor += length;
        }

        let swept = heap.table.sweep();
        heap.pool = fresh;
        heap.cursor = cursor;

        log::debug!(
            "collected: {} objects swept, {} objects in {} live bytes",
            swept, survivors.len(), cursor,
        );
        Ok(())
    }
}
