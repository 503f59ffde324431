use super::Flags;
use super::Heap;
use super::ObjectId;

use scopeguard::guard;

impl Heap
{
    /// Pin an object and pass the heap to the given function.
    ///
    /// A pinned object is never destroyed by the garbage collector,
    /// even if it is not reachable from the root.
    /// It may still be moved, so its position must be looked up again
    /// after `then` has allocated anything.
    ///
    /// The object is unpinned as soon as `then` returns or panics,
    /// unless it was already pinned before.
    /// Pinning an object that does not exist does nothing.
    pub fn with_pin<F, R>(&mut self, id: ObjectId, then: F) -> R
        where F: FnOnce(&mut Heap) -> R
    {
        let newly_pinned = match self.table.get_mut(id) {
            Some(object) if !object.is_pinned() => {
                object.flags.insert(Flags::PINNED);
                true
            },
            _ => false,
        };

        let mut heap = guard(self, move |heap: &mut Heap| {
            if newly_pinned {
                if let Some(object) = heap.table.get_mut(id) {
                    object.flags.remove(Flags::PINNED);
                }
            }
        });

        then(&mut **heap)
    }
}
