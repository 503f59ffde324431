use crate::error::MemoryError;
use crate::memory::MemoryManager;
use crate::memory::region;
use crate::register::REGISTER_SIZE;
use crate::register::Register;
use super::ListHandle;

use alloc::vec::Vec;

/// Methods for creating and using lists.
impl MemoryManager
{
    /// Create a list from `count` registers stored at `address`
    /// in flat memory.
    pub fn create_list(&mut self, address: u32, count: u32)
        -> Result<ListHandle, MemoryError>
    {
        let size = count.checked_mul(REGISTER_SIZE)
            .ok_or(MemoryError::OutOfBounds{address, size: u32::MAX})?;
        let range = region(&self.memory, address, size)?;
        let id = self.heap.allocate_from(&self.memory[range])?;
        Ok(ListHandle::new(id, count))
    }

    /// Create a list holding the given registers.
    pub fn create_list_from_slots(&mut self, slots: &[Register])
        -> Result<ListHandle, MemoryError>
    {
        let bytes: Vec<u8> = slots.iter().flat_map(|s| s.to_bytes()).collect();
        let id = self.heap.allocate_from(&bytes)?;
        Ok(ListHandle::new(id, slots.len() as u32))
    }

    #[allow(missing_docs)]
    pub fn delete_list(&mut self, list: ListHandle) -> Result<(), MemoryError>
    {
        Ok(self.heap.delete(list.id)?)
    }

    /// Number of slots in the list.
    pub fn list_length(&self, list: ListHandle) -> Result<u32, MemoryError>
    {
        Ok(self.heap.object(list.id)?.length / REGISTER_SIZE)
    }

    /// Read the slot at `index`.
    pub fn list_get(&self, list: ListHandle, index: u32)
        -> Result<Register, MemoryError>
    {
        let offset = self.slot_offset(list, index)?;
        Ok(Register::read_from(self.heap.read(list.id, offset, REGISTER_SIZE)?))
    }

    /// Overwrite the slot at `index`.
    ///
    /// Storing a handle in a list does not record a reference;
    /// use [`add_reference`][`Self::add_reference`] for that.
    pub fn list_set(&mut self, list: ListHandle, index: u32, value: Register)
        -> Result<(), MemoryError>
    {
        let offset = self.slot_offset(list, index)?;
        Ok(self.heap.write(list.id, offset, &value.to_bytes())?)
    }

    fn slot_offset(&self, list: ListHandle, index: u32) -> Result<u32, MemoryError>
    {
        let length = self.list_length(list)?;
        if index < length {
            Ok(index * REGISTER_SIZE)
        } else {
            Err(MemoryError::IndexOutOfBounds{index, length})
        }
    }

    /// Whether two lists hold the same registers.
    pub fn list_compare(&self, a: ListHandle, b: ListHandle)
        -> Result<bool, MemoryError>
    {
        let a = self.heap.payload(a.id)?;
        let b = self.heap.payload(b.id)?;
        Ok(a == b)
    }

    /// Append the slots of `b` to `a` and delete `b`.
    ///
    /// `a` keeps its id and takes over the references recorded on `b`.
    pub fn list_concatenate(&mut self, a: &mut ListHandle, b: ListHandle)
        -> Result<(), MemoryError>
    {
        self.concatenate_objects(a.id, b.id, 0)?;
        a.reserved = self.list_length(*a)?;
        Ok(())
    }

    /// Create a new list with the same slots and references.
    pub fn list_copy(&mut self, list: ListHandle)
        -> Result<ListHandle, MemoryError>
    {
        let id = self.heap.duplicate(list.id)?;
        Ok(ListHandle::new(id, self.list_length(list)?))
    }

    /// Copy all slots of the list to `address` in flat memory.
    pub fn list_to_memory(&mut self, list: ListHandle, address: u32)
        -> Result<(), MemoryError>
    {
        let slots = self.heap.payload(list.id)?;
        let range = region(&self.memory, address, slots.len() as u32)?;
        self.memory[range].copy_from_slice(slots);
        Ok(())
    }
}
