use crate::error::MemoryError;
use crate::memory::MemoryManager;
use crate::memory::region;
use crate::memory::terminated;
use super::StringHandle;

use alloc::vec::Vec;

/// Bytes taken up by the terminator of a string object.
const TERMINATOR_SIZE: u32 = 1;

/// Methods for creating and using strings.
impl MemoryManager
{
    /// Create a string from the zero-terminated bytes at `address`
    /// in flat memory.
    pub fn create_string(&mut self, address: u32)
        -> Result<StringHandle, MemoryError>
    {
        let text = terminated(&self.memory, address)?;
        let id = self.heap.allocate_from(text)?;
        Ok(StringHandle::new(id, text.len() as u32 - TERMINATOR_SIZE))
    }

    /// Create a string with the given content.
    pub fn create_string_from_bytes(&mut self, content: &[u8])
        -> Result<StringHandle, MemoryError>
    {
        let text = with_terminator(content);
        let id = self.heap.allocate_from(&text)?;
        Ok(StringHandle::new(id, content.len() as u32))
    }

    #[allow(missing_docs)]
    pub fn delete_string(&mut self, string: StringHandle)
        -> Result<(), MemoryError>
    {
        Ok(self.heap.delete(string.id)?)
    }

    /// Number of bytes in the string, not counting the terminator.
    pub fn string_length(&self, string: StringHandle) -> Result<u32, MemoryError>
    {
        let length = self.heap.object(string.id)?.length;
        Ok(length.saturating_sub(TERMINATOR_SIZE))
    }

    /// Content of the string, without the terminator.
    pub fn raw_string(&self, string: StringHandle) -> Result<&[u8], MemoryError>
    {
        let length = self.string_length(string)?;
        Ok(self.heap.read(string.id, 0, length)?)
    }

    /// Read the byte at `index`.
    pub fn read_byte(&self, string: StringHandle, index: u32)
        -> Result<u8, MemoryError>
    {
        self.check_index(string, index)?;
        Ok(self.heap.read(string.id, index, 1)?[0])
    }

    /// Overwrite the byte at `index`.
    ///
    /// The terminator cannot be overwritten.
    pub fn write_byte(&mut self, string: StringHandle, index: u32, byte: u8)
        -> Result<(), MemoryError>
    {
        self.check_index(string, index)?;
        Ok(self.heap.write(string.id, index, &[byte])?)
    }

    fn check_index(&self, string: StringHandle, index: u32)
        -> Result<(), MemoryError>
    {
        let length = self.string_length(string)?;
        if index < length {
            Ok(())
        } else {
            Err(MemoryError::IndexOutOfBounds{index, length})
        }
    }

    /// Whether two strings have the same content.
    pub fn string_compare(&self, a: StringHandle, b: StringHandle)
        -> Result<bool, MemoryError>
    {
        let a = self.heap.payload(a.id)?;
        let b = self.heap.payload(b.id)?;
        Ok(a == b)
    }

    /// Append `b` to `a` and delete `b`.
    ///
    /// `a` keeps its id, and grows in place
    /// if it is the most recent allocation.
    pub fn string_concatenate(&mut self, a: &mut StringHandle, b: StringHandle)
        -> Result<(), MemoryError>
    {
        self.concatenate_objects(a.id, b.id, TERMINATOR_SIZE)?;
        a.reserved = self.string_length(*a)?;
        Ok(())
    }

    /// Create a new string with the same content.
    pub fn string_copy(&mut self, string: StringHandle)
        -> Result<StringHandle, MemoryError>
    {
        let id = self.heap.duplicate(string.id)?;
        Ok(StringHandle::new(id, self.string_length(string)?))
    }

    /// Copy the string, with its terminator, to `address` in flat memory.
    pub fn string_to_memory(&mut self, string: StringHandle, address: u32)
        -> Result<(), MemoryError>
    {
        let text = self.heap.payload(string.id)?;
        let range = region(&self.memory, address, text.len() as u32)?;
        self.memory[range].copy_from_slice(text);
        Ok(())
    }

    /// Replace the content of the string
    /// with the zero-terminated bytes at `address` in flat memory.
    pub fn string_from_memory(&mut self, string: &mut StringHandle, address: u32)
        -> Result<(), MemoryError>
    {
        let length = self.heap.object(string.id)?.length;
        let text = terminated(&self.memory, address)?;
        self.heap.expand(string.id, text, length)?;
        string.reserved = text.len() as u32 - TERMINATOR_SIZE;
        Ok(())
    }

    /// Replace the content of the string.
    pub fn set_raw_string(&mut self, string: &mut StringHandle, content: &[u8])
        -> Result<(), MemoryError>
    {
        let length = self.heap.object(string.id)?.length;
        self.heap.expand(string.id, &with_terminator(content), length)?;
        string.reserved = content.len() as u32;
        Ok(())
    }
}

fn with_terminator(content: &[u8]) -> Vec<u8>
{
    let mut text = Vec::with_capacity(content.len() + 1);
    text.extend_from_slice(content);
    text.push(0);
    text
}
