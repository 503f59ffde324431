use crate::error::MemoryError;
use crate::register::REGISTER_SIZE;
use crate::register::Register;
use super::MemoryManager;

use core::ops::Range;

/// Methods for accessing flat memory.
impl MemoryManager
{
    #[allow(missing_docs)]
    pub fn memory_size(&self) -> u32
    {
        self.memory.len() as u32
    }

    /// All of flat memory.
    pub fn memory(&self) -> &[u8]
    {
        &self.memory
    }

    /// Borrow `size` bytes of flat memory.
    pub fn read_bytes(&self, address: u32, size: u32) -> Result<&[u8], MemoryError>
    {
        let range = region(&self.memory, address, size)?;
        Ok(&self.memory[range])
    }

    /// Copy bytes into flat memory, as when loading a constant pool.
    pub fn load_bytes(&mut self, address: u32, bytes: &[u8]) -> Result<(), MemoryError>
    {
        let size = u32::try_from(bytes.len()).unwrap_or(u32::MAX);
        let range = region(&self.memory, address, size)?;
        self.memory[range].copy_from_slice(bytes);
        Ok(())
    }

    #[allow(missing_docs)]
    pub fn read_byte_at(&self, address: u32) -> Result<u8, MemoryError>
    {
        Ok(self.read_bytes(address, 1)?[0])
    }

    #[allow(missing_docs)]
    pub fn write_byte_at(&mut self, address: u32, byte: u8) -> Result<(), MemoryError>
    {
        self.load_bytes(address, &[byte])
    }

    /// Read the register stored at `address`.
    pub fn read_register(&self, address: u32) -> Result<Register, MemoryError>
    {
        Ok(Register::read_from(self.read_bytes(address, REGISTER_SIZE)?))
    }

    /// Store a register at `address`.
    pub fn write_register(&mut self, address: u32, value: Register)
        -> Result<(), MemoryError>
    {
        self.load_bytes(address, &value.to_bytes())
    }
}

/// Range of `size` bytes at `address`, if it lies inside `memory`.
pub (crate) fn region(memory: &[u8], address: u32, size: u32)
    -> Result<Range<usize>, MemoryError>
{
    let start = address as usize;
    match start.checked_add(size as usize) {
        Some(end) if end <= memory.len() => Ok(start .. end),
        _ => Err(MemoryError::OutOfBounds{address, size}),
    }
}

/// The zero-terminated string at `address`, including its terminator.
pub (crate) fn terminated(memory: &[u8], address: u32)
    -> Result<&[u8], MemoryError>
{
    let rest = memory.get(address as usize ..)
        .ok_or(MemoryError::OutOfBounds{address, size: 1})?;
    let length = rest.iter().position(|&b| b == 0)
        .ok_or(MemoryError::MissingTerminator{address})?;
    Ok(&rest[..= length])
}
