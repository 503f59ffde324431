use crate::error::MemoryError;
use crate::register::REGISTER_SIZE;
use crate::register::Register;
use super::MemoryManager;

/// Methods for using the operand stack.
impl MemoryManager
{
    /// Size of the stack in bytes.
    pub fn stack_size(&self) -> u32
    {
        self.stack.len() as u32
    }

    /// Number of registers on the stack.
    pub fn stack_depth(&self) -> u32
    {
        self.stack_pointer / REGISTER_SIZE
    }

    #[allow(missing_docs)]
    pub fn push(&mut self, value: Register) -> Result<(), MemoryError>
    {
        let start = self.stack_pointer as usize;
        let end = start + REGISTER_SIZE as usize;
        if end > self.stack.len() {
            return Err(MemoryError::StackOverflow);
        }
        self.stack[start .. end].copy_from_slice(&value.to_bytes());
        self.stack_pointer += REGISTER_SIZE;
        Ok(())
    }

    #[allow(missing_docs)]
    pub fn pop(&mut self) -> Result<Register, MemoryError>
    {
        let value = self.peek(0)?;
        self.stack_pointer -= REGISTER_SIZE;
        Ok(value)
    }

    /// Read a register without popping it.
    ///
    /// Depth 0 is the top of the stack.
    pub fn peek(&self, depth: u32) -> Result<Register, MemoryError>
    {
        let offset = depth.checked_add(1)
            .and_then(|slots| slots.checked_mul(REGISTER_SIZE))
            .filter(|&offset| offset <= self.stack_pointer)
            .ok_or(MemoryError::StackUnderflow)?;
        let start = (self.stack_pointer - offset) as usize;
        Ok(Register::read_from(&self.stack[start ..]))
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::memory::tests::manager;

    #[test]
    fn last_in_first_out()
    {
        let mut memory = manager(64);
        memory.push(Register::from_int(1)).unwrap();
        memory.push(Register::from_int(2)).unwrap();
        assert_eq!(memory.stack_depth(), 2);
        assert_eq!(memory.peek(0), Ok(Register::from_int(2)));
        assert_eq!(memory.peek(1), Ok(Register::from_int(1)));
        assert_eq!(memory.peek(2), Err(MemoryError::StackUnderflow));
        assert_eq!(memory.pop(), Ok(Register::from_int(2)));
        assert_eq!(memory.pop(), Ok(Register::from_int(1)));
        assert_eq!(memory.pop(), Err(MemoryError::StackUnderflow));
        assert_eq!(memory.peek(u32::MAX), Err(MemoryError::StackUnderflow));
    }

    #[test]
    fn overflow()
    {
        let mut memory = manager(64);
        for i in 0 .. 8 {
            memory.push(Register::from_int(i)).unwrap();
        }
        assert_eq!(memory.push(Register::ZERO), Err(MemoryError::StackOverflow));
        assert_eq!(memory.stack_depth(), 8);
        assert_eq!(memory.peek(0), Ok(Register::from_int(7)));
    }
}
