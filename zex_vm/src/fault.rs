//! Errors that stop the virtual machine.

use zex_memory::error::MemoryError;
use zex_memory::heap::ObjectId;

use thiserror::Error;

/// How a run of the virtual machine ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum ReturnCode
{
    /// An [`End`][`crate::inst::Instruction::End`] instruction was reached.
    Finished = 0,

    /// The program itself is malformed,
    /// or the machine was not reset after an earlier fault.
    ProgramError = 1,

    #[allow(missing_docs)]
    StackError = 2,

    /// A memory or heap operation failed.
    MemoryError = 3,
}

/// Reason the virtual machine stopped early.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum Fault
{
    #[allow(missing_docs)]
    #[error(transparent)]
    Memory(#[from] MemoryError),

    /// A string that should hold a number does not.
    #[error("string {0} does not hold a number")]
    NotNumeric(ObjectId),

    /// A register holds a value that cannot be an address.
    #[error("{0} is not an address")]
    BadAddress(i64),

    /// The program ended without an `End` instruction.
    #[error("execution ran past the end of the program at {0}")]
    PastEnd(usize),

    /// An earlier fault has not been cleared by a reset.
    #[error("machine halted by an earlier fault")]
    Halted,
}

impl Fault
{
    /// The return code that reports this fault.
    pub fn return_code(&self) -> ReturnCode
    {
        match self {
            Self::Memory(error) if error.is_stack_error() => ReturnCode::StackError,
            Self::Memory(_) | Self::BadAddress(_) => ReturnCode::MemoryError,
            Self::NotNumeric(_) | Self::PastEnd(_) | Self::Halted =>
                ReturnCode::ProgramError,
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    use zex_memory::error::HeapError;

    #[test]
    fn return_codes()
    {
        let stack = Fault::from(MemoryError::StackUnderflow);
        assert_eq!(stack.return_code(), ReturnCode::StackError);

        let heap = Fault::from(MemoryError::from(HeapError::IdExhausted));
        assert_eq!(heap.return_code(), ReturnCode::MemoryError);
        assert_eq!(heap.to_string(), "object ids exhausted");

        assert_eq!(Fault::PastEnd(3).return_code(), ReturnCode::ProgramError);
        assert_eq!(ReturnCode::MemoryError as i32, 3);
    }
}
