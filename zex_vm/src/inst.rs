//! Decoded instructions.

/// Number of slots in the register file.
pub const REGISTER_COUNT: usize = 16;

/// Names of the registers an instruction can address.
///
/// Slot 0 of the register file is reserved for the immediate marker
/// and slot 15 for the program counter;
/// neither can be addressed directly.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum RegisterId
{
    R1 = 1, R2, R3, R4, R5, R6, R7,

    /// Argument registers.
    A1, A2, A3, A4, A5, A6,

    /// Environment pointer and return value.
    RV,
}

impl RegisterId
{
    /// Slot of the register in the register file.
    #[inline]
    pub fn index(self) -> usize
    {
        self as usize
    }
}

/// Second operand of an instruction that accepts an immediate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Operand
{
    #[allow(missing_docs)]
    Register(RegisterId),

    /// Zero-extended to a full register.
    Immediate(u32),
}

/// An instruction that the engine can execute.
///
/// `x`, `y` and `z` in the descriptions below
/// stand for the first, second and third operand.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Instruction
{
    /// Stop successfully.
    End,

    /// `x = y`.
    Move(RegisterId, Operand),

    /// `x = y`, for a float immediate.
    MoveFloat(RegisterId, f64),

    /// Push `x` onto the stack.
    Push(Operand),

    /// Pop the top of the stack into `x`.
    Pop(RegisterId),

    /// `x = ` the stack slot at depth `x`.
    Peek(RegisterId),

    /// `x = ` the register stored at address `y`.
    Load(RegisterId, Operand),

    /// Store `y` at the immediate address `x`.
    Store(u32, Operand),

    /// Store `y` at the address in `x`.
    StoreIndirect(RegisterId, Operand),

    /// Store the low byte of `y` at the address in `x`.
    StoreByte(RegisterId, Operand),

    /// `x = ` a new string from the terminated bytes at address `x`.
    NewString(RegisterId),

    /// `x = ` a new list of `y` registers from address `x`.
    NewList(RegisterId, RegisterId),

    /// Delete the string `x`.
    DeleteString(RegisterId),

    /// Delete the list `x`.
    DeleteList(RegisterId),

    /// Make the list `x` the root of reachability.
    SetRoot(RegisterId),

    /// Record that list `x` references the string or list `y`.
    AddRef(RegisterId, RegisterId),

    /// Forget that list `x` references the string or list `y`.
    RemoveRef(RegisterId, RegisterId),

    /// Replace the content of string `x` with the decimal integer `y`.
    IntToString(RegisterId, RegisterId),

    /// Replace the content of string `x` with the float `y`.
    FloatToString(RegisterId, RegisterId),

    /// `x = ` the integer written in string `y`.
    StringToInt(RegisterId, RegisterId),

    /// `x = ` the float written in string `y`.
    StringToFloat(RegisterId, RegisterId),

    /// Append string `y` to string `x`, consuming `y`.
    StringConcat(RegisterId, RegisterId),

    /// `x = ` a copy of string `y`.
    StringCopy(RegisterId, RegisterId),

    /// `x = ` the length of string `y`.
    StringLength(RegisterId, RegisterId),

    /// `x = ` 1 if strings `x` and `y` are equal, else 0.
    StringEqual(RegisterId, RegisterId),

    /// Copy string `x` to the address in `y`.
    StringGet(RegisterId, RegisterId),

    /// Replace string `x` with the terminated bytes at the address in `y`.
    StringSet(RegisterId, RegisterId),

    /// Append list `y` to list `x`, consuming `y`.
    ListConcat(RegisterId, RegisterId),

    /// `x = ` a copy of list `y`.
    ListCopy(RegisterId, RegisterId),

    /// `x = ` the length of list `y`.
    ListLength(RegisterId, RegisterId),

    /// `x = ` 1 if lists `x` and `y` are equal, else 0.
    ListEqual(RegisterId, RegisterId),

    /// `x = ` slot `x` of list `y`.
    ListGet(RegisterId, RegisterId),

    /// Slot `y` of list `x` `= z`.
    ListSet(RegisterId, RegisterId, RegisterId),
}
