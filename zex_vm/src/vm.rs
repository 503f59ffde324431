//! Executing instructions.

use crate::fault::Fault;
use crate::fault::ReturnCode;
use crate::inst::Instruction;
use crate::inst::Operand;
use crate::inst::REGISTER_COUNT;
use crate::inst::RegisterId;

use alloc::format;
use core::str;
use zex_memory::config::MemoryConfig;
use zex_memory::memory::MemoryManager;
use zex_memory::object::StringHandle;
use zex_memory::register::Register;

/// What to do after an instruction has executed.
enum Flow
{
    Next,
    Stop,
}

/// Registers and memory of a running program.
///
/// The first fault raised by an instruction is latched:
/// further runs refuse to execute anything until [`Vm::reset`].
pub struct Vm
{
    registers: [Register; REGISTER_COUNT],
    memory: MemoryManager,
    fault: Option<Fault>,
}

impl Vm
{
    /// Create a machine with zeroed registers and empty memory.
    pub fn new(config: MemoryConfig) -> Self
    {
        Self{
            registers: [Register::ZERO; REGISTER_COUNT],
            memory: MemoryManager::new(config),
            fault: None,
        }
    }

    #[allow(missing_docs)]
    pub fn register(&self, id: RegisterId) -> Register
    {
        self.registers[id.index()]
    }

    #[allow(missing_docs)]
    pub fn set_register(&mut self, id: RegisterId, value: Register)
    {
        self.registers[id.index()] = value;
    }

    #[allow(missing_docs)]
    pub fn memory(&self) -> &MemoryManager
    {
        &self.memory
    }

    /// Mutable access to memory, for loading constants before a run.
    pub fn memory_mut(&mut self) -> &mut MemoryManager
    {
        &mut self.memory
    }

    /// The fault that stopped the machine, if any.
    pub fn fault(&self) -> Option<&Fault>
    {
        self.fault.as_ref()
    }

    #[allow(missing_docs)]
    pub fn has_error(&self) -> bool
    {
        self.fault.is_some()
    }

    /// Clear the fault, the registers and all memory.
    pub fn reset(&mut self)
    {
        self.registers = [Register::ZERO; REGISTER_COUNT];
        self.memory.reset();
        self.fault = None;
    }

    /// Execute a program from its first instruction.
    ///
    /// Execution stops at [`Instruction::End`] or at the first fault.
    /// Running off the end of the program is a fault too.
    pub fn run(&mut self, program: &[Instruction]) -> ReturnCode
    {
        if self.fault.is_some() {
            return Fault::Halted.return_code();
        }

        for (pc, instruction) in program.iter().enumerate() {
            log::trace!("{pc}: {instruction:?}");
            match self.step(instruction) {
                Ok(Flow::Next) => continue,
                Ok(Flow::Stop) => {
                    log::debug!("program finished at {pc}");
                    return ReturnCode::Finished;
                },
                Err(fault) => return self.latch(pc, fault),
            }
        }

        self.latch(program.len(), Fault::PastEnd(program.len()))
    }

    fn latch(&mut self, pc: usize, fault: Fault) -> ReturnCode
    {
        log::warn!("fault at {pc}: {fault}");
        let code = fault.return_code();
        self.fault = Some(fault);
        code
    }

    fn step(&mut self, instruction: &Instruction) -> Result<Flow, Fault>
    {
        use Instruction as I;

        match *instruction {

            I::End => return Ok(Flow::Stop),

            I::Move(x, y) => {
                let value = self.operand(y);
                self.set_register(x, value);
            },

            I::MoveFloat(x, value) =>
                self.set_register(x, Register::from_float(value)),

            I::Push(x) => {
                let value = self.operand(x);
                self.memory.push(value)?;
            },

            I::Pop(x) => {
                let value = self.memory.pop()?;
                self.set_register(x, value);
            },

            I::Peek(x) => {
                let depth = self.address(x)?;
                let value = self.memory.peek(depth)?;
                self.set_register(x, value);
            },

            I::Load(x, y) => {
                let address = self.address_operand(y)?;
                let value = self.memory.read_register(address)?;
                self.set_register(x, value);
            },

            I::Store(address, y) => {
                let value = self.operand(y);
                self.memory.write_register(address, value)?;
            },

            I::StoreIndirect(x, y) => {
                let address = self.address(x)?;
                let value = self.operand(y);
                self.memory.write_register(address, value)?;
            },

            I::StoreByte(x, y) => {
                let address = self.address(x)?;
                let byte = self.operand(y).as_int() as u8;
                self.memory.write_byte_at(address, byte)?;
            },

            I::NewString(x) => {
                let address = self.address(x)?;
                let string = self.memory.create_string(address)?;
                self.set_register(x, Register::from_handle(string));
            },

            I::NewList(x, y) => {
                let address = self.address(x)?;
                let count = self.address(y)?;
                let list = self.memory.create_list(address, count)?;
                self.set_register(x, Register::from_handle(list));
            },

            I::DeleteString(x) =>
                self.memory.delete_string(self.register(x).as_string())?,

            I::DeleteList(x) =>
                self.memory.delete_list(self.register(x).as_list())?,

            I::SetRoot(x) =>
                self.memory.set_root_env(self.register(x).as_list()),

            // Strings and lists share the handle layout,
            // so the target is read as a list either way.
            I::AddRef(x, y) => {
                let (list, target) = (self.register(x).as_list(), self.register(y).as_list());
                self.memory.add_reference(list, target)?;
            },

            I::RemoveRef(x, y) => {
                let (list, target) = (self.register(x).as_list(), self.register(y).as_list());
                self.memory.remove_reference(list, target)?;
            },

            I::IntToString(x, y) => {
                let text = format!("{}", self.register(y).as_int());
                self.replace_string(x, text.as_bytes())?;
            },

            I::FloatToString(x, y) => {
                let text = format!("{:.6}", self.register(y).as_float());
                self.replace_string(x, text.as_bytes())?;
            },

            I::StringToInt(x, y) => {
                let string = self.register(y).as_string();
                let value = self.parse_string::<i64>(string)?;
                self.set_register(x, Register::from_int(value));
            },

            I::StringToFloat(x, y) => {
                let string = self.register(y).as_string();
                let value = self.parse_string::<f64>(string)?;
                self.set_register(x, Register::from_float(value));
            },

            I::StringConcat(x, y) => {
                let mut string = self.register(x).as_string();
                self.memory.string_concatenate(&mut string, self.register(y).as_string())?;
                self.set_register(x, Register::from_handle(string));
            },

            I::StringCopy(x, y) => {
                let copy = self.memory.string_copy(self.register(y).as_string())?;
                self.set_register(x, Register::from_handle(copy));
            },

            I::StringLength(x, y) => {
                let length = self.memory.string_length(self.register(y).as_string())?;
                self.set_register(x, Register::from_int(length.into()));
            },

            I::StringEqual(x, y) => {
                let (a, b) = (self.register(x).as_string(), self.register(y).as_string());
                let equal = self.memory.string_compare(a, b)?;
                self.set_register(x, Register::from_int(equal.into()));
            },

            I::StringGet(x, y) => {
                let address = self.address(y)?;
                self.memory.string_to_memory(self.register(x).as_string(), address)?;
            },

            I::StringSet(x, y) => {
                let address = self.address(y)?;
                let mut string = self.register(x).as_string();
                self.memory.string_from_memory(&mut string, address)?;
                self.set_register(x, Register::from_handle(string));
            },

            I::ListConcat(x, y) => {
                let mut list = self.register(x).as_list();
                self.memory.list_concatenate(&mut list, self.register(y).as_list())?;
                self.set_register(x, Register::from_handle(list));
            },

            I::ListCopy(x, y) => {
                let copy = self.memory.list_copy(self.register(y).as_list())?;
                self.set_register(x, Register::from_handle(copy));
            },

            I::ListLength(x, y) => {
                let length = self.memory.list_length(self.register(y).as_list())?;
                self.set_register(x, Register::from_int(length.into()));
            },

            I::ListEqual(x, y) => {
                let (a, b) = (self.register(x).as_list(), self.register(y).as_list());
                let equal = self.memory.list_compare(a, b)?;
                self.set_register(x, Register::from_int(equal.into()));
            },

            I::ListGet(x, y) => {
                let index = self.address(x)?;
                let value = self.memory.list_get(self.register(y).as_list(), index)?;
                self.set_register(x, value);
            },

            I::ListSet(x, y, z) => {
                let index = self.address(y)?;
                let value = self.register(z);
                self.memory.list_set(self.register(x).as_list(), index, value)?;
            },

        }

        Ok(Flow::Next)
    }

    fn operand(&self, operand: Operand) -> Register
    {
        match operand {
            Operand::Register(id) => self.register(id),
            Operand::Immediate(value) => Register::from_int(value.into()),
        }
    }

    /// Read a register as an address, index or count.
    fn address(&self, id: RegisterId) -> Result<u32, Fault>
    {
        let value = self.register(id).as_int();
        u32::try_from(value).map_err(|_| Fault::BadAddress(value))
    }

    fn address_operand(&self, operand: Operand) -> Result<u32, Fault>
    {
        match operand {
            Operand::Register(id) => self.address(id),
            Operand::Immediate(value) => Ok(value),
        }
    }

    fn replace_string(&mut self, x: RegisterId, content: &[u8]) -> Result<(), Fault>
    {
        let mut string = self.register(x).as_string();
        self.memory.set_raw_string(&mut string, content)?;
        self.set_register(x, Register::from_handle(string));
        Ok(())
    }

    fn parse_string<T>(&self, string: StringHandle) -> Result<T, Fault>
        where T: str::FromStr
    {
        let raw = self.memory.raw_string(string)?;
        str::from_utf8(raw).ok()
            .and_then(|text| text.trim().parse().ok())
            .ok_or(Fault::NotNumeric(string.id))
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    use proptest::proptest;
    use zex_memory::config::HeapConfig;
    use zex_memory::error::HeapError;
    use zex_memory::error::MemoryError;
    use zex_memory::heap::ObjectId;

    use crate::inst::Instruction as I;
    use crate::inst::Operand::Immediate as Imm;
    use crate::inst::Operand::Register as Reg;
    use crate::inst::RegisterId::*;

    fn vm(pool_size: u32) -> Vm
    {
        let config = MemoryConfig{
            memory_size: 256,
            stack_size: 64,
            heap: HeapConfig::with_pool_size(pool_size),
        };
        Vm::new(config)
    }

    #[test]
    fn concatenate_strings()
    {
        let mut vm = vm(64);
        vm.memory_mut().load_bytes(0, b"hello\0").unwrap();
        vm.memory_mut().load_bytes(8, b" world\0").unwrap();

        let program = [
            I::Move(R1, Imm(0)),
            I::NewString(R1),
            I::Move(R2, Imm(8)),
            I::NewString(R2),
            I::StringConcat(R1, R2),
            I::StringLength(R3, R1),
            I::Move(R4, Imm(32)),
            I::StringGet(R1, R4),
            I::End,
        ];

        assert_eq!(vm.run(&program), ReturnCode::Finished);
        assert_eq!(vm.register(R3).as_int(), 11);
        assert_eq!(vm.memory().read_bytes(32, 12).unwrap(), b"hello world\0");
        assert!(!vm.memory().heap().contains(vm.register(R2).as_string().id));
    }

    #[test]
    fn numbers_and_strings()
    {
        let mut vm = vm(64);
        vm.memory_mut().load_bytes(0, b"\0").unwrap();

        let program = [
            I::Move(R1, Imm(0)),
            I::NewString(R1),
            I::Move(R2, Imm(1234)),
            I::IntToString(R1, R2),
            I::StringToInt(R3, R1),
            I::MoveFloat(R4, 2.5),
            I::FloatToString(R1, R4),
            I::StringToFloat(R5, R1),
            I::End,
        ];

        assert_eq!(vm.run(&program), ReturnCode::Finished);
        assert_eq!(vm.register(R3).as_int(), 1234);
        assert_eq!(vm.register(R5).as_float(), 2.5);
        let string = vm.register(R1).as_string();
        assert_eq!(vm.memory().raw_string(string).unwrap(), b"2.500000");
    }

    #[test]
    fn not_numeric()
    {
        let mut vm = vm(64);
        vm.memory_mut().load_bytes(0, b"twelve\0").unwrap();

        let program = [I::Move(R1, Imm(0)), I::NewString(R1), I::StringToInt(R2, R1), I::End];

        assert_eq!(vm.run(&program), ReturnCode::ProgramError);
        let id = vm.register(R1).as_string().id;
        assert_eq!(vm.fault(), Some(&Fault::NotNumeric(id)));
    }

    #[test]
    fn lists()
    {
        let mut vm = vm(128);
        vm.memory_mut().write_register(0, Register::from_int(7)).unwrap();
        vm.memory_mut().write_register(8, Register::from_int(8)).unwrap();

        let program = [
            I::Move(R1, Imm(0)),
            I::Move(R2, Imm(2)),
            I::NewList(R1, R2),
            I::ListCopy(R7, R1),
            I::ListEqual(R7, R1),
            I::ListCopy(R3, R1),
            I::ListConcat(R1, R3),
            I::ListLength(R4, R1),
            I::Move(R5, Imm(3)),
            I::Move(R6, Imm(42)),
            I::ListSet(R1, R5, R6),
            I::ListGet(R5, R1),
            I::Move(R6, Imm(1)),
            I::ListGet(R6, R1),
            I::End,
        ];

        assert_eq!(vm.run(&program), ReturnCode::Finished);
        assert_eq!(vm.register(R7).as_int(), 1);
        assert_eq!(vm.register(R4).as_int(), 4);
        assert_eq!(vm.register(R5).as_int(), 42);
        assert_eq!(vm.register(R6).as_int(), 8);
    }

    #[test]
    fn stack()
    {
        let mut vm = vm(64);

        let program = [
            I::Push(Imm(1)),
            I::Push(Imm(2)),
            I::Move(R1, Imm(1)),
            I::Peek(R1),
            I::Pop(R2),
            I::Push(Reg(R1)),
            I::Load(R3, Imm(0)),
            I::End,
        ];

        assert_eq!(vm.run(&program), ReturnCode::Finished);
        assert_eq!(vm.register(R1).as_int(), 1);
        assert_eq!(vm.register(R2).as_int(), 2);
        assert_eq!(vm.register(R3), Register::ZERO);
        assert_eq!(vm.memory().stack_depth(), 2);
    }

    #[test]
    fn stack_errors()
    {
        let mut vm = vm(64);
        assert_eq!(vm.run(&[I::Pop(R1), I::End]), ReturnCode::StackError);
        assert_eq!(vm.fault(), Some(&Fault::Memory(MemoryError::StackUnderflow)));

        vm.reset();
        let overflow = [I::Push(Imm(0)); 9];
        assert_eq!(vm.run(&overflow), ReturnCode::StackError);
    }

    #[test]
    fn fault_is_latched()
    {
        let mut vm = vm(64);
        vm.set_register(R1, Register::from_int(5));

        assert_eq!(vm.run(&[I::DeleteString(R1), I::End]), ReturnCode::MemoryError);
        assert_eq!(
            vm.fault(),
            Some(&Fault::Memory(MemoryError::Heap(HeapError::UnknownId(ObjectId(0))))),
        );
        assert!(vm.has_error());
        assert_eq!(vm.run(&[I::End]), ReturnCode::ProgramError);

        vm.reset();
        assert!(!vm.has_error());
        assert_eq!(vm.register(R1), Register::ZERO);
        assert_eq!(vm.run(&[I::End]), ReturnCode::Finished);
    }

    #[test]
    fn past_end()
    {
        let mut vm = vm(64);
        assert_eq!(vm.run(&[I::Move(R1, Imm(1))]), ReturnCode::ProgramError);
        assert_eq!(vm.fault(), Some(&Fault::PastEnd(1)));
    }

    #[test]
    fn bad_address()
    {
        let mut vm = vm(64);
        vm.set_register(R1, Register::from_int(-1));
        assert_eq!(vm.run(&[I::NewString(R1), I::End]), ReturnCode::MemoryError);
        assert_eq!(vm.fault(), Some(&Fault::BadAddress(-1)));
    }

    #[test]
    fn rooted_strings_survive_exhaustion()
    {
        let mut vm = vm(32);
        vm.memory_mut().load_bytes(0, b"abcdefg\0").unwrap();

        // The environment holds the first string; every later string
        // is garbage as soon as the next one is created.
        let mut program = vec![
            I::Move(RV, Imm(64)),
            I::Move(R2, Imm(0)),
            I::NewList(RV, R2),
            I::SetRoot(RV),
            I::Move(R1, Imm(0)),
            I::NewString(R1),
            I::AddRef(RV, R1),
        ];
        for _ in 0 .. 10 {
            program.push(I::Move(R3, Imm(0)));
            program.push(I::NewString(R3));
        }
        program.push(I::End);

        assert_eq!(vm.run(&program), ReturnCode::Finished);
        let kept = vm.register(R1).as_string();
        assert_eq!(vm.memory().raw_string(kept).unwrap(), b"abcdefg");
    }

    #[test]
    fn pool_exhaustion()
    {
        let mut vm = vm(16);
        vm.memory_mut().load_bytes(0, b"abcdefghijk\0").unwrap();

        // The first object is the root until another one is set.
        let program = [
            I::Move(R1, Imm(0)),
            I::NewString(R1),
            I::Move(R2, Imm(0)),
            I::NewString(R2),
            I::End,
        ];

        assert_eq!(vm.run(&program), ReturnCode::MemoryError);
        let fault = vm.fault().copied();
        assert!(matches!(
            fault,
            Some(Fault::Memory(MemoryError::Heap(HeapError::PoolExhausted{..}))),
        ));
        assert_eq!(vm.memory().heap().len(), 1);
    }

    proptest!
    {
        #[test]
        fn int_to_string_round_trips(value: i64)
        {
            let mut vm = vm(128);
            vm.memory_mut().load_bytes(0, b"\0").unwrap();
            vm.set_register(R2, Register::from_int(value));

            let program = [
                I::Move(R1, Imm(0)),
                I::NewString(R1),
                I::IntToString(R1, R2),
                I::StringToInt(R3, R1),
                I::End,
            ];

            assert_eq!(vm.run(&program), ReturnCode::Finished);
            assert_eq!(vm.register(R3).as_int(), value);
        }
    }
}
