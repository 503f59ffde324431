//! Flat memory, the operand stack, and the heap, owned together.
//!
//! The string and list operations of the memory manager
//! are defined in the [`object`][`crate::object`] module.

use crate::config::MemoryConfig;
use crate::error::MemoryError;
use crate::heap::Heap;
use crate::object::Handle;
use crate::object::ListHandle;

use alloc::boxed::Box;
use alloc::vec;

pub (crate) use self::flat::region;
pub (crate) use self::flat::terminated;

mod flat;
mod stack;

/// All memory of one virtual machine.
///
/// Flat memory is a fixed-size byte array holding constants and scalars.
/// The operand stack holds [`Register`][`crate::register::Register`]s.
/// Strings and lists live on the [`Heap`].
pub struct MemoryManager
{
    pub (crate) memory: Box<[u8]>,
    pub (crate) stack: Box<[u8]>,

    /// Number of bytes in use on the stack.
    pub (crate) stack_pointer: u32,

    pub (crate) heap: Heap,

    config: MemoryConfig,
}

impl MemoryManager
{
    /// Create zeroed memory regions and an empty heap.
    pub fn new(config: MemoryConfig) -> Self
    {
        Self{
            memory: vec![0; config.memory_size as usize].into_boxed_slice(),
            stack: vec![0; config.stack_size as usize].into_boxed_slice(),
            stack_pointer: 0,
            heap: Heap::new(config.heap),
            config,
        }
    }

    /// Discard all contents and start over.
    ///
    /// This is the only way to recover from a failed heap operation.
    pub fn reset(&mut self)
    {
        log::debug!("resetting memory");
        *self = Self::new(self.config);
    }

    #[allow(missing_docs)]
    pub fn config(&self) -> MemoryConfig
    {
        self.config
    }

    /// Read-only view of the heap, for inspection.
    pub fn heap(&self) -> &Heap
    {
        &self.heap
    }

    /// Collect all garbage now.
    pub fn collect(&mut self) -> Result<(), MemoryError>
    {
        Ok(self.heap.collect()?)
    }

    /// Make a list the root of reachability.
    ///
    /// This is normally the global environment.
    pub fn set_root_env(&mut self, list: ListHandle)
    {
        self.heap.set_root(list.id);
    }

    /// Record that a list contains a string or another list.
    pub fn add_reference<K>(&mut self, list: ListHandle, target: Handle<K>)
        -> Result<(), MemoryError>
    {
        Ok(self.heap.add_ref(list.id, target.id)?)
    }

    /// Forget that a list contains a string or another list.
    ///
    /// The target need not exist any more.
    pub fn remove_reference<K>(&mut self, list: ListHandle, target: Handle<K>)
        -> Result<(), MemoryError>
    {
        Ok(self.heap.remove_ref(list.id, target.id)?)
    }
}

#[cfg(test)]
pub (crate) mod tests
{
    use super::*;
    use crate::config::HeapConfig;
    use crate::error::HeapError;
    use crate::register::Register;

    pub (crate) fn manager(pool_size: u32) -> MemoryManager
    {
        MemoryManager::new(MemoryConfig{
            memory_size: 256,
            stack_size: 64,
            heap: HeapConfig::with_pool_size(pool_size),
        })
    }

    #[test]
    fn nested_values_survive_through_the_environment()
    {
        let mut memory = manager(64);
        let env = memory.create_list_from_slots(&[Register::ZERO; 2]).unwrap();
        let name = memory.create_string_from_bytes(b"name").unwrap();
        let temp = memory.create_string_from_bytes(b"temp").unwrap();

        memory.list_set(env, 0, Register::from_handle(name)).unwrap();
        memory.add_reference(env, name).unwrap();
        memory.set_root_env(env);
        memory.collect().unwrap();

        assert_eq!(memory.raw_string(name), Ok(&b"name"[..]));
        assert_eq!(
            memory.raw_string(temp),
            Err(MemoryError::Heap(HeapError::UnknownId(temp.id))),
        );

        memory.remove_reference(env, name).unwrap();
        memory.collect().unwrap();
        assert!(!memory.heap().contains(name.id));
    }

    #[test]
    fn reference_to_missing_object()
    {
        let mut memory = manager(64);
        let env = memory.create_list_from_slots(&[]).unwrap();
        let gone = memory.create_string_from_bytes(b"x").unwrap();
        memory.delete_string(gone).unwrap();

        assert_eq!(
            memory.add_reference(env, gone),
            Err(MemoryError::Heap(HeapError::UnknownId(gone.id))),
        );
        assert_eq!(memory.remove_reference(env, gone), Ok(()));
    }

    #[test]
    fn reset_clears_everything()
    {
        let mut memory = manager(64);
        memory.push(Register::from_int(1)).unwrap();
        memory.write_byte_at(0, b'x').unwrap();
        let s = memory.create_string_from_bytes(b"s").unwrap();

        memory.reset();
        assert_eq!(memory.stack_depth(), 0);
        assert_eq!(memory.read_byte_at(0), Ok(0));
        assert!(!memory.heap().contains(s.id));
    }
}
