//! Startup-time sizes of the memory regions.

/// Default size of the heap pool in bytes.
pub const DEFAULT_POOL_SIZE: u32 = 128 * 1024;

/// Default size of flat memory in bytes.
pub const DEFAULT_MEMORY_SIZE: u32 = 32 * 1024;

/// Default size of the operand stack in bytes.
pub const DEFAULT_STACK_SIZE: u32 = 16 * 1024;

/// Configuration of the garbage collected heap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeapConfig
{
    /// Capacity of the heap pool in bytes.
    pub pool_size: u32,

    /// Number of distinct object ids that may be handed out.
    ///
    /// Ids are drawn from `0 .. max_objects`.
    /// The id [`u32::MAX`] is never handed out,
    /// so values above it behave like [`u32::MAX`].
    pub max_objects: u32,
}

impl Default for HeapConfig
{
    fn default() -> Self
    {
        Self{pool_size: DEFAULT_POOL_SIZE, max_objects: u32::MAX}
    }
}

impl HeapConfig
{
    /// Default configuration with a different pool size.
    pub fn with_pool_size(pool_size: u32) -> Self
    {
        Self{pool_size, ..Self::default()}
    }
}

/// Configuration of the memory manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryConfig
{
    /// Size of flat memory in bytes.
    pub memory_size: u32,

    /// Size of the operand stack in bytes.
    pub stack_size: u32,

    /// See [`HeapConfig`].
    pub heap: HeapConfig,
}

impl Default for MemoryConfig
{
    fn default() -> Self
    {
        Self{
            memory_size: DEFAULT_MEMORY_SIZE,
            stack_size: DEFAULT_STACK_SIZE,
            heap: HeapConfig::default(),
        }
    }
}
