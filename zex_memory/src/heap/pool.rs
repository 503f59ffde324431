use alloc::boxed::Box;
use alloc::vec;

/// Contiguous byte buffer holding the payloads of all heap objects.
///
/// Objects are addressed by byte offset.
/// The pool never grows; the garbage collector replaces it
/// with a freshly compacted pool of the same capacity.
pub struct Pool
{
    bytes: Box<[u8]>,
}

impl Pool
{
    /// Create a zeroed pool.
    pub fn new(capacity: u32) -> Self
    {
        Self{bytes: vec![0; capacity as usize].into_boxed_slice()}
    }

    #[allow(missing_docs)]
    #[inline]
    pub fn capacity(&self) -> u32
    {
        self.bytes.len() as u32
    }

    /// Borrow `length` bytes starting at `position`.
    ///
    /// Returns [`None`] if the range is not inside the pool.
    #[inline]
    pub fn get(&self, position: u32, length: u32) -> Option<&[u8]>
    {
        let start = position as usize;
        self.bytes.get(start .. start.checked_add(length as usize)?)
    }

    /// Mutably borrow `length` bytes starting at `position`.
    ///
    /// Returns [`None`] if the range is not inside the pool.
    #[inline]
    pub fn get_mut(&mut self, position: u32, length: u32) -> Option<&mut [u8]>
    {
        let start = position as usize;
        self.bytes.get_mut(start .. start.checked_add(length as usize)?)
    }

    /// Copy `length` bytes from `from` to `to`.
    ///
    /// The ranges may overlap.
    ///
    /// # Panics
    ///
    /// Panics if either range is not inside the pool.
    pub fn copy_within(&mut self, from: u32, length: u32, to: u32)
    {
        let from = from as usize;
        self.bytes.copy_within(from .. from + length as usize, to as usize);
    }

    /// Copy `length` bytes at `from` in another pool to `to` in this pool.
    ///
    /// # Panics
    ///
    /// Panics if either range is not inside its pool.
    pub fn copy_from(&mut self, other: &Pool, from: u32, length: u32, to: u32)
    {
        let (from, to, length) = (from as usize, to as usize, length as usize);
        self.bytes[to .. to + length]
            .copy_from_slice(&other.bytes[from .. from + length]);
    }
}
