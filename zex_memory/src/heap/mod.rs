//! Memory allocation and garbage collection.
//!
//! # Layout
//!
//! All object payloads live in a single [`Pool`] of fixed capacity.
//! The [`Heap`] allocates by bumping a cursor through the pool,
//! so the bytes below the cursor hold live objects and holes
//! left behind by deleted or moved objects,
//! and the bytes above the cursor are free.
//! Deleting the topmost object retracts the cursor;
//! any other hole is reclaimed only by the garbage collector.
//!
//! # Objects
//!
//! Objects are known by an [`ObjectId`], which stays the same
//! for the whole life of the object, even as it moves.
//! The [`ObjectTable`] maps ids to their current position and length,
//! and records which other objects each object references.
//!
//! # Garbage collection
//!
//! When an allocation would reach the end of the pool,
//! the heap marks every object reachable from the root
//! (or from a pinned object), copies the marked objects
//! to the start of a fresh pool in their original order,
//! and destroys the rest.
//! If the marked objects and the allocation do not fit together,
//! the collection fails and the heap is left untouched.
//!
//! | Operation                         | May collect | May move the object |
//! |-----------------------------------|-------------|---------------------|
//! | [`allocate`][`Heap::allocate`]    | Yes         | N/A                 |
//! | [`expand`][`Heap::expand`]        | Yes         | Yes                 |
//! | [`duplicate`][`Heap::duplicate`]  | Yes         | Yes (the original)  |
//! | [`delete`][`Heap::delete`]        | No          | N/A                 |
//! | [`collect`][`Heap::collect`]      | Yes         | Yes                 |

pub use self::heap::*;
pub use self::pool::*;
pub use self::table::*;

// The order of these declarations influences
// the order of the Heap impls in in rustdoc.
mod heap;
mod alloc;
mod collect;
mod pin;

mod pool;
mod table;
