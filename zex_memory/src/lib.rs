//! This crate implements the memory layer of the virtual machine.
//!
//! Strings and lists live in a fixed-capacity heap pool
//! managed by a bump allocator and a mark-and-compact garbage collector
//! (see [`heap`]).
//! The [`MemoryManager`][`memory::MemoryManager`] layers flat memory,
//! the operand stack and string/list value semantics on top of it.

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

extern crate alloc;
extern crate core;

pub mod config;
pub mod error;
pub mod heap;
pub mod memory;
pub mod object;
pub mod register;
