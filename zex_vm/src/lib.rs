//! This crate implements the execution engine of the virtual machine.
//!
//! Only the instructions that operate on memory are implemented here.
//! They are given in decoded form as [`Instruction`][`inst::Instruction`]s;
//! reading bytecode files is left to the loader.

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

extern crate alloc;
extern crate core;

pub mod fault;
pub mod inst;
pub mod vm;
