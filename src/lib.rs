//! An assembler and interpreter for a small stack machine with addressable memory.
//!
//! Source text is assembled by [`bytecode::assemble`] into a flat sequence of 5 byte words, and
//! [`machine::Machine`] executes those words against an operand stack and a fixed size memory.

#[macro_use] extern crate prettytable;
#[macro_use] extern crate lazy_static;

pub mod bytecode;
pub mod error;
pub mod machine;
pub mod pipeline;

pub use error::{Error, Result};
pub use machine::{Machine, Memory, Snapshot, Value};
