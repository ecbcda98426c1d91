//! Structures and functions for the stack machine that executes assembled programs: an operand
//! stack and a fixed size, zero-initialized memory, driven one word at a time with no jumps.

use std::fmt::{Display, Formatter};
use std::ops::Range;

use prettytable::{format as TableFormat, Table};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::bytecode::*;
use crate::error::{Error, Result};

/// The contents of a stack slot or memory cell.
pub type Value = u64;

pub const DEFAULT_MEMORY_SIZE: usize = 256;

/// Enough cells for every address an instruction can form: `B + C` with both fields at their
/// widest. Larger memories could never be reached.
pub const MAX_MEMORY_SIZE: usize = 2 * FIELD_MASK as usize + 1;

pub struct Machine {

  // Memory Stores
  stack  : Vec<Value>,  // Operand stack, top at the end
  memory : Vec<Value>,  // Addressable memory, fixed size

  // Registers //
  pc     : usize,       // Byte offset of the word being executed

}

impl Machine {

  // region Display methods

  fn make_cell_table<'a, I>(name: char, cells: I, highlight: Option<usize>) -> Table
    where I: Iterator<Item = (usize, &'a Value)>
  {
    let mut table = Table::new();

    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubr->"Address", ubl->"Contents"]);

    for (i, value) in cells {
      match Some(i) == highlight {

        true  => {
          table.add_row(row![r->format!("* --> {}[{}] =", name, i), value]);
        }

        false => {
          table.add_row(row![r->format!("{}[{}] =", name, i), value]);
        }

      } // end match on highlight
    } // end for
    table
  }

  // endregion

  // region Low-level utility methods

  pub fn new() -> Machine {
    Machine::zeroed(DEFAULT_MEMORY_SIZE)
  }

  /// Creates a machine with `size` memory cells, which may not exceed `MAX_MEMORY_SIZE`.
  pub fn with_memory_size(size: usize) -> Result<Machine> {
    match size <= MAX_MEMORY_SIZE {
      true  => Ok(Machine::zeroed(size)),
      false => Err(Error::MemorySize { size, max: MAX_MEMORY_SIZE }),
    }
  }

  fn zeroed(size: usize) -> Machine {
    Machine {
      stack  : vec![],
      memory : vec![0; size],
      pc     : 0,
    }
  }

  pub fn stack(&self) -> &[Value] {
    &self.stack
  }

  pub fn memory(&self) -> &[Value] {
    &self.memory
  }

  fn pop(&mut self) -> Result<Value> {
    self.stack.pop().ok_or(Error::StackUnderflow { offset: self.pc })
  }

  /// Converts a value into an index into memory, or fails if it is out of bounds.
  fn address(&self, value: Value) -> Result<usize> {
    match usize::try_from(value) {
      Ok(address) if address < self.memory.len() => Ok(address),
      _ => Err(Error::MemoryOutOfBounds { offset: self.pc, address: value, size: self.memory.len() })
    }
  }

  // endregion

  // region Execution

  /**
    Decodes and executes a single word, returning the operation it performed. The word is
    attributed to the byte offset following the previously executed word.

    On failure the machine must not be stepped again; its state is whatever the failed step
    left behind.
  */
  pub fn step(&mut self, word: Word) -> Result<Operation> {
    let DecodedInstruction { operation, b, c } = match try_decode_instruction(word) {
      Some(decoded) => decoded,
      None => {
        return Err(Error::UnknownOpcode {
          offset : self.pc,
          opcode : split_word(word).opcode,
          word,
        });
      }
    };

    match operation {
      Operation::LoadConst => self.load_const(b),
      Operation::LoadMem   => self.load_mem()?,
      Operation::StoreMem  => self.store_mem()?,
      Operation::Min       => self.min(b, c)?,
    }
    debug!("byte {}: {} (B = {}, C = {})", self.pc, operation, b, c);
    #[cfg(feature = "trace_computation")] tracing::trace!("\n{}", self);

    self.pc += WORD_SIZE;
    Ok(operation)
  }

  /**
    Runs a whole binary program front to back and returns the final memory. Execution stops at
    the first error, and the machine's state at that point is dropped along with it.
  */
  pub fn execute(mut self, program: &[u8]) -> Result<Memory> {
    let program = Program::new(program);
    info!("Executing {} word(s) with {} memory cells.", program.len(), self.memory.len());

    for word in program.words() {
      let (offset, word) = word?;
      self.pc = offset;
      self.step(word)?;
    }

    Ok(Memory { cells: self.memory })
  }

  // endregion

  // region VM instruction methods

  /// Pushes field B.
  fn load_const(&mut self, b: Word) {
    self.stack.push(b);
  }

  /// Replaces the address on top of the stack with the contents of memory at that address.
  fn load_mem(&mut self) -> Result<()> {
    let address = self.pop()?;
    let address = self.address(address)?;
    self.stack.push(self.memory[address]);
    Ok(())
  }

  /// Pops a value, then an address, and stores the value at the address.
  fn store_mem(&mut self) -> Result<()> {
    let value   = self.pop()?;
    let address = self.pop()?;
    let address = self.address(address)?;
    self.memory[address] = value;
    Ok(())
  }

  /**
    Pops a value, then a second value, and stores the smaller of the two at `B + C`.

    The second pop happens before the address is checked, so an underflow takes precedence over
    a bad address.
  */
  fn min(&mut self, b: Word, c: Word) -> Result<()> {
    let value   = self.pop()?;
    let other   = self.pop()?;
    let address = self.address(b + c)?;
    self.memory[address] = other.min(value);
    Ok(())
  }

  // endregion

}

impl Default for Machine {
  fn default() -> Machine {
    Machine::new()
  }
}


/// The memory of a machine that ran a program to completion.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Memory {
  cells: Vec<Value>
}

impl Memory {
  pub fn cells(&self) -> &[Value] {
    &self.cells
  }

  pub fn len(&self) -> usize {
    self.cells.len()
  }

  pub fn is_empty(&self) -> bool {
    self.cells.is_empty()
  }

  /// Copies out the half-open range of cells, which must lie within memory.
  pub fn snapshot(&self, range: Range<usize>) -> Result<Snapshot> {
    let Range { start, end } = range;
    if start > end || end > self.cells.len() {
      return Err(Error::RangeOutOfBounds { start, end, size: self.cells.len() });
    }
    Ok(Snapshot { memory: self.cells[start..end].to_vec() })
  }
}

/// A read-only copy of a range of memory, serialized as `{"memory": [...]}`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
  pub memory: Vec<Value>
}


lazy_static! {
  static ref TABLE_DISPLAY_FORMAT: TableFormat::TableFormat =
    TableFormat::FormatBuilder::new()
      .column_separator('│')
      .borders(' ')
      .separator(
        TableFormat::LinePosition::Title,
        TableFormat::LineSeparator::new('─', '┼', ' ', ' ')
      )
      .separator(
        TableFormat::LinePosition::Bottom,
        TableFormat::LineSeparator::new('─', '┴', ' ', ' ')
      )
      .padding(1, 1)
      .build();
}

impl Display for Machine {
  // Zero cells are left out of the memory table.
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let top       = self.stack.len().checked_sub(1);
    let s_table   = Machine::make_cell_table('S', self.stack.iter().enumerate(), top);
    let m_table   = Machine::make_cell_table(
      'M',
      self.memory.iter().enumerate().filter(|(_, value)| **value != 0),
      None
    );

    let mut combined_table = table!([s_table, m_table]);

    combined_table.set_titles(row![ub->"Stack", ub->"Memory"]);
    combined_table.set_format(*TABLE_DISPLAY_FORMAT);

    write!(f, "PC: {}\n{}", self.pc, combined_table)
  }
}
