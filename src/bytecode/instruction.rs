use std::fmt::{Display, Formatter};

use strum_macros::{Display as StrumDisplay, EnumString, IntoStaticStr};
use num_enum::{TryFromPrimitive, IntoPrimitive};

use super::Word;

/**
  Opcodes of the virtual machine.

  The discriminants are the values found in bits [0, 5) of an encoded word, so they are
  significant and must not be reordered or renumbered. The textual names are the assembly
  mnemonics, e.g. `LoadConst` <-> `LOAD_CONST`.
*/
#[derive(
  StrumDisplay, IntoStaticStr, EnumString, TryFromPrimitive, IntoPrimitive,
  Clone,        Copy,          Eq,         PartialEq,        Debug,         Hash
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum Operation {
  LoadConst = 3,    // push(B)
  LoadMem   = 13,   // push(memory[pop()])
  StoreMem  = 19,   // value = pop(); memory[pop()] = value
  Min       = 27,   // value = pop(); memory[B + C] = min(pop(), value)
}

impl Operation {
  pub fn code(&self) -> u8 {
    Into::<u8>::into(*self)
  }

  pub fn name(&self) -> &'static str {
    self.into()
  }

  /// The number of operands the textual form requires.
  pub fn arity(&self) -> usize {
    match self {
      Operation::LoadMem   => 1,
      Operation::LoadConst
      | Operation::StoreMem => 2,
      Operation::Min       => 3,
    }
  }
}

/**
  Holds the operands of an instruction as written in assembly, one variant per operation.

  The leading operand `a` of every variant sits in the opcode slot of the source packing.
  It never influences execution directly; see `binary::Encoding` for how it is packed.
*/
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Instruction {
  /// `LOAD_CONST a b`
  LoadConst { a: Word, b: Word },
  /// `LOAD_MEM a`
  LoadMem { a: Word },
  /// `STORE_MEM a b`
  StoreMem { a: Word, b: Word },
  /// `MIN a b c`
  Min { a: Word, b: Word, c: Word },
}

impl Instruction {
  /**
    Builds the instruction for `operation` from its operands in textual order, or `None` if
    fewer than `operation.arity()` are given. Extra operands are ignored.
  */
  pub fn from_operands(operation: Operation, operands: &[Word]) -> Option<Instruction> {
    let instruction = match (operation, operands) {
      (Operation::LoadConst, &[a, b, ..])    => Instruction::LoadConst { a, b },
      (Operation::LoadMem,   &[a, ..])       => Instruction::LoadMem   { a },
      (Operation::StoreMem,  &[a, b, ..])    => Instruction::StoreMem  { a, b },
      (Operation::Min,       &[a, b, c, ..]) => Instruction::Min       { a, b, c },
      _ => return None,
    };
    Some(instruction)
  }

  pub fn operation(&self) -> Operation {
    match self {
      Instruction::LoadConst { .. } => Operation::LoadConst,
      Instruction::LoadMem   { .. } => Operation::LoadMem,
      Instruction::StoreMem  { .. } => Operation::StoreMem,
      Instruction::Min       { .. } => Operation::Min,
    }
  }

  /// The operand that occupies the opcode slot in the source packing.
  pub fn leading_operand(&self) -> Word {
    match self {
      | Instruction::LoadConst { a, .. }
      | Instruction::LoadMem   { a }
      | Instruction::StoreMem  { a, .. }
      | Instruction::Min       { a, .. } => *a
    }
  }

  /// The values destined for field B and field C. Absent operands are zero.
  pub fn fields(&self) -> (Word, Word) {
    match self {
      Instruction::LoadConst { b, .. } => (*b, 0),
      Instruction::LoadMem   { .. }    => (0, 0),
      Instruction::StoreMem  { b, .. } => (*b, 0),
      Instruction::Min       { b, c, .. } => (*b, *c),
    }
  }
}

impl Display for Instruction {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {

      Instruction::LoadConst { a, b } => {
        write!(f, "{} {} {}", Operation::LoadConst, a, b)
      }

      Instruction::LoadMem { a } => {
        write!(f, "{} {}", Operation::LoadMem, a)
      }

      Instruction::StoreMem { a, b } => {
        write!(f, "{} {} {}", Operation::StoreMem, a, b)
      }

      Instruction::Min { a, b, c } => {
        write!(f, "{} {} {} {}", Operation::Min, a, b, c)
      }

    }
  }
}
