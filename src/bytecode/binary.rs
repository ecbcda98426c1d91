/*!
  This module is responsible for the encoding and decoding of binary instructions, and is the
  only place that knows how instruction components are packed into a word.

*/
use std::convert::TryFrom;

use strum_macros::{Display as StrumDisplay, EnumString};

use super::{Instruction, Operation, Word};
use crate::error::{Error, Result};

// If you change these you must also change `encode_instruction` and `split_word`.
pub const WORD_SIZE     : usize = 5;
pub const WORD_BITS     : u32   = (WORD_SIZE * 8) as u32;
pub const OPCODE_MASK   : Word  = 0x1F;
pub const FIELD_MASK    : Word  = 0xFFFFF;
pub const FIELD_B_SHIFT : u32   = 5;
pub const FIELD_C_SHIFT : u32   = 19;

/**
  How the leading operand of an instruction is packed.

  The source format packs `a | b << 5 | c << 19` for every instruction, so the leading operand
  lands in the opcode bits and a word only executes as the instruction it was written as when
  the author chose `a` to be that instruction's opcode. `Compat` keeps that packing bit for bit.
  `Tagged` writes the opcode in place of `a`. The two agree whenever `a` is the opcode.
*/
#[derive(StrumDisplay, EnumString, Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
#[strum(serialize_all = "lowercase")]
pub enum Encoding {
  #[default]
  Tagged,
  Compat,
}

/// The raw components of a word, whether or not the opcode is valid.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct RawFields {
  pub opcode : u8,
  pub b      : Word,
  pub c      : Word,
}

/// A word whose opcode names one of the machine's operations.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct DecodedInstruction {
  pub operation : Operation,
  pub b         : Word,
  pub c         : Word,
}

/**
  Packs the instruction into a word. The result may have bits set at or above `WORD_BITS`,
  which `word_to_bytes` discards.
*/
pub fn encode_instruction(instruction: &Instruction, encoding: Encoding) -> Word {
  let leading = match encoding {
    Encoding::Tagged => instruction.operation().code() as Word,
    Encoding::Compat => instruction.leading_operand(),
  };
  let (b, c) = instruction.fields();

  // [Opcode:5][B:19][C:16]
  leading | (b << FIELD_B_SHIFT) | (c << FIELD_C_SHIFT)
}

/// Truncates the word to its `WORD_SIZE` byte little-endian container.
pub fn word_to_bytes(word: Word) -> [u8; WORD_SIZE] {
  let mut bytes = [0u8; WORD_SIZE];
  bytes.copy_from_slice(&word.to_le_bytes()[..WORD_SIZE]);
  bytes
}

pub fn word_from_bytes(bytes: &[u8; WORD_SIZE]) -> Word {
  let mut wide = [0u8; 8];
  wide[..WORD_SIZE].copy_from_slice(bytes);
  Word::from_le_bytes(wide)
}

pub fn split_word(word: Word) -> RawFields {
  RawFields {
    opcode : (word & OPCODE_MASK) as u8,
    b      : (word >> FIELD_B_SHIFT) & FIELD_MASK,
    c      : (word >> FIELD_C_SHIFT) & FIELD_MASK,
  }
}

/// Returns `None` when the opcode bits do not name an operation.
pub fn try_decode_instruction(word: Word) -> Option<DecodedInstruction> {
  let RawFields { opcode, b, c } = split_word(word);
  let operation = Operation::try_from(opcode).ok()?;

  Some(DecodedInstruction { operation, b, c })
}

/// Whether packing discarded set bits when the word was squeezed into its container.
pub fn is_truncated(word: Word) -> bool {
  word >> WORD_BITS != 0
}


/// A binary program: a bare concatenation of words.
#[derive(Clone, Copy, Debug)]
pub struct Program<'a> {
  bytes: &'a [u8]
}

impl<'a> Program<'a> {
  pub fn new(bytes: &'a [u8]) -> Program<'a> {
    Program { bytes }
  }

  /// The number of complete words in the program.
  pub fn len(&self) -> usize {
    self.bytes.len() / WORD_SIZE
  }

  pub fn is_empty(&self) -> bool {
    self.bytes.is_empty()
  }

  pub fn words(&self) -> Words<'a> {
    Words { bytes: self.bytes, offset: 0 }
  }
}

/**
  Iterates over the words of a `Program`, yielding the byte offset of each word alongside it.
  A trailing partial word yields a single `Error::TruncatedStream`, after which the iterator
  is exhausted.
*/
pub struct Words<'a> {
  bytes  : &'a [u8],
  offset : usize,
}

impl<'a> Iterator for Words<'a> {
  type Item = Result<(usize, Word)>;

  fn next(&mut self) -> Option<Self::Item> {
    let rest = &self.bytes[self.offset..];
    if rest.is_empty() {
      return None;
    }

    let offset = self.offset;
    match <&[u8; WORD_SIZE]>::try_from(rest.get(..WORD_SIZE).unwrap_or(rest)) {

      Ok(chunk) => {
        self.offset += WORD_SIZE;
        Some(Ok((offset, word_from_bytes(chunk))))
      }

      Err(_) => {
        self.offset = self.bytes.len();
        Some(Err(Error::TruncatedStream { offset, remaining: rest.len() }))
      }

    }
  }
}

impl<'a> std::iter::FusedIterator for Words<'a> {}
