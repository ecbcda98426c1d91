/*!

  The machine uses a 5 byte little-endian word, one word per instruction, with no header,
  length prefix or terminator between words. Only the low 40 bits of a packed instruction
  survive in the container. The components of an instruction are laid out as follows:

    Opcode:   bits [0, 5)
    Field B:  bits [5, 24)
    Field C:  bits [24, 40), nominally [24, 43)

  When decoding, field B is read as the 20 bits starting at bit 5 and field C as the 20 bits
  starting at bit 19, so the two windows overlap by five bits. Execution only ever adds them
  together (`MIN`) or uses B alone (`LOAD_CONST`), so the overlap is kept as is.

  The textual form of an instruction is `NAME a b c`, where the leading operand `a` occupies
  the opcode slot of the source format. Rather than treating that packing as "the format,"
  instructions are held as a tagged `Instruction` value with named operands, and the packing
  lives in `binary`, which offers the source-compatible packing and a tagged packing that
  always writes the opcode into bits [0, 5).

*/

mod assembly;
mod binary;
mod instruction;

pub use assembly::{assemble, Assembler, Assembly, LogRecord};
pub use binary::{
  encode_instruction, split_word, try_decode_instruction, word_from_bytes, word_to_bytes,
  DecodedInstruction, Encoding, Program, RawFields, Words,
  FIELD_B_SHIFT, FIELD_C_SHIFT, FIELD_MASK, OPCODE_MASK, WORD_BITS, WORD_SIZE
};
pub use instruction::{Instruction, Operation};

/// A packed instruction before truncation to the `WORD_SIZE` byte container.
pub type Word = u64;
