/*!
  The human readable textual form of bytecode is called assembly. One instruction is written per
  line as whitespace separated tokens, `NAME operand...`, with decimal operands. Blank lines are
  skipped. This module leverages the `strum` derives of `Operation` to resolve names and `nom` to
  tokenize lines, and produces both the binary program and an audit log of what was encoded.
*/

use std::str::FromStr;

use nom::{
  IResult,
  bytes::complete::{take_till1, take_while},
  character::complete::u64 as decimal,
  combinator::{all_consuming, iterator},
  sequence::preceded,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::binary::{encode_instruction, is_truncated, split_word, word_to_bytes, Encoding, WORD_BITS};
use super::{Instruction, Operation, Word};
use crate::error::{Error, Result};

/// One entry of the instruction log, recording a source line next to the bytes it produced.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
  pub command     : String,
  /// The operand tokens exactly as written.
  pub operands    : Vec<String>,
  /// Lowercase hexadecimal of the encoded word's bytes.
  pub instruction : String,
}

/// The output of a complete assembly pass.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Assembly {
  pub binary : Vec<u8>,
  pub log    : Vec<LogRecord>,
}

/// Keeps track of all information regarding the current assembly process.
#[derive(Clone, Debug, Default)]
pub struct Assembler {
  encoding : Encoding,
  // Current line of the source, 1-based.
  line     : usize,
  assembly : Assembly,
}

impl Assembler {

  pub fn new(encoding: Encoding) -> Assembler {
    Assembler {
      encoding,
      line     : 0,
      assembly : Assembly::default(),
    }
  }

  /**
    Assembles the next line of source. Returns the encoded word, or `None` for a blank line.
    On error nothing is appended to the assembly.
  */
  pub fn assemble_line(&mut self, text: &str) -> Result<Option<Word>> {
    self.line += 1;
    let line = self.line;

    let tokens = tokenize(text);
    let (command, operand_tokens) = match tokens.split_first() {
      Some((command, operands)) => (*command, operands),
      None                      => return Ok(None),
    };

    let instruction = parse_instruction(line, command, operand_tokens)?;
    let word        = encode_instruction(&instruction, self.encoding);
    self.check_word(&instruction, word);

    let bytes = word_to_bytes(word);
    self.assembly.binary.extend_from_slice(&bytes);
    self.assembly.log.push(LogRecord {
      command     : command.to_string(),
      operands    : operand_tokens.iter().map(|token| token.to_string()).collect(),
      instruction : to_hex(&bytes),
    });

    debug!("line {}: {} -> {}", line, instruction, to_hex(&bytes));
    Ok(Some(word))
  }

  /// Consumes the assembler, returning everything assembled so far.
  pub fn finish(self) -> Assembly {
    info!(
      "Assembled {} instruction(s) into {} bytes ({} encoding).",
      self.assembly.log.len(), self.assembly.binary.len(), self.encoding
    );
    self.assembly
  }

  // Flags words that will not execute as the instruction they were written as.
  fn check_word(&self, instruction: &Instruction, word: Word) {
    let operation = instruction.operation();
    let leading   = instruction.leading_operand();

    match self.encoding {

      Encoding::Tagged if leading != operation.code() as Word => {
        warn!(
          "line {}: {} has leading operand {} but opcode {}; the opcode is encoded in its place",
          self.line, operation, leading, operation.code()
        );
      }

      Encoding::Compat if split_word(word).opcode != operation.code() => {
        warn!(
          "line {}: {} encodes opcode {} and will not execute as {}",
          self.line, instruction, split_word(word).opcode, operation
        );
      }

      _ => {}
    }

    if is_truncated(word) {
      warn!(
        "line {}: {} does not fit in {} bits and is truncated",
        self.line, instruction, WORD_BITS
      );
    }
  }
}

/// Assembles a complete source text. Fails on the first bad line.
pub fn assemble(source: &str, encoding: Encoding) -> Result<Assembly> {
  let mut assembler = Assembler::new(encoding);
  for line in source.lines() {
    assembler.assemble_line(line)?;
  }
  Ok(assembler.finish())
}

/// A run of non-whitespace characters, skipping any whitespace before it.
fn token(input: &str) -> IResult<&str, &str> {
  preceded(take_while(char::is_whitespace), take_till1(char::is_whitespace))(input)
}

/// Splits a line into its whitespace separated tokens. Any Unicode whitespace separates tokens.
fn tokenize(text: &str) -> Vec<&str> {
  let mut tokens = iterator(text, token);
  let tokens: Vec<&str> = (&mut tokens).collect();
  tokens
}

fn parse_instruction(line: usize, command: &str, tokens: &[&str]) -> Result<Instruction> {
  let operation = Operation::from_str(command)
    .map_err(|_| Error::UnknownCommand { line, name: command.to_string() })?;

  let operands = tokens.iter()
    .take(operation.arity())
    .enumerate()
    .map(|(index, token)| parse_operand(line, operation, index, token))
    .collect::<Result<Vec<Word>>>()?;

  Instruction::from_operands(operation, &operands).ok_or(Error::OperandParse {
    line,
    command : operation.name(),
    index   : operands.len(),
    token   : None,
  })
}

fn parse_operand(line: usize, operation: Operation, index: usize, token: &str) -> Result<Word> {
  match all_consuming(decimal::<&str, nom::error::Error<&str>>)(token) {
    Ok((_, value)) => Ok(value),
    Err(_)         => Err(Error::OperandParse {
      line,
      command : operation.name(),
      index,
      token   : Some(token.to_string()),
    }),
  }
}

fn to_hex(bytes: &[u8]) -> String {
  bytes.iter().map(|byte| format!("{:02x}", byte)).collect()
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tokenize_handles_surrounding_and_repeated_whitespace() {
    assert_eq!(tokenize("  LOAD_CONST \t0   42  "), vec!["LOAD_CONST", "0", "42"]);
    assert_eq!(tokenize("MIN 27 1 2\r"), vec!["MIN", "27", "1", "2"]);
    assert!(tokenize("   ").is_empty());
    assert!(tokenize("").is_empty());
  }

  #[test]
  fn tokenize_splits_on_any_unicode_whitespace() {
    assert_eq!(tokenize("LOAD_CONST\x0b0\x0c1"), vec!["LOAD_CONST", "0", "1"]);
    assert_eq!(tokenize("STORE_MEM\u{a0}19\u{2003}2"), vec!["STORE_MEM", "19", "2"]);
    assert!(tokenize("\x0c").is_empty());
    assert!(tokenize("\u{a0}\u{3000}").is_empty());
  }

  #[test]
  fn lines_of_unusual_whitespace_are_blank() {
    let assembly = assemble("LOAD_CONST 0 1\n\x0c\n\x0b \u{a0}\nLOAD_CONST\x0b3\u{a0}2\n", Encoding::Tagged).unwrap();
    assert_eq!(assembly.log.len(), 2);
    assert_eq!(assembly.log[1].operands, vec!["3", "2"]);
    assert_eq!(assembly.binary[5..], [0x43, 0x00, 0x00, 0x00, 0x00]);
  }

  #[test]
  fn assembles_and_logs_each_line() {
    let assembly = assemble("LOAD_CONST 0 42\n\n   \nSTORE_MEM 19 2\n", Encoding::Tagged).unwrap();

    assert_eq!(
      assembly.binary,
      vec![0x43, 0x05, 0x00, 0x00, 0x00, 0x53, 0x00, 0x00, 0x00, 0x00]
    );
    assert_eq!(
      assembly.log,
      vec![
        LogRecord {
          command     : "LOAD_CONST".to_string(),
          operands    : vec!["0".to_string(), "42".to_string()],
          instruction : "4305000000".to_string(),
        },
        LogRecord {
          command     : "STORE_MEM".to_string(),
          operands    : vec!["19".to_string(), "2".to_string()],
          instruction : "5300000000".to_string(),
        },
      ]
    );
  }

  #[test]
  fn compat_encoding_keeps_the_leading_operand() {
    let assembly = assemble("LOAD_CONST 0 42\nLOAD_MEM 300", Encoding::Compat).unwrap();
    assert_eq!(assembly.log[0].instruction, "4005000000");
    assert_eq!(assembly.log[1].instruction, "2c01000000");
  }

  #[test]
  fn extra_operands_are_logged_but_not_encoded() {
    let assembly = assemble("LOAD_MEM 13 7 8", Encoding::Tagged).unwrap();
    assert_eq!(assembly.binary, vec![13, 0, 0, 0, 0]);
    assert_eq!(assembly.log[0].operands, vec!["13", "7", "8"]);
  }

  #[test]
  fn unknown_command_reports_its_line() {
    match assemble("LOAD_CONST 0 1\n\nPUSH 4", Encoding::Tagged) {
      Err(Error::UnknownCommand { line, name }) => {
        assert_eq!(line, 3);
        assert_eq!(name, "PUSH");
      }
      other => panic!("expected UnknownCommand, got {:?}", other)
    }
  }

  #[test]
  fn missing_operand_is_a_parse_error() {
    match assemble("MIN 27 1", Encoding::Tagged) {
      Err(Error::OperandParse { line: 1, command: "MIN", index: 2, token: None }) => {}
      other => panic!("expected a missing operand, got {:?}", other)
    }
  }

  #[test]
  fn non_integer_operands_are_parse_errors() {
    for source in ["LOAD_CONST 0 x", "LOAD_CONST 0 -1", "LOAD_CONST 0 4.5", "LOAD_CONST 0 0x10"].iter() {
      match assemble(source, Encoding::Tagged) {
        Err(Error::OperandParse { index: 1, token: Some(_), .. }) => {}
        other => panic!("{}: expected a bad operand, got {:?}", source, other)
      }
    }
  }

  #[test]
  fn failed_line_leaves_assembly_untouched() {
    let mut assembler = Assembler::new(Encoding::Tagged);
    assert_eq!(assembler.assemble_line("LOAD_CONST 3 1").unwrap(), Some(3 | 1 << 5));
    assert!(assembler.assemble_line("STORE_MEM 19").is_err());
    assert_eq!(assembler.assemble_line("").unwrap(), None);

    let assembly = assembler.finish();
    assert_eq!(assembly.log.len(), 1);
    assert_eq!(assembly.binary.len(), 5);
  }

  #[test]
  fn log_serializes_with_the_expected_keys() {
    let assembly = assemble("LOAD_CONST 0 1", Encoding::Tagged).unwrap();
    let json = serde_json::to_value(&assembly.log).unwrap();
    assert_eq!(
      json,
      serde_json::json!([
        { "command": "LOAD_CONST", "operands": ["0", "1"], "instruction": "2300000000" }
      ])
    );
  }
}
