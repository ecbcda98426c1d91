//! Errors for every stage of the pipeline. All of them are fatal to the current run.

use std::path::PathBuf;

use thiserror::Error;

use crate::bytecode::Word;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {

  // region Assembly

  #[error("line {line}: unknown command `{name}`")]
  UnknownCommand { line: usize, name: String },

  /// A required operand is absent (`token` is `None`) or isn't a non-negative decimal integer.
  #[error("line {line}: operand {index} of {command} {}", describe_operand(.token))]
  OperandParse {
    line    : usize,
    command : &'static str,
    index   : usize,
    token   : Option<String>
  },

  // endregion

  // region Decoding/Execution

  #[error("memory of {size} cells exceeds the largest addressable size of {max}")]
  MemorySize { size: usize, max: usize },

  /// `remaining` is the length of the partial word found at `offset`.
  #[error("byte {offset}: stream ends with a partial word of {remaining} byte(s)")]
  TruncatedStream { offset: usize, remaining: usize },

  #[error("byte {offset}: unknown opcode {opcode} in word {word:#012x}")]
  UnknownOpcode { offset: usize, opcode: u8, word: Word },

  #[error("byte {offset}: pop from an empty stack")]
  StackUnderflow { offset: usize },

  #[error("byte {offset}: address {address} is outside memory of size {size}")]
  MemoryOutOfBounds { offset: usize, address: u64, size: usize },

  // endregion

  #[error("snapshot range {start}..{end} is not within memory of size {size}")]
  RangeOutOfBounds { start: usize, end: usize, size: usize },

  // region File collaborators

  #[error("{}: {source}", .path.display())]
  Io {
    path   : PathBuf,
    #[source]
    source : std::io::Error
  },

  #[error(transparent)]
  Json(#[from] serde_json::Error),

  // endregion

}

fn describe_operand(token: &Option<String>) -> String {
  match token {
    Some(token) => format!("is not an unsigned integer: `{}`", token),
    None        => "is missing".to_string()
  }
}

impl Error {
  pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Error {
    Error::Io { path: path.into(), source }
  }
}
