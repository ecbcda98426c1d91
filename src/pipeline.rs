/*!
  File level entry points: assemble a source file into a binary program and its instruction log,
  and interpret a binary program into a memory snapshot. Every artifact is built in memory first
  and only written once its stage has succeeded, so a failed run never leaves a partial file.
*/

use std::fs;
use std::ops::Range;
use std::path::Path;

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use tracing::info;

use crate::bytecode::{assemble, Assembly, Encoding};
use crate::error::{Error, Result};
use crate::machine::{Machine, Snapshot};

/// Settings for one interpreter run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RunConfig {
  pub memory_size : usize,
  /// The half-open range of memory to report.
  pub range       : Range<usize>,
}

impl Default for RunConfig {
  fn default() -> RunConfig {
    RunConfig {
      memory_size : crate::machine::DEFAULT_MEMORY_SIZE,
      range       : 0..10,
    }
  }
}

/// Assembles `input`, writing the binary program to `binary_output` and the log to `log_output`.
pub fn assemble_file(
  input         : &Path,
  binary_output : &Path,
  log_output    : &Path,
  encoding      : Encoding
) -> Result<Assembly>
{
  let source   = fs::read_to_string(input).map_err(|e| Error::io(input, e))?;
  let assembly = assemble(&source, encoding)?;
  let log      = to_pretty_json(&assembly.log)?;

  fs::write(binary_output, &assembly.binary).map_err(|e| Error::io(binary_output, e))?;
  fs::write(log_output, log).map_err(|e| Error::io(log_output, e))?;
  info!(
    "Wrote {} and {}.",
    binary_output.display(), log_output.display()
  );

  Ok(assembly)
}

/// Runs the binary program in `binary`, writing the configured snapshot to `result_output`.
pub fn interpret_file(binary: &Path, result_output: &Path, config: &RunConfig) -> Result<Snapshot> {
  let program  = fs::read(binary).map_err(|e| Error::io(binary, e))?;
  let memory   = Machine::with_memory_size(config.memory_size)?.execute(&program)?;
  let snapshot = memory.snapshot(config.range.clone())?;

  fs::write(result_output, to_pretty_json(&snapshot)?).map_err(|e| Error::io(result_output, e))?;
  info!(
    "Wrote memory {}..{} to {}.",
    config.range.start, config.range.end, result_output.display()
  );

  Ok(snapshot)
}

/// Serializes with four space indentation.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
  let mut buffer     = Vec::new();
  let mut serializer = Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
  value.serialize(&mut serializer)?;
  Ok(buffer)
}
