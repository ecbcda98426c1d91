//! Command line front end: assemble a program, run a binary program, or both in sequence.

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};
use tracing::error;
use tracing_subscriber::{fmt, EnvFilter};

use stackvm::bytecode::Encoding;
use stackvm::machine::DEFAULT_MEMORY_SIZE;
use stackvm::pipeline::{assemble_file, interpret_file, RunConfig};

#[derive(Parser, Debug)]
#[command(name = "stackvm", version, about = "Assemble and run programs for a tiny stack machine")]
struct Cli {
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Assemble a source file into a binary program and an instruction log
  Assemble {
    /// Program text, one instruction per line
    input: PathBuf,
    #[command(flatten)]
    assemble: AssembleArgs,
  },
  /// Run a binary program and write a memory snapshot
  Run {
    /// Binary program produced by `assemble`
    binary: PathBuf,
    #[command(flatten)]
    run: RunArgs,
  },
  /// Assemble a source file, then run the result
  Pipeline {
    /// Program text, one instruction per line
    #[arg(default_value = "program.txt")]
    input: PathBuf,
    #[command(flatten)]
    assemble: AssembleArgs,
    /// Where to write the memory snapshot
    #[arg(long = "result", default_value = "result.json")]
    result: PathBuf,
    #[command(flatten)]
    config: ConfigArgs,
  },
}

#[derive(Args, Debug)]
struct AssembleArgs {
  /// Where to write the binary program
  #[arg(short, long, default_value = "program.bin")]
  output: PathBuf,

  /// Where to write the instruction log
  #[arg(long, default_value = "program_log.json")]
  log: PathBuf,

  /// `tagged` always writes the opcode; `compat` keeps the leading operand in its place
  #[arg(long, default_value_t = Encoding::Tagged)]
  encoding: Encoding,
}

#[derive(Args, Debug)]
struct RunArgs {
  /// Where to write the memory snapshot
  #[arg(short, long, default_value = "result.json")]
  output: PathBuf,

  #[command(flatten)]
  config: ConfigArgs,
}

#[derive(Args, Debug)]
struct ConfigArgs {
  /// First memory address to report
  #[arg(long, default_value_t = 0)]
  start: usize,

  /// One past the last memory address to report
  #[arg(long, default_value_t = 10)]
  end: usize,

  /// Number of memory cells, at most one past the largest address an instruction can form
  #[arg(long = "memory-size", default_value_t = DEFAULT_MEMORY_SIZE)]
  memory_size: usize,
}

impl From<ConfigArgs> for RunConfig {
  fn from(args: ConfigArgs) -> RunConfig {
    RunConfig {
      memory_size : args.memory_size,
      range       : args.start..args.end,
    }
  }
}

fn init_logging() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

  fmt()
    .with_env_filter(filter)
    .with_target(false)
    .init();
}

fn run(cli: Cli) -> stackvm::Result<()> {
  match cli.command {

    Command::Assemble { input, assemble } => {
      assemble_file(&input, &assemble.output, &assemble.log, assemble.encoding)?;
    }

    Command::Run { binary, run } => {
      interpret_file(&binary, &run.output, &run.config.into())?;
    }

    Command::Pipeline { input, assemble, result, config } => {
      assemble_file(&input, &assemble.output, &assemble.log, assemble.encoding)?;
      interpret_file(&assemble.output, &result, &config.into())?;
    }

  }
  Ok(())
}

fn main() {
  init_logging();

  if let Err(e) = run(Cli::parse()) {
    error!("{}", e);
    process::exit(1);
  }
}
